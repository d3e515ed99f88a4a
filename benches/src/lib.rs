//! Benchmark helper utilities for flipnote-rs
//!
//! This crate generates synthetic PPM and KWZ notes for the benchmark suite
//! and the integration tests. The generators encode caller-supplied layer
//! images with the same codecs the decoder reads, so a decoded frame can be
//! compared against the image it was built from.
//!
//! Only the structures the decoder looks at are filled in; CRCs are zero
//! and signatures are either zeroed or produced by a caller-supplied signer.

pub mod ppm;

/// Writes a bitstream least significant bit first
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
	bytes: Vec<u8>,
	bits: usize,
}

impl BitWriter {
	/// Creates an empty writer
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends the low `count` bits of `value`
	pub fn write(&mut self, value: u32, count: u32) {
		for i in 0..count {
			if self.bits % 8 == 0 {
				self.bytes.push(0);
			}
			if (value >> i) & 1 != 0 {
				let last = self.bytes.len() - 1;
				self.bytes[last] |= 1 << (self.bits % 8);
			}
			self.bits += 1;
		}
	}

	/// Number of bits written so far
	pub fn len(&self) -> usize {
		self.bits
	}

	/// Returns true if nothing was written
	pub fn is_empty(&self) -> bool {
		self.bits == 0
	}

	/// Returns the bytes, padded to a whole number of 16-bit words
	pub fn finish(mut self) -> Vec<u8> {
		if self.bytes.len() % 2 != 0 {
			self.bytes.push(0);
		}
		self.bytes
	}
}

/// Tiny deterministic PRNG for repeatable synthetic images
#[derive(Debug, Clone)]
pub struct XorShift(u32);

impl XorShift {
	/// Creates a generator; a zero seed is replaced with a fixed constant
	pub fn new(seed: u32) -> Self {
		Self(if seed == 0 { 0x9E37_79B9 } else { seed })
	}

	/// Next 32 random bits
	pub fn next_u32(&mut self) -> u32 {
		let mut x = self.0;
		x ^= x << 13;
		x ^= x >> 17;
		x ^= x << 5;
		self.0 = x;
		x
	}

	/// Random value in `0..bound`
	pub fn below(&mut self, bound: u32) -> u32 {
		self.next_u32() % bound.max(1)
	}
}

/// Common benchmark workloads
pub mod sizes {
	/// A short note
	pub const SHORT: usize = 8;
	/// A typical note length
	pub const TYPICAL: usize = 60;
	/// A long note, close to the frame limit of Flipnote Studio
	pub const LONG: usize = 400;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_bit_writer_lsb_first() {
		let mut writer = BitWriter::new();
		writer.write(0b011, 3);
		writer.write(0b11000, 5);
		writer.write(0xA6, 8);
		assert_eq!(writer.len(), 16);
		assert_eq!(writer.finish(), vec![0xC3, 0xA6]);
	}

	#[test]
	fn test_bit_writer_pads_to_words() {
		let mut writer = BitWriter::new();
		writer.write(1, 1);
		assert_eq!(writer.finish(), vec![1, 0]);
	}

	#[test]
	fn test_xorshift_repeatable() {
		let mut a = XorShift::new(7);
		let mut b = XorShift::new(7);
		assert_eq!(a.next_u32(), b.next_u32());
		assert!(a.below(10) < 10);
	}
}
