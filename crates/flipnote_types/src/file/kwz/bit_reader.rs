//! LSB-first bit reader over little-endian 16-bit words.

use crate::file::{FileType, FlipnoteError, Result};

/// Masks for reads of 0 to 16 bits
const BIT_MASKS: [u32; 17] = {
	let mut masks = [0u32; 17];
	let mut i = 0;
	while i < 17 {
		masks[i] = (1 << i) - 1;
		i += 1;
	}
	masks
};

/// Sliding 16-bit accumulator used by the KWZ tile decoder.
///
/// A new little-endian word is shifted in above the remaining bits whenever a
/// read would run past the current word, so reads of up to 16 bits may
/// straddle a word boundary.
#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
	data: &'a [u8],
	offset: usize,
	/// Bits consumed from the current word; 16 means "empty"
	bit_index: u32,
	bit_value: u32,
}

impl<'a> BitReader<'a> {
	/// Starts reading `data` at `offset`
	pub(crate) fn new(data: &'a [u8], offset: usize) -> Self {
		Self {
			data,
			offset,
			bit_index: 16,
			bit_value: 0,
		}
	}

	fn next_word(&mut self) -> Result<u32> {
		let end = self.offset + 2;
		let Some(word) = self.data.get(self.offset..end) else {
			return Err(FlipnoteError::insufficient_data(FileType::Kwz, end, self.data.len()));
		};
		self.offset = end;
		Ok(u32::from(u16::from_le_bytes([word[0], word[1]])))
	}

	/// Reads `count` bits (at most 16)
	#[inline]
	pub(crate) fn read_bits(&mut self, count: u32) -> Result<u32> {
		debug_assert!(count <= 16);
		if self.bit_index + count > 16 {
			let next = self.next_word()?;
			self.bit_value |= next << (16 - self.bit_index);
			self.bit_index = self.bit_index + count - 16;
		} else {
			self.bit_index += count;
		}
		let result = self.bit_value & BIT_MASKS[count as usize];
		self.bit_value >>= count;
		Ok(result)
	}

	/// Byte offset of the next unread word
	#[cfg(test)]
	pub(crate) fn offset(&self) -> usize {
		self.offset
	}
}
