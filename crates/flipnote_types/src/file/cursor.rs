//! Seekable cursor over an in-memory byte buffer.
//!
//! Both containers are parsed through [`ByteCursor`]: fixed-width integers in
//! a selectable byte order, fixed-length ASCII and UTF-16 strings, hex dumps
//! and raw slices. Every read is bounds-checked and reports
//! [`FlipnoteError::TruncatedMeta`] instead of panicking.

use super::{FileType, FlipnoteError, Result};

/// Byte order used by the integer accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
	/// Least significant byte first (both Flipnote formats)
	#[default]
	Little,
	/// Most significant byte first
	Big,
}

/// Cursor over a byte buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<B> {
	data: B,
	pos: usize,
	endian: Endian,
	file_type: FileType,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
	/// Creates a little-endian cursor at offset 0
	pub fn new(data: B, file_type: FileType) -> Self {
		Self {
			data,
			pos: 0,
			endian: Endian::Little,
			file_type,
		}
	}

	/// Returns the whole underlying buffer
	#[inline]
	pub fn bytes(&self) -> &[u8] {
		self.data.as_ref()
	}

	/// Returns the underlying buffer
	pub fn get_ref(&self) -> &B {
		&self.data
	}

	/// Consumes the cursor and returns the buffer
	pub fn into_inner(self) -> B {
		self.data
	}

	/// Buffer length in bytes
	#[inline]
	pub fn len(&self) -> usize {
		self.bytes().len()
	}

	/// Returns true if the buffer is empty
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Current offset
	#[inline]
	pub fn position(&self) -> usize {
		self.pos
	}

	/// Moves to an absolute offset. Seeking to the end is allowed.
	pub fn seek(&mut self, offset: usize) -> Result<()> {
		if offset > self.len() {
			return Err(FlipnoteError::insufficient_data(self.file_type, offset, self.len()));
		}
		self.pos = offset;
		Ok(())
	}

	/// Advances by `count` bytes
	pub fn skip(&mut self, count: usize) -> Result<()> {
		self.seek(self.pos + count)
	}

	/// Current byte order
	pub fn endian(&self) -> Endian {
		self.endian
	}

	/// Changes the byte order used by subsequent integer reads and writes
	pub fn set_endian(&mut self, endian: Endian) {
		self.endian = endian;
	}

	fn take(&mut self, count: usize) -> Result<&[u8]> {
		let end = self.pos + count;
		if end > self.len() {
			return Err(FlipnoteError::insufficient_data(self.file_type, end, self.len()));
		}
		let start = self.pos;
		self.pos = end;
		Ok(&self.data.as_ref()[start..end])
	}

	fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut out = [0u8; N];
		out.copy_from_slice(self.take(N)?);
		Ok(out)
	}

	/// Reads a `u8`
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	/// Reads an `i8`
	pub fn read_i8(&mut self) -> Result<i8> {
		Ok(self.read_u8()? as i8)
	}

	/// Reads a `u16` in the current byte order
	pub fn read_u16(&mut self) -> Result<u16> {
		let raw = self.take_array::<2>()?;
		Ok(match self.endian {
			Endian::Little => u16::from_le_bytes(raw),
			Endian::Big => u16::from_be_bytes(raw),
		})
	}

	/// Reads a `u32` in the current byte order
	pub fn read_u32(&mut self) -> Result<u32> {
		let raw = self.take_array::<4>()?;
		Ok(match self.endian {
			Endian::Little => u32::from_le_bytes(raw),
			Endian::Big => u32::from_be_bytes(raw),
		})
	}

	/// Reads a big-endian `u32` regardless of the current byte order
	pub fn read_u32_be(&mut self) -> Result<u32> {
		Ok(u32::from_be_bytes(self.take_array::<4>()?))
	}

	/// Reads `count` raw bytes
	pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
		self.take(count)
	}

	/// Reads a fixed-length ASCII field, stopping at the first NUL
	pub fn read_ascii(&mut self, count: usize) -> Result<String> {
		let raw = self.take(count)?;
		let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
		Ok(raw[..end].iter().map(|&b| b as char).collect())
	}

	/// Reads `chars` UTF-16LE code units, dropping padding NULs
	pub fn read_utf16(&mut self, chars: usize) -> Result<String> {
		let raw = self.take(chars * 2)?;
		let units = raw.chunks_exact(2).position(|c| c == [0, 0]).unwrap_or(chars);
		let (text, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&raw[..units * 2]);
		Ok(text.into_owned())
	}

	/// Reads `count` bytes as uppercase hex, optionally in reverse byte order
	pub fn read_hex(&mut self, count: usize, reverse: bool) -> Result<String> {
		let raw = self.take(count)?;
		if reverse {
			let reversed: Vec<u8> = raw.iter().rev().copied().collect();
			Ok(hex::encode_upper(reversed))
		} else {
			Ok(hex::encode_upper(raw))
		}
	}
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
	fn put(&mut self, bytes: &[u8]) -> Result<()> {
		let end = self.pos + bytes.len();
		if end > self.len() {
			return Err(FlipnoteError::insufficient_data(self.file_type, end, self.len()));
		}
		self.data.as_mut()[self.pos..end].copy_from_slice(bytes);
		self.pos = end;
		Ok(())
	}

	/// Writes a `u8`
	pub fn write_u8(&mut self, value: u8) -> Result<()> {
		self.put(&[value])
	}

	/// Writes a `u16` in the current byte order
	pub fn write_u16(&mut self, value: u16) -> Result<()> {
		match self.endian {
			Endian::Little => self.put(&value.to_le_bytes()),
			Endian::Big => self.put(&value.to_be_bytes()),
		}
	}

	/// Writes a `u32` in the current byte order
	pub fn write_u32(&mut self, value: u32) -> Result<()> {
		match self.endian {
			Endian::Little => self.put(&value.to_le_bytes()),
			Endian::Big => self.put(&value.to_be_bytes()),
		}
	}

	/// Writes raw bytes
	pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
		self.put(bytes)
	}
}
