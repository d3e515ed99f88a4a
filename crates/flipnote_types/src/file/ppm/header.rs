//! Fixed-offset PPM header.

use log::{debug, warn};

use crate::file::cursor::ByteCursor;
use crate::file::fsid::ppm_fsid_region;
use crate::file::meta::Author;
use crate::file::{FileType, FlipnoteError, Result};

use super::constants::{FRAME_TABLE_OFFSET, FRAMERATES, MAGIC};

/// Everything read from the first 0x6A8 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
	pub frame_data_len: usize,
	pub sound_data_len: usize,
	pub frame_count: usize,
	pub lock: bool,
	pub thumb_index: usize,
	pub modified: u32,
	pub animation_flags: u16,
	pub root: Author,
	pub parent: Author,
	pub current: Author,
}

/// Reads an 18-byte filename as `MMMMMM_RRRRRRRRRRRRR_EEE`
pub(crate) fn read_filename<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> Result<String> {
	let mac = cursor.read_hex(3, false)?;
	let random = cursor.read_ascii(13)?;
	let edits = cursor.read_u16()?;
	Ok(format!("{mac}_{random}_{edits:03}"))
}

fn read_author<B: AsRef<[u8]>>(
	cursor: &mut ByteCursor<B>,
	name_offset: usize,
	fsid_offset: usize,
) -> Result<Author> {
	cursor.seek(name_offset)?;
	let name = cursor.read_utf16(11)?;
	cursor.seek(fsid_offset)?;
	let fsid = cursor.read_hex(8, true)?;
	Ok(Author {
		name,
		region: ppm_fsid_region(&fsid),
		fsid,
		filename: String::new(),
	})
}

/// Maps a frame speed to frames per second, clamping unknown speeds
pub(crate) fn framerate(speed: u8) -> f64 {
	match FRAMERATES.get(speed as usize) {
		Some(&rate) => rate,
		None => {
			warn!("PPM frame speed {speed} out of range, using {}", FRAMERATES.len() - 1);
			FRAMERATES[FRAMERATES.len() - 1]
		}
	}
}

pub(crate) fn parse(data: &[u8]) -> Result<Header> {
	let mut cursor = ByteCursor::new(data, FileType::Ppm);
	let magic = cursor.read_bytes(4)?;
	if magic != MAGIC {
		return Err(FlipnoteError::BadMagic {
			actual: [magic[0], magic[1], magic[2], magic[3]],
		});
	}
	if data.len() < FRAME_TABLE_OFFSET {
		return Err(FlipnoteError::insufficient_data(FileType::Ppm, FRAME_TABLE_OFFSET, data.len()));
	}

	let frame_data_len = cursor.read_u32()? as usize;
	let sound_data_len = cursor.read_u32()? as usize;
	let frame_count = cursor.read_u16()? as usize + 1;
	let version = cursor.read_u16()?;
	let lock = cursor.read_u16()? != 0;
	let thumb_index = cursor.read_u16()? as usize;

	let mut root = read_author(&mut cursor, 0x14, 0x8A)?;
	let mut parent = read_author(&mut cursor, 0x2A, 0x56)?;
	let mut current = read_author(&mut cursor, 0x40, 0x5E)?;

	cursor.seek(0x66)?;
	parent.filename = read_filename(&mut cursor)?;
	current.filename = read_filename(&mut cursor)?;
	cursor.seek(0x92)?;
	root.filename = cursor.read_hex(8, false)?;
	let modified = cursor.read_u32()?;

	cursor.seek(super::constants::ANIMATION_FLAGS_OFFSET)?;
	let animation_flags = cursor.read_u16()?;

	debug!("PPM header: version 0x{version:X}, {frame_count} frames, flags 0x{animation_flags:04X}");
	Ok(Header {
		frame_data_len,
		sound_data_len,
		frame_count,
		lock,
		thumb_index,
		modified,
		animation_flags,
		root,
		parent,
		current,
	})
}
