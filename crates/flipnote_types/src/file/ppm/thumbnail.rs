//! The 64x48 thumbnail bitmap.
//!
//! The bitmap is stored as 8x8 tiles in row-major order, each tile holding
//! 4-bit palette indices with the left pixel of a pair in the low nibble.

use crate::file::cursor::ByteCursor;
use crate::file::palette;
use crate::file::{FileType, Result};

use super::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_OFFSET, THUMBNAIL_WIDTH};

/// Decodes the thumbnail into palette indices, one byte per pixel
pub(crate) fn decode_indices(data: &[u8]) -> Result<Vec<u8>> {
	let mut cursor = ByteCursor::new(data, FileType::Ppm);
	cursor.seek(THUMBNAIL_OFFSET)?;
	let raw = cursor.read_bytes(THUMBNAIL_WIDTH * THUMBNAIL_HEIGHT / 2)?;

	let mut out = vec![0u8; THUMBNAIL_WIDTH * THUMBNAIL_HEIGHT];
	let mut bytes = raw.iter();
	for tile_y in (0..THUMBNAIL_HEIGHT).step_by(8) {
		for tile_x in (0..THUMBNAIL_WIDTH).step_by(8) {
			for y in tile_y..tile_y + 8 {
				for x in (tile_x..tile_x + 8).step_by(2) {
					let byte = bytes.next().copied().unwrap_or(0);
					out[y * THUMBNAIL_WIDTH + x] = byte & 0xF;
					out[y * THUMBNAIL_WIDTH + x + 1] = byte >> 4;
				}
			}
		}
	}
	Ok(out)
}

/// Decodes the thumbnail into RGBA bytes
pub(crate) fn decode_rgba(data: &[u8]) -> Result<Vec<u8>> {
	let indices = decode_indices(data)?;
	Ok(indices.iter().flat_map(|&i| palette::ppm::THUMBNAIL[i as usize].to_array()).collect())
}
