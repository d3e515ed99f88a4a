//! Frame headers and the line codec.

use crate::file::cursor::ByteCursor;
use crate::file::{FileType, Result};

use super::constants::{FRAME_HEIGHT, FRAME_WIDTH, LAYER_COUNT, LINE_TABLE_SIZE, PALETTE_SLOTS};

const CHUNKS_PER_LINE: usize = FRAME_WIDTH / 8;

/// Global palette index of white paper
const PAPER_WHITE: u8 = 0;
/// Global palette index of black paper
const PAPER_BLACK: u8 = 1;

/// The first byte of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameHeader(pub u8);

impl FrameHeader {
	/// Encoded without reference to the previous frame
	pub fn is_keyframe(self) -> bool {
		self.0 & 0x80 != 0
	}

	/// A translation pair follows the header
	pub fn has_translation(self) -> bool {
		(self.0 >> 5) & 0x3 != 0
	}

	/// Global palette index of the paper
	pub fn paper(self) -> u8 {
		if self.0 & 0x1 != 0 { PAPER_WHITE } else { PAPER_BLACK }
	}

	/// Global palette index of a layer's pen
	pub fn pen(self, layer: usize) -> u8 {
		match (self.0 >> (1 + layer * 2)) & 0x3 {
			0 | 1 => self.paper() ^ 1,
			pen => pen,
		}
	}

	/// Paper, layer 1 pen, layer 2 pen
	pub fn palette_indices(self) -> [u8; PALETTE_SLOTS] {
		[self.paper(), self.pen(0), self.pen(1)]
	}
}

fn unpack_chunk(byte: u8, out: &mut [u8]) {
	for (bit, pixel) in out.iter_mut().enumerate() {
		*pixel = (byte >> bit) & 1;
	}
}

fn decode_line<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>, kind: u8, line: &mut [u8]) -> Result<()> {
	match kind {
		1 | 2 => {
			if kind == 2 {
				line.fill(1);
			}
			let mask = cursor.read_u32_be()?;
			for (chunk, out) in line.chunks_exact_mut(8).enumerate() {
				if mask & (0x8000_0000 >> chunk) != 0 {
					unpack_chunk(cursor.read_u8()?, out);
				}
			}
		}
		3 => {
			let raw = cursor.read_bytes(CHUNKS_PER_LINE)?;
			for (&byte, out) in raw.iter().zip(line.chunks_exact_mut(8)) {
				unpack_chunk(byte, out);
			}
		}
		_ => {}
	}
	Ok(())
}

/// Decodes the frame at `offset` into `layers`, which must be zeroed.
///
/// Returns the header and the translation of the previous frame, which is
/// needed to undo the diff of a frame that is not a keyframe.
pub(crate) fn decode_into(
	data: &[u8],
	offset: usize,
	layers: &mut [Vec<u8>; LAYER_COUNT],
) -> Result<(FrameHeader, (i32, i32))> {
	let mut cursor = ByteCursor::new(data, FileType::Ppm);
	cursor.seek(offset)?;
	let header = FrameHeader(cursor.read_u8()?);
	let translation = if header.has_translation() {
		(i32::from(cursor.read_i8()?), i32::from(cursor.read_i8()?))
	} else {
		(0, 0)
	};

	let mut tables = [[0u8; LINE_TABLE_SIZE]; LAYER_COUNT];
	for table in &mut tables {
		table.copy_from_slice(cursor.read_bytes(LINE_TABLE_SIZE)?);
	}

	for (table, plane) in tables.iter().zip(layers.iter_mut()) {
		for (index, &packed) in table.iter().enumerate() {
			// four blank lines
			if packed == 0 {
				continue;
			}
			for sub in 0..4 {
				let y = index * 4 + sub;
				let kind = (packed >> (sub * 2)) & 0x3;
				let line = &mut plane[y * FRAME_WIDTH..(y + 1) * FRAME_WIDTH];
				decode_line(&mut cursor, kind, line)?;
			}
		}
	}

	Ok((header, translation))
}

/// XORs `layers` with `previous`, reading the previous frame shifted by
/// `(tx, ty)`. Pixels whose source falls outside the frame are left as is.
pub(crate) fn apply_diff(
	layers: &mut [Vec<u8>; LAYER_COUNT],
	previous: &[Vec<u8>; LAYER_COUNT],
	(tx, ty): (i32, i32),
) {
	let (width, height) = (FRAME_WIDTH as i32, FRAME_HEIGHT as i32);
	let x_start = tx.clamp(0, width);
	let x_end = (width + tx).clamp(0, width);
	for (plane, prev) in layers.iter_mut().zip(previous) {
		for y in 0..height {
			let src_y = y - ty;
			if !(0..height).contains(&src_y) {
				continue;
			}
			let dst_row = (y * width) as usize;
			let src_row = (src_y * width) as usize;
			for x in x_start..x_end {
				plane[dst_row + x as usize] ^= prev[src_row + (x - tx) as usize];
			}
		}
	}
}
