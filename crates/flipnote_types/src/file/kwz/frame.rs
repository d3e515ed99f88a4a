//! Frame records and the tile codec.

use log::trace;

use crate::file::cursor::ByteCursor;
use crate::file::{FileType, FlipnoteError, Result};

use super::bit_reader::BitReader;
use super::constants::{
	FRAME_HEIGHT, FRAME_RECORD_SIZE, FRAME_WIDTH, LAYER_COUNT, UNCHANGED_LAYER_SIZE,
};
use super::sections::Section;
use super::tables::{self, Line, TYPE7_PATTERNS};

/// Mask with a bit set for every layer
pub(crate) const ALL_LAYERS: u8 = 0b111;

const TILE_SIZE: usize = 8;
const SUPER_TILE_SIZE: usize = 128;

/// One `KMI` record, plus where the frame's layer data starts in `KMC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameRecord {
	/// Packed palette and layer flags
	pub flags: u32,
	/// Encoded size of each layer
	pub layer_sizes: [u16; LAYER_COUNT],
	/// Stacking depth of each layer
	pub layer_depths: [u8; LAYER_COUNT],
	/// Sound effects triggered on this frame (bits 0..3)
	pub sound_flags: u8,
	/// Layers that contain camera photos (bits 0..2)
	pub camera_flags: u8,
	/// Absolute offset of this record
	pub record_offset: usize,
	/// Absolute offset of the first layer's encoded data
	pub data_offset: usize,
}

impl FrameRecord {
	/// Layers that carry over tiles from the previous frame.
	///
	/// Bits 4..6 of the flags are set for layers stored in full.
	pub fn diffing_layers(&self) -> u8 {
		!((self.flags >> 4) as u8) & ALL_LAYERS
	}

	/// Layers encoded as the 38-byte "unchanged" placeholder
	pub fn unchanged_layers(&self) -> u8 {
		self.layer_sizes
			.iter()
			.enumerate()
			.filter(|&(_, &size)| size as usize == UNCHANGED_LAYER_SIZE)
			.fold(0, |mask, (layer, _)| mask | 1 << layer)
	}

	/// Layers whose contents depend on the previous frame
	pub fn dependent_layers(&self) -> u8 {
		self.diffing_layers() | self.unchanged_layers()
	}

	/// Absolute offset and size of a layer's encoded data
	pub fn layer_span(&self, layer: usize) -> (usize, usize) {
		let before: usize = self.layer_sizes[..layer].iter().map(|&s| s as usize).sum();
		(self.data_offset + before, self.layer_sizes[layer] as usize)
	}

	fn total_size(&self) -> usize {
		self.layer_sizes.iter().map(|&s| s as usize).sum()
	}

	/// Palette nibbles: paper, then two pens for each layer
	pub fn palette_nibbles(&self) -> [u8; 7] {
		let flags = self.flags;
		[0, 8, 12, 16, 20, 24, 28].map(|shift| ((flags >> shift) & 0xF) as u8)
	}

	/// Layer indices from bottom to top.
	///
	/// Starting from `[2, 1, 0]`, layers are stable-sorted by descending depth
	/// so deeper layers are drawn first.
	pub fn layer_order(&self) -> [usize; LAYER_COUNT] {
		let mut order = [2, 1, 0];
		order.sort_by(|&a, &b| self.layer_depths[b].cmp(&self.layer_depths[a]));
		order
	}
}

/// Reads `frame_count` records from `KMI` and pairs each with its data in `KMC`.
///
/// Every pointer is checked here so that decoding never reads outside the
/// frame data section.
pub(crate) fn build_frame_table(
	data: &[u8],
	kmi: &Section,
	kmc: &Section,
	frame_count: usize,
) -> Result<Vec<FrameRecord>> {
	let available = kmi.length / FRAME_RECORD_SIZE;
	if frame_count > available {
		return Err(FlipnoteError::malformed(
			FileType::Kwz,
			format!("{frame_count} frames declared but KMI holds {available} records"),
		));
	}

	let mut cursor = ByteCursor::new(data, FileType::Kwz);
	let mut records = Vec::with_capacity(frame_count);
	let mut data_offset = kmc.offset + 12;
	for frame in 0..frame_count {
		let record_offset = kmi.offset + 8 + frame * FRAME_RECORD_SIZE;
		cursor.seek(record_offset)?;
		let flags = cursor.read_u32()?;
		let layer_sizes = [cursor.read_u16()?, cursor.read_u16()?, cursor.read_u16()?];
		cursor.seek(record_offset + 0x14)?;
		let layer_depths = [cursor.read_u8()?, cursor.read_u8()?, cursor.read_u8()?];
		let sound_flags = cursor.read_u8()?;
		cursor.seek(record_offset + 0x1A)?;
		let camera_flags = cursor.read_u8()?;

		let record = FrameRecord {
			flags,
			layer_sizes,
			layer_depths,
			sound_flags,
			camera_flags,
			record_offset,
			data_offset,
		};
		data_offset += record.total_size();
		let end = kmc.end();
		if data_offset > end {
			return Err(FlipnoteError::malformed(
				FileType::Kwz,
				format!("frame {frame} data ends at 0x{data_offset:X}, past KMC end 0x{end:X}"),
			));
		}
		records.push(record);
	}
	Ok(records)
}

#[inline]
fn fill_rows(buffer: &mut [u8], origin: usize, row: impl Fn(usize) -> &'static Line) {
	for r in 0..TILE_SIZE {
		let start = origin + r * FRAME_WIDTH;
		buffer[start..start + TILE_SIZE].copy_from_slice(row(r));
	}
}

/// Decodes one layer's bitstream into a 320x240 plane.
///
/// Tiles are visited in 128x128 super-tiles, each scanned as 8x8 tiles.
/// Skipped tiles keep whatever the plane already holds.
pub(crate) fn decode_layer(encoded: &[u8], buffer: &mut [u8]) -> Result<()> {
	let mut reader = BitReader::new(encoded, 0);
	let mut skip = 0u32;

	for super_y in (0..FRAME_HEIGHT).step_by(SUPER_TILE_SIZE) {
		for super_x in (0..FRAME_WIDTH).step_by(SUPER_TILE_SIZE) {
			for tile_y in (super_y..super_y + SUPER_TILE_SIZE).step_by(TILE_SIZE) {
				if tile_y >= FRAME_HEIGHT {
					break;
				}
				for tile_x in (super_x..super_x + SUPER_TILE_SIZE).step_by(TILE_SIZE) {
					if tile_x >= FRAME_WIDTH {
						break;
					}
					if skip > 0 {
						skip -= 1;
						continue;
					}

					let origin = tile_y * FRAME_WIDTH + tile_x;
					match reader.read_bits(3)? {
						0 => {
							let line = tables::common_line(reader.read_bits(5)?, false);
							fill_rows(buffer, origin, |_| line);
						}
						1 => {
							let line = tables::line(reader.read_bits(13)?, false);
							fill_rows(buffer, origin, |_| line);
						}
						2 => {
							let index = reader.read_bits(5)?;
							let a = tables::common_line(index, false);
							let b = tables::common_line(index, true);
							fill_rows(buffer, origin, |r| if r % 2 == 0 { a } else { b });
						}
						3 => {
							let index = reader.read_bits(13)?;
							let a = tables::line(index, false);
							let b = tables::line(index, true);
							fill_rows(buffer, origin, |r| if r % 2 == 0 { a } else { b });
						}
						4 => {
							let mask = reader.read_bits(8)?;
							let mut rows = [tables::line(0, false); TILE_SIZE];
							for (r, row) in rows.iter_mut().enumerate() {
								*row = if mask & (1 << r) != 0 {
									tables::common_line(reader.read_bits(5)?, false)
								} else {
									tables::line(reader.read_bits(13)?, false)
								};
							}
							fill_rows(buffer, origin, |r| rows[r]);
						}
						5 => {
							skip = reader.read_bits(5)?;
						}
						7 => {
							let mut pattern = reader.read_bits(2)? as usize;
							let use_common = reader.read_bits(1)? != 0;
							let (a, b) = if use_common {
								pattern = (pattern + 1) % 4;
								let a = tables::common_line(reader.read_bits(5)?, false);
								(a, tables::common_line(reader.read_bits(5)?, false))
							} else {
								let a = tables::line(reader.read_bits(13)?, false);
								(a, tables::line(reader.read_bits(13)?, false))
							};
							let rows = TYPE7_PATTERNS[pattern];
							fill_rows(buffer, origin, |r| if rows[r] { b } else { a });
						}
						other => {
							return Err(FlipnoteError::unsupported(
								FileType::Kwz,
								format!("tile type {other} at ({tile_x}, {tile_y})"),
							));
						}
					}
				}
			}
		}
	}

	trace!("KWZ layer decoded from {} bytes", encoded.len());
	Ok(())
}
