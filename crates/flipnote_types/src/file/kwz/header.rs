//! `KFH` file header decoding.

use log::warn;

use crate::file::cursor::ByteCursor;
use crate::file::fsid::{format_kwz_fsid, is_kwz_dsi_library_fsid, kwz_fsid_region};
use crate::file::meta::{self, Author, Meta, date_from_nintendo_timestamp};
use crate::file::{FileType, FlipnoteError, Result};

use super::constants::{FRAMERATES, LAYER_COUNT};
use super::sections::Section;

/// Bytes of header data following the section header and CRC
const HEADER_DATA_SIZE: usize = 200;

/// Reads a 10-byte FSID, keeping the raw hex for DSi Library conversions
pub(crate) fn read_fsid<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> Result<String> {
	let raw = cursor.read_hex(10, false)?;
	if is_kwz_dsi_library_fsid(&raw) {
		Ok(raw)
	} else {
		Ok(format_kwz_fsid(&raw))
	}
}

/// Reads a 28-byte filename.
///
/// Notes converted from PPM may carry the 18-byte PPM filename structure in
/// this field instead, which is decoded as `MMMMMM_RRRRRRRRRRRRR_EEE`.
pub(crate) fn read_filename<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> Result<String> {
	let raw = cursor.read_bytes(28)?;
	if raw.iter().all(u8::is_ascii_graphic) {
		return Ok(raw.iter().map(|&b| b as char).collect());
	}

	let mac = hex::encode_upper(&raw[0..3]);
	let random: String = raw[3..16].iter().map(|&b| b as char).collect();
	let edits = u16::from_le_bytes([raw[16], raw[17]]);
	let filename = format!("{mac}_{random}_{edits:03}");
	warn!("KWZ filename is not plain ASCII, decoded as {filename}");
	Ok(filename)
}

/// Maps a frame speed index to frames per second, clamping unknown indices
pub(crate) fn framerate(speed: u8) -> f64 {
	match FRAMERATES.get(speed as usize) {
		Some(&rate) => rate,
		None => {
			warn!("KWZ frame speed {speed} out of range, using {}", FRAMERATES.len() - 1);
			FRAMERATES[FRAMERATES.len() - 1]
		}
	}
}

/// Decodes the `KFH` section into note metadata.
///
/// Background music fields are left at their defaults; they come from `KSN`.
pub(crate) fn parse(data: &[u8], section: &Section) -> Result<Meta> {
	let start = section.offset + 12;
	if start + HEADER_DATA_SIZE > section.end() {
		return Err(FlipnoteError::insufficient_data(
			FileType::Kwz,
			start + HEADER_DATA_SIZE,
			section.end(),
		));
	}

	let mut cursor = ByteCursor::new(data, FileType::Kwz);
	cursor.seek(start)?;
	let created = cursor.read_u32()?;
	let modified = cursor.read_u32()?;
	let _app_version = cursor.read_u32()?;

	let mut fsids = [String::new(), String::new(), String::new()];
	for fsid in &mut fsids {
		*fsid = read_fsid(&mut cursor)?;
	}
	let mut names = [String::new(), String::new(), String::new()];
	for name in &mut names {
		*name = cursor.read_utf16(11)?;
	}
	let mut filenames = [String::new(), String::new(), String::new()];
	for filename in &mut filenames {
		*filename = read_filename(&mut cursor)?;
	}

	let frame_count = cursor.read_u16()? as usize;
	let thumb_index = cursor.read_u16()? as usize;
	let flags = cursor.read_u16()?;
	let frame_speed = cursor.read_u8()?;
	let layer_flags = cursor.read_u8()?;

	let lock = flags & 0x1 != 0;
	let loop_playback = flags & 0x2 != 0;
	let layer_visibility = (0..LAYER_COUNT).map(|layer| layer_flags & (1 << layer) == 0).collect();

	let [root, parent, current] = [0, 1, 2].map(|i| Author {
		name: std::mem::take(&mut names[i]),
		region: kwz_fsid_region(&fsids[i]),
		fsid: std::mem::take(&mut fsids[i]),
		filename: std::mem::take(&mut filenames[i]),
	});

	let rate = framerate(frame_speed);
	let meta = Meta {
		lock,
		loop_playback,
		is_spinoff: meta::is_spinoff(&root, &parent, &current),
		is_dsi_library: is_kwz_dsi_library_fsid(&current.fsid),
		frame_count,
		frame_speed,
		bgm_speed: frame_speed,
		framerate: rate,
		bgm_framerate: rate,
		duration: meta::note_duration(frame_count, rate),
		thumb_index,
		created: Some(date_from_nintendo_timestamp(created)),
		modified: date_from_nintendo_timestamp(modified),
		root,
		parent,
		current,
		layer_visibility,
	};
	Ok(meta)
}

/// Metadata for notes without a `KFH` section (folder icons)
pub(crate) fn headerless(frame_count: usize) -> Meta {
	let rate = framerate(0);
	Meta {
		frame_count,
		framerate: rate,
		bgm_framerate: rate,
		duration: meta::note_duration(frame_count, rate),
		layer_visibility: vec![true; LAYER_COUNT],
		..Default::default()
	}
}
