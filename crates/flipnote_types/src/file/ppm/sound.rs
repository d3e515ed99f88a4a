//! PPM sound header and IMA ADPCM decoding.

use log::debug;

use crate::file::audio::{ADPCM_INDEX_TABLE_4BIT, ADPCM_STEP_TABLE, AudioTrack, TrackSpan};
use crate::file::cursor::ByteCursor;
use crate::file::{FileType, FlipnoteError, Result};

use super::constants::{FRAME_DATA_OFFSET, SOUND_EFFECT_COUNT, SOUND_HEADER_SIZE};

const MAX_STEP_INDEX: i32 = 88;

/// Parsed sound block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SoundHeader {
	/// Offset of the sound header
	pub offset: usize,
	/// Sound effect flags for each frame (bits 0..2)
	pub effect_flags: Vec<u8>,
	/// Animation frame speed (1 to 8)
	pub frame_speed: u8,
	/// Frame speed during background music recording
	pub bgm_speed: u8,
	/// BGM, SE1, SE2, SE3
	pub spans: [TrackSpan; 4],
}

impl SoundHeader {
	/// Location of a track; PPM has no fourth sound effect
	pub fn span(&self, track: AudioTrack) -> Option<TrackSpan> {
		self.spans.get(track.index()).copied()
	}

	/// Offset one past the last track byte
	pub fn end(&self) -> usize {
		self.spans[3].offset + self.spans[3].length
	}
}

/// Reads the sound effect flags and the sound header that follow the frame
/// data block
pub(crate) fn parse(data: &[u8], frame_data_len: usize, frame_count: usize) -> Result<SoundHeader> {
	let mut cursor = ByteCursor::new(data, FileType::Ppm);
	let flags_offset = FRAME_DATA_OFFSET + frame_data_len;
	cursor.seek(flags_offset)?;
	let effect_flags = cursor.read_bytes(frame_count)?.iter().map(|&f| f & 0x7).collect();

	let offset = (flags_offset + frame_count).next_multiple_of(4);
	cursor.seek(offset)?;
	let mut lengths = [0usize; 4];
	for length in &mut lengths {
		*length = cursor.read_u32()? as usize;
	}
	let frame_speed = 8u8.saturating_sub(cursor.read_u8()?);
	let bgm_speed = 8u8.saturating_sub(cursor.read_u8()?);

	let mut spans = [TrackSpan::default(); 4];
	let mut track_offset = offset + SOUND_HEADER_SIZE;
	for (span, length) in spans.iter_mut().zip(lengths) {
		*span = TrackSpan {
			offset: track_offset,
			length,
		};
		track_offset += length;
	}
	if track_offset > data.len() {
		return Err(FlipnoteError::malformed(
			FileType::Ppm,
			format!("sound tracks end at 0x{track_offset:X}, past file end 0x{:X}", data.len()),
		));
	}

	debug!(
		"PPM sound header at 0x{offset:X}: speed {frame_speed}, bgm speed {bgm_speed}, tracks {lengths:?}"
	);
	Ok(SoundHeader {
		offset,
		effect_flags,
		frame_speed,
		bgm_speed,
		spans,
	})
}

/// Running decoder state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AdpcmState {
	pub predictor: i32,
	pub step_index: i32,
}

impl AdpcmState {
	fn decode_nibble(&mut self, sample: u8) -> i16 {
		let step = i32::from(ADPCM_STEP_TABLE[self.step_index as usize]);
		let mut diff = step >> 3;
		if sample & 1 != 0 {
			diff += step >> 2;
		}
		if sample & 2 != 0 {
			diff += step >> 1;
		}
		if sample & 4 != 0 {
			diff += step;
		}
		if sample & 8 != 0 {
			diff = -diff;
		}
		self.predictor = (self.predictor + diff).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
		self.step_index = (self.step_index + i32::from(ADPCM_INDEX_TABLE_4BIT[sample as usize]))
			.clamp(0, MAX_STEP_INDEX);
		self.predictor as i16
	}

	/// Decodes one byte, low nibble first
	pub fn decode_byte(&mut self, byte: u8, out: &mut Vec<i16>) {
		out.push(self.decode_nibble(byte & 0xF));
		out.push(self.decode_nibble(byte >> 4));
	}
}

/// Decodes a PPM ADPCM track to 16-bit PCM at 8192 Hz
pub fn decode_adpcm(src: &[u8]) -> Vec<i16> {
	let mut state = AdpcmState::default();
	let mut out = Vec::with_capacity(src.len() * 2);
	for &byte in src {
		state.decode_byte(byte, &mut out);
	}
	out
}

/// Expands per-frame flag bytes into one boolean per sound effect
pub(crate) fn effect_usage(flags: &[u8]) -> Vec<Vec<bool>> {
	flags.iter().map(|&f| (0..SOUND_EFFECT_COUNT).map(|se| f & (1 << se) != 0).collect()).collect()
}
