//! `KSN` sound header and the KWZ ADPCM variant.
//!
//! KWZ audio mixes 2-bit and 4-bit samples in one stream. A sample is 2 bits
//! wide when the step index is below 18 or when fewer than four bits of the
//! current byte remain; otherwise it is a regular 4-bit IMA sample. The
//! predictor is 12 bits wide and scaled up to 16-bit PCM on output.

use log::debug;

use crate::file::audio::{
	ADPCM_INDEX_TABLE_2BIT, ADPCM_INDEX_TABLE_4BIT, ADPCM_STEP_TABLE, AudioTrack, TrackSpan, rms,
};
use crate::file::cursor::ByteCursor;
use crate::file::{FileType, FlipnoteError, Result};

use super::constants::DSI_LIBRARY_MAX_STEP_INDEX;
use super::sections::Section;

const MAX_STEP_INDEX: i32 = 79;
const PREDICTOR_MIN: i32 = -2048;
const PREDICTOR_MAX: i32 = 2047;

/// Parsed `KSN` header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SoundHeader {
	/// Frame speed the background music was recorded at
	pub bgm_speed: u8,
	/// Track locations in [`AudioTrack::ALL`] order
	pub spans: [TrackSpan; 5],
}

impl SoundHeader {
	pub fn span(&self, track: AudioTrack) -> TrackSpan {
		self.spans[track.index()]
	}
}

pub(crate) fn parse(data: &[u8], section: &Section) -> Result<SoundHeader> {
	let mut cursor = ByteCursor::new(data, FileType::Kwz);
	cursor.seek(section.offset + 8)?;
	let bgm_speed = cursor.read_u32()?;
	let mut spans = [TrackSpan::default(); 5];
	let mut offset = section.offset + 36;
	for span in &mut spans {
		let length = cursor.read_u32()? as usize;
		*span = TrackSpan {
			offset,
			length,
		};
		offset += length;
	}
	if offset > section.end() {
		return Err(FlipnoteError::malformed(
			FileType::Kwz,
			format!("sound tracks end at 0x{offset:X}, past KSN end 0x{:X}", section.end()),
		));
	}
	debug!("KWZ sound header: bgm speed {bgm_speed}, tracks {spans:?}");
	Ok(SoundHeader {
		bgm_speed: u8::try_from(bgm_speed).unwrap_or(u8::MAX),
		spans,
	})
}

/// Running decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdpcmState {
	pub predictor: i32,
	pub step_index: i32,
}

impl AdpcmState {
	pub fn new(predictor: i16, step_index: u8) -> Self {
		Self {
			predictor: i32::from(predictor).clamp(PREDICTOR_MIN, PREDICTOR_MAX),
			step_index: i32::from(step_index).min(MAX_STEP_INDEX),
		}
	}

	fn push(&mut self, diff: i32, index_delta: i8, out: &mut Vec<i16>) {
		self.predictor = (self.predictor + diff).clamp(PREDICTOR_MIN, PREDICTOR_MAX);
		self.step_index = (self.step_index + i32::from(index_delta)).clamp(0, MAX_STEP_INDEX);
		out.push((self.predictor * 16) as i16);
	}

	/// Decodes one byte into two to four samples
	pub fn decode_byte(&mut self, byte: u8, out: &mut Vec<i16>) {
		let mut value = byte;
		let mut bit = 0;
		while bit < 8 {
			let step = i32::from(ADPCM_STEP_TABLE[self.step_index as usize]);
			if self.step_index < 18 || bit > 4 {
				let sample = value & 0x3;
				let mut diff = step >> 3;
				if sample & 1 != 0 {
					diff += step;
				}
				if sample & 2 != 0 {
					diff = -diff;
				}
				self.push(diff, ADPCM_INDEX_TABLE_2BIT[sample as usize], out);
				value >>= 2;
				bit += 2;
			} else {
				let sample = value & 0xF;
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
				self.push(diff, ADPCM_INDEX_TABLE_4BIT[sample as usize], out);
				value >>= 4;
				bit += 4;
			}
		}
	}
}

/// Decodes a KWZ ADPCM track to 16-bit PCM at the raw sample rate
pub fn decode_adpcm(src: &[u8], predictor: i16, step_index: u8) -> Vec<i16> {
	let mut state = AdpcmState::new(predictor, step_index);
	let mut out = Vec::with_capacity(src.len() * 4);
	for &byte in src {
		state.decode_byte(byte, &mut out);
	}
	out
}

/// Decodes a DSi Library track whose initial step index is unknown.
///
/// Every step index up to 40 is tried and the quietest result is kept, since
/// a wrong starting state shows up as loud noise. Returns the PCM and the
/// step index that produced it.
pub fn decode_adpcm_search(src: &[u8], predictor: i16) -> (Vec<i16>, u8) {
	let mut best: Option<(f64, Vec<i16>, u8)> = None;
	for step_index in 0..=DSI_LIBRARY_MAX_STEP_INDEX {
		let pcm = decode_adpcm(src, predictor, step_index);
		let level = rms(&pcm);
		if best.as_ref().is_none_or(|(best_level, _, _)| level < *best_level) {
			best = Some((level, pcm, step_index));
		}
	}
	match best {
		Some((level, pcm, step_index)) => {
			debug!("KWZ DSi Library audio: step index {step_index}, rms {level:.1}");
			(pcm, step_index)
		}
		None => (Vec::new(), 0),
	}
}
