//! Audio primitives shared by the PPM and KWZ decoders.
//!
//! Both formats store IMA-style ADPCM. The decoders themselves live with each
//! format; this module holds the tables, the resamplers, and the master mixer
//! that lays sound effects over the background music frame by frame.

use std::fmt::Display;
use std::io::{Seek, Write};

use serde::Serialize;

use super::Result;

/// IMA ADPCM step table
pub const ADPCM_STEP_TABLE: [i16; 89] = [
	7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66, 73, 80,
	88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408, 449, 494, 544,
	598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066, 2272, 2499, 2749,
	3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635,
	13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// Step index adjustment for 2-bit samples
pub const ADPCM_INDEX_TABLE_2BIT: [i8; 4] = [-1, 2, -1, 2];

/// Step index adjustment for 4-bit samples
pub const ADPCM_INDEX_TABLE_4BIT: [i8; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

/// Audio tracks. PPM has no `Se4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AudioTrack {
	/// Background music, recorded over the whole note
	Bgm,
	/// Sound effect 1
	Se1,
	/// Sound effect 2
	Se2,
	/// Sound effect 3
	Se3,
	/// Sound effect 4 (KWZ only)
	Se4,
}

impl AudioTrack {
	/// Every track in storage order
	pub const ALL: [AudioTrack; 5] =
		[AudioTrack::Bgm, AudioTrack::Se1, AudioTrack::Se2, AudioTrack::Se3, AudioTrack::Se4];

	/// Position of the track in storage order
	pub fn index(self) -> usize {
		self as usize
	}

	/// Sound effect number (0 for SE1), or `None` for the background music
	pub fn effect_index(self) -> Option<usize> {
		match self {
			AudioTrack::Bgm => None,
			other => Some(other.index() - 1),
		}
	}
}

impl Display for AudioTrack {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AudioTrack::Bgm => write!(f, "BGM"),
			AudioTrack::Se1 => write!(f, "SE1"),
			AudioTrack::Se2 => write!(f, "SE2"),
			AudioTrack::Se3 => write!(f, "SE3"),
			AudioTrack::Se4 => write!(f, "SE4"),
		}
	}
}

/// Location of one audio track inside the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TrackSpan {
	/// Absolute byte offset
	pub offset: usize,
	/// Length in bytes
	pub length: usize,
}

impl TrackSpan {
	/// Byte range covered by the track
	pub fn range(&self) -> std::ops::Range<usize> {
		self.offset..self.offset + self.length
	}
}

fn resampled_len(src_len: usize, src_freq: f64, dst_freq: f64) -> usize {
	if src_freq <= 0.0 {
		return 0;
	}
	((src_len as f64 / src_freq) * dst_freq) as usize
}

/// Zero-order hold resampling
pub fn resample_nearest(src: &[i16], src_freq: f64, dst_freq: f64) -> Vec<i16> {
	let dst_len = resampled_len(src.len(), src_freq, dst_freq);
	let step = src_freq / dst_freq;
	let last = src.len().saturating_sub(1);
	(0..dst_len).map(|i| src[((i as f64 * step) as usize).min(last)]).collect()
}

/// Linear interpolation between neighbouring source samples
pub fn resample_linear(src: &[i16], src_freq: f64, dst_freq: f64) -> Vec<i16> {
	let dst_len = resampled_len(src.len(), src_freq, dst_freq);
	let step = src_freq / dst_freq;
	let last = src.len().saturating_sub(1);
	(0..dst_len)
		.map(|i| {
			let pos = i as f64 * step;
			let base = (pos as usize).min(last);
			let next = (base + 1).min(last);
			let weight = pos.fract();
			let value = (1.0 - weight) * f64::from(src[base]) + weight * f64::from(src[next]);
			value as i16
		})
		.collect()
}

/// Adds `src` into `dst` starting at `offset`, clamping to the `i16` range.
/// Samples falling past the end of `dst` are dropped.
pub fn mix_into(src: &[i16], dst: &mut [i16], offset: usize) {
	let Some(window) = dst.get_mut(offset..) else {
		return;
	};
	for (out, &sample) in window.iter_mut().zip(src) {
		*out = (i32::from(*out) + i32::from(sample)).clamp(-32768, 32767) as i16;
	}
}

/// Fraction of samples sitting on either rail of the `i16` range
pub fn clipping_ratio(samples: &[i16]) -> f64 {
	if samples.is_empty() {
		return 0.0;
	}
	let clipped = samples.iter().filter(|&&s| s == i16::MIN || s == i16::MAX).count();
	clipped as f64 / samples.len() as f64
}

/// Root mean square of a PCM buffer
pub fn rms(samples: &[i16]) -> f64 {
	if samples.is_empty() {
		return 0.0;
	}
	let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
	(sum / samples.len() as f64).sqrt()
}

/// Lays out a master track of `len` samples: background music at offset 0,
/// then each sound effect at every frame whose usage flag is set for it.
///
/// `effects[n]` is the resampled PCM of sound effect `n`, and `usage[frame][n]`
/// its per-frame flag.
pub fn mix_master(
	len: usize,
	bgm: Option<&[i16]>,
	effects: &[Option<Vec<i16>>],
	usage: &[Vec<bool>],
	samples_per_frame: f64,
) -> Vec<i16> {
	let mut master = vec![0i16; len];
	if let Some(bgm) = bgm {
		mix_into(bgm, &mut master, 0);
	}
	if effects.iter().all(Option::is_none) {
		return master;
	}
	for (frame, flags) in usage.iter().enumerate() {
		let offset = (frame as f64 * samples_per_frame).ceil() as usize;
		for (pcm, _) in effects.iter().zip(flags).filter(|&(_, &used)| used) {
			if let Some(pcm) = pcm {
				mix_into(pcm, &mut master, offset);
			}
		}
	}
	master
}

/// The mixed soundtrack of a note
#[derive(Debug, Clone, PartialEq)]
pub struct MasterAudio {
	/// Signed 16-bit mono samples
	pub samples: Vec<i16>,
	/// Sample rate in Hz
	pub sample_rate: u32,
	/// Fraction of clipped samples; high values hint at corrupt audio
	pub clip_ratio: f64,
}

impl MasterAudio {
	/// Duration in seconds
	pub fn duration(&self) -> f64 {
		if self.sample_rate == 0 {
			return 0.0;
		}
		self.samples.len() as f64 / f64::from(self.sample_rate)
	}

	/// Writes the samples as a mono 16-bit WAV file to the given writer
	pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
		write_wav(writer, &self.samples, self.sample_rate)
	}
}

/// Writes mono 16-bit PCM as a WAV file
pub fn write_wav<W: Write + Seek>(writer: &mut W, samples: &[i16], sample_rate: u32) -> Result<()> {
	let spec = hound::WavSpec {
		channels: 1,
		sample_rate,
		bits_per_sample: 16,
		sample_format: hound::SampleFormat::Int,
	};

	let mut wav_writer = hound::WavWriter::new(writer, spec)?;
	for &sample in samples {
		wav_writer.write_sample(sample)?;
	}
	wav_writer.finalize()?;

	Ok(())
}
