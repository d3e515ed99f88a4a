//! Format detection and a common front for both formats.

use std::fmt::Display;
use std::path::Path;

use bytes::Bytes;
use log::debug;

use crate::file::audio::{AudioTrack, MasterAudio};
use crate::file::kwz;
use crate::file::palette::Color;
use crate::file::ppm;
use crate::file::{FileType, FlipnoteError, Meta, ParserSettings, Result};

const PPM_MAGIC: u32 = 0x5041_5241;
const KWZ_MAGIC: u32 = 0x4B46_4800;
const KWZ_ICON_MAGIC: u32 = 0x4B49_4300;

/// What the leading magic of a buffer identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
	/// `PARA`
	Ppm,
	/// Starts with a `KFH` section
	Kwz,
	/// Starts with a `KIC` section
	KwzIcon,
}

impl FormatKind {
	/// Container format shared by the kind
	pub fn file_type(self) -> FileType {
		match self {
			FormatKind::Ppm => FileType::Ppm,
			FormatKind::Kwz | FormatKind::KwzIcon => FileType::Kwz,
		}
	}
}

impl Display for FormatKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FormatKind::Ppm => write!(f, "PPM"),
			FormatKind::Kwz => write!(f, "KWZ"),
			FormatKind::KwzIcon => write!(f, "KWZ folder icon"),
		}
	}
}

/// Identifies a buffer from its first four bytes.
///
/// The fourth byte of a KWZ section magic is a version and is ignored.
pub fn detect_format(data: &[u8]) -> Result<FormatKind> {
	let Some(magic) = data.first_chunk::<4>() else {
		return Err(FlipnoteError::insufficient_data(FileType::Ppm, 4, data.len()));
	};
	let value = u32::from_be_bytes(*magic);
	match value {
		PPM_MAGIC => Ok(FormatKind::Ppm),
		_ if value & 0xFFFF_FF00 == KWZ_MAGIC => Ok(FormatKind::Kwz),
		_ if value & 0xFFFF_FF00 == KWZ_ICON_MAGIC => Ok(FormatKind::KwzIcon),
		_ => Err(FlipnoteError::BadMagic { actual: *magic }),
	}
}

/// A thumbnail in whatever form the format stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
	/// Embedded JPEG bytes
	Jpeg(Bytes),
	/// Decoded bitmap
	Rgba {
		/// Width in pixels
		width: usize,
		/// Height in pixels
		height: usize,
		/// RGBA bytes, row-major
		pixels: Vec<u8>,
	},
}

/// A parsed note of either format.
///
/// Methods with a counterpart on both [`ppm::File`] and [`kwz::File`]
/// forward to it; reach the format-specific API through the variants.
#[derive(Debug, Clone)]
pub enum Flipnote {
	/// Flipnote Studio
	Ppm(ppm::File),
	/// Flipnote Studio 3D
	Kwz(kwz::File),
}

macro_rules! forward {
	($self:ident, $note:ident => $body:expr) => {
		match $self {
			Flipnote::Ppm($note) => $body,
			Flipnote::Kwz($note) => $body,
		}
	};
}

impl Flipnote {
	/// Detects the format and parses with default settings
	pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
		Self::from_bytes_with_settings(data, ParserSettings::default())
	}

	/// Detects the format and parses
	pub fn from_bytes_with_settings(
		data: impl Into<Bytes>,
		settings: ParserSettings,
	) -> Result<Self> {
		let data: Bytes = data.into();
		let kind = detect_format(&data)?;
		debug!("Detected {kind} ({} bytes)", data.len());
		Ok(match kind {
			FormatKind::Ppm => Flipnote::Ppm(ppm::File::from_bytes_with_settings(data, settings)?),
			FormatKind::Kwz | FormatKind::KwzIcon => {
				Flipnote::Kwz(kwz::File::from_bytes_with_settings(data, settings)?)
			}
		})
	}

	/// Reads a file from disk and parses it
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_bytes(std::fs::read(path)?)
	}

	/// Detected format
	pub fn format(&self) -> FormatKind {
		match self {
			Flipnote::Ppm(_) => FormatKind::Ppm,
			Flipnote::Kwz(note) if note.is_folder_icon() => FormatKind::KwzIcon,
			Flipnote::Kwz(_) => FormatKind::Kwz,
		}
	}

	/// Container format
	pub fn file_type(&self) -> FileType {
		self.format().file_type()
	}

	/// Note metadata
	pub fn meta(&self) -> &Meta {
		forward!(self, note => note.meta())
	}

	/// Settings the note was opened with
	pub fn settings(&self) -> &ParserSettings {
		forward!(self, note => note.settings())
	}

	/// Number of frames
	pub fn frame_count(&self) -> usize {
		forward!(self, note => note.frame_count())
	}

	/// Output width in pixels
	pub fn width(&self) -> usize {
		forward!(self, note => note.width())
	}

	/// Output height in pixels
	pub fn height(&self) -> usize {
		forward!(self, note => note.height())
	}

	/// Number of drawing layers
	pub fn layer_count(&self) -> usize {
		match self {
			Flipnote::Ppm(_) => ppm::LAYER_COUNT,
			Flipnote::Kwz(_) => kwz::LAYER_COUNT,
		}
	}

	/// The format's global palette
	pub fn global_palette(&self) -> &'static [Color] {
		forward!(self, note => note.global_palette())
	}

	/// Global palette indices of a frame's palette slots
	pub fn frame_palette_indices(&self, frame: usize) -> Result<Vec<u8>> {
		forward!(self, note => note.frame_palette_indices(frame).map(|slots| slots.to_vec()))
	}

	/// Colours of a frame's palette slots
	pub fn frame_palette(&self, frame: usize) -> Result<Vec<Color>> {
		forward!(self, note => note.frame_palette(frame).map(|slots| slots.to_vec()))
	}

	/// Returns true if the frame decodes without its predecessors
	pub fn is_keyframe(&self, frame: usize) -> Result<bool> {
		forward!(self, note => note.is_keyframe(frame))
	}

	/// Decodes a frame into its layer planes
	pub fn decode_frame(&mut self, frame: usize) -> Result<&[Vec<u8>]> {
		forward!(self, note => note.decode_frame(frame))
	}

	/// Decodes a frame and returns one layer plane
	pub fn layer_pixels(&mut self, frame: usize, layer: usize) -> Result<&[u8]> {
		forward!(self, note => note.layer_pixels(frame, layer))
	}

	/// Decodes and composites a frame into palette slot indices
	pub fn frame_pixels(&mut self, frame: usize) -> Result<Vec<u8>> {
		forward!(self, note => note.frame_pixels(frame))
	}

	/// Decodes and composites a frame into RGBA bytes
	pub fn frame_rgba(&mut self, frame: usize) -> Result<Vec<u8>> {
		forward!(self, note => note.frame_rgba(frame))
	}

	/// Per-frame sound effect flags
	pub fn sound_effect_usage(&self) -> Vec<Vec<bool>> {
		forward!(self, note => note.sound_effect_usage())
	}

	/// The note's thumbnail, if it carries one
	pub fn thumbnail(&self) -> Result<Option<Thumbnail>> {
		match self {
			Flipnote::Ppm(note) => {
				let (width, height) = note.thumbnail_size();
				let pixels = note.thumbnail_rgba()?;
				Ok(Some(Thumbnail::Rgba {
					width,
					height,
					pixels,
				}))
			}
			Flipnote::Kwz(note) => Ok(note.thumbnail().map(Thumbnail::Jpeg)),
		}
	}

	/// Returns true if the track holds any audio
	pub fn has_audio_track(&self, track: AudioTrack) -> bool {
		forward!(self, note => note.has_audio_track(track))
	}

	/// Raw ADPCM bytes of a track
	pub fn audio_track_raw(&self, track: AudioTrack) -> Bytes {
		forward!(self, note => note.audio_track_raw(track))
	}

	/// Decodes a track to PCM at its stored sample rate
	pub fn decode_audio_track(&self, track: AudioTrack) -> Vec<i16> {
		forward!(self, note => note.decode_audio_track(track))
	}

	/// Decodes a track and resamples it to `sample_rate` Hz
	pub fn audio_track_pcm(&self, track: AudioTrack, sample_rate: u32) -> Vec<i16> {
		forward!(self, note => note.audio_track_pcm(track, sample_rate))
	}

	/// Mixes all tracks into one soundtrack at `sample_rate` Hz
	pub fn audio_master(&self, sample_rate: u32) -> MasterAudio {
		forward!(self, note => note.audio_master(sample_rate))
	}

	/// Mixes all tracks at the format's default output rate
	pub fn audio_master_default(&self) -> MasterAudio {
		forward!(self, note => note.audio_master_default())
	}

	/// The signed part of the file
	pub fn body(&self) -> Bytes {
		forward!(self, note => note.body())
	}

	/// The signature block, if the file is long enough to hold one
	pub fn signature(&self) -> Option<Bytes> {
		forward!(self, note => note.signature())
	}

	/// Verifies the signature against the format's official public key
	pub fn verify(&self) -> Result<bool> {
		forward!(self, note => note.verify())
	}

	/// Verifies the signature against a PEM-encoded public key
	pub fn verify_with_key(&self, public_key_pem: &str) -> Result<bool> {
		forward!(self, note => note.verify_with_key(public_key_pem))
	}
}

impl From<ppm::File> for Flipnote {
	fn from(note: ppm::File) -> Self {
		Flipnote::Ppm(note)
	}
}

impl From<kwz::File> for Flipnote {
	fn from(note: kwz::File) -> Self {
		Flipnote::Kwz(note)
	}
}
