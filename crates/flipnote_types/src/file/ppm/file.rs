//! Core file operations for PPM files.

use std::path::Path;

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::file::audio::{self, AudioTrack, MasterAudio, TrackSpan};
use crate::file::cursor::ByteCursor;
use crate::file::meta::{self, Meta, date_from_nintendo_timestamp};
use crate::file::palette::{self, Color};
use crate::file::signature::{self, PPM_PUBLIC_KEY, SignatureDigest};
use crate::file::{FileType, FlipnoteError, ParserSettings, Result};

use super::constants::{
	FRAME_DATA_OFFSET, FRAME_HEIGHT, FRAME_TABLE_OFFSET, FRAME_WIDTH, LAYER_COUNT,
	OUTPUT_SAMPLE_RATE, PALETTE_SLOTS, RAW_SAMPLE_RATE, SIGNATURE_SIZE, SOUND_EFFECT_COUNT,
	SOUND_HEADER_SIZE, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH,
};
use super::frame::{self, FrameHeader};
use super::header::{self, Header};
use super::sound::{self, SoundHeader};
use super::thumbnail;

/// Location and header byte of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameEntry {
	offset: usize,
	header: FrameHeader,
}

/// A parsed Flipnote Studio animation.
///
/// Like [`crate::file::KwzFile`], frames are decoded on demand into layer
/// planes owned by the file. Each plane is 256x192 with pixel values 0 or 1.
#[derive(Debug, Clone)]
pub struct File {
	data: Bytes,
	settings: ParserSettings,
	meta: Meta,
	frames: Vec<FrameEntry>,
	sound: SoundHeader,
	sound_data_len: usize,
	layers: [Vec<u8>; LAYER_COUNT],
	previous: [Vec<u8>; LAYER_COUNT],
	last_decoded: Option<usize>,
}

fn build_meta(header: &Header, sound: &SoundHeader) -> Meta {
	let framerate = header::framerate(sound.frame_speed);
	Meta {
		lock: header.lock,
		loop_playback: header.animation_flags & 0x2 != 0,
		is_spinoff: meta::is_spinoff(&header.root, &header.parent, &header.current),
		is_dsi_library: false,
		frame_count: header.frame_count,
		frame_speed: sound.frame_speed,
		bgm_speed: sound.bgm_speed,
		framerate,
		bgm_framerate: header::framerate(sound.bgm_speed),
		duration: meta::note_duration(header.frame_count, framerate),
		thumb_index: header.thumb_index,
		created: None,
		modified: date_from_nintendo_timestamp(header.modified),
		root: header.root.clone(),
		parent: header.parent.clone(),
		current: header.current.clone(),
		layer_visibility: vec![
			header.animation_flags & 0x10 == 0,
			header.animation_flags & 0x20 == 0,
		],
	}
}

/// Reads the frame offset table and every frame's header byte
fn build_frame_table(data: &[u8], header: &Header) -> Result<Vec<FrameEntry>> {
	let mut cursor = ByteCursor::new(data, FileType::Ppm);
	cursor.seek(FRAME_DATA_OFFSET)?;
	let table_len = cursor.read_u16()? as usize;
	if table_len < header.frame_count * 4 {
		return Err(FlipnoteError::malformed(
			FileType::Ppm,
			format!("offset table of {table_len} bytes for {} frames", header.frame_count),
		));
	}

	let base = FRAME_TABLE_OFFSET + table_len;
	let end = FRAME_DATA_OFFSET + header.frame_data_len;
	if end > data.len() {
		return Err(FlipnoteError::malformed(
			FileType::Ppm,
			format!("frame data ends at 0x{end:X}, past file end 0x{:X}", data.len()),
		));
	}

	let mut frames = Vec::with_capacity(header.frame_count);
	for index in 0..header.frame_count {
		cursor.seek(FRAME_TABLE_OFFSET + index * 4)?;
		let offset = base + cursor.read_u32()? as usize;
		if offset >= end {
			return Err(FlipnoteError::malformed(
				FileType::Ppm,
				format!("frame {index} at 0x{offset:X} is past the frame data end 0x{end:X}"),
			));
		}
		frames.push(FrameEntry {
			offset,
			header: FrameHeader(data[offset]),
		});
	}
	Ok(frames)
}

impl File {
	/// Parses a PPM file with default settings
	pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
		Self::from_bytes_with_settings(data, ParserSettings::default())
	}

	/// Parses a PPM file
	pub fn from_bytes_with_settings(
		data: impl Into<Bytes>,
		settings: ParserSettings,
	) -> Result<Self> {
		let data: Bytes = data.into();
		let header = header::parse(&data)?;
		let frames = build_frame_table(&data, &header)?;
		let sound = sound::parse(&data, header.frame_data_len, header.frame_count)?;
		let meta = build_meta(&header, &sound);

		debug!(
			"Opened PPM: {} frames at {} fps, {} keyframes, {} bytes of sound",
			meta.frame_count,
			meta.framerate,
			frames.iter().filter(|f| f.header.is_keyframe()).count(),
			header.sound_data_len
		);

		let plane = vec![0u8; FRAME_WIDTH * FRAME_HEIGHT];
		Ok(Self {
			data,
			settings,
			meta,
			frames,
			sound,
			sound_data_len: header.sound_data_len,
			layers: [plane.clone(), plane.clone()],
			previous: [plane.clone(), plane],
			last_decoded: None,
		})
	}

	/// Reads and parses a PPM file from disk
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_bytes(std::fs::read(path)?)
	}

	/// Note metadata
	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	/// Settings the file was opened with
	pub fn settings(&self) -> &ParserSettings {
		&self.settings
	}

	/// The whole file
	pub fn data(&self) -> &Bytes {
		&self.data
	}

	/// Number of frames
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Frame width in pixels
	pub fn width(&self) -> usize {
		FRAME_WIDTH
	}

	/// Frame height in pixels
	pub fn height(&self) -> usize {
		FRAME_HEIGHT
	}

	fn entry(&self, frame: usize) -> Result<FrameEntry> {
		let count = self.frames.len();
		self.frames
			.get(frame)
			.copied()
			.ok_or_else(|| FlipnoteError::out_of_range(FileType::Ppm, "frame", frame, count))
	}

	/// Returns true if the frame does not diff against the previous one
	pub fn is_keyframe(&self, frame: usize) -> Result<bool> {
		Ok(self.entry(frame)?.header.is_keyframe())
	}

	/// The global palette
	pub fn global_palette(&self) -> &'static [Color] {
		&palette::ppm::GLOBAL
	}

	/// Global palette indices of the paper and the two layer pens
	pub fn frame_palette_indices(&self, frame: usize) -> Result<[u8; PALETTE_SLOTS]> {
		Ok(self.entry(frame)?.header.palette_indices())
	}

	/// Colours of the paper and the two layer pens
	pub fn frame_palette(&self, frame: usize) -> Result<[Color; PALETTE_SLOTS]> {
		let indices = self.frame_palette_indices(frame)?;
		Ok(indices.map(|index| palette::lookup(&palette::ppm::GLOBAL, index)))
	}

	/// Which sound effects start on the frame (SE1 to SE3)
	pub fn frame_sound_flags(&self, frame: usize) -> Result<[bool; SOUND_EFFECT_COUNT]> {
		self.entry(frame)?;
		let flags = self.sound.effect_flags[frame];
		Ok([flags & 0x1 != 0, flags & 0x2 != 0, flags & 0x4 != 0])
	}

	/// Sound effect flags for every frame
	pub fn sound_effect_usage(&self) -> Vec<Vec<bool>> {
		sound::effect_usage(&self.sound.effect_flags)
	}

	fn decode_single(&mut self, index: usize) -> Result<()> {
		let entry = self.frames[index];
		std::mem::swap(&mut self.layers, &mut self.previous);
		for plane in &mut self.layers {
			plane.fill(0);
		}
		let (header, translation) =
			frame::decode_into(&self.data, entry.offset, &mut self.layers)?;
		if !header.is_keyframe() {
			frame::apply_diff(&mut self.layers, &self.previous, translation);
		}
		Ok(())
	}

	/// Decodes a frame into the two layer planes and returns them.
	///
	/// The planes are reused by the next call, so copy them out before
	/// decoding another frame if they are needed afterwards. A frame that is
	/// not a keyframe is rebuilt from the nearest keyframe before it, or from
	/// the last decoded frame when that is its predecessor.
	pub fn decode_frame(&mut self, frame: usize) -> Result<&[Vec<u8>]> {
		self.entry(frame)?;
		if self.last_decoded == Some(frame) {
			return Ok(&self.layers);
		}

		let mut start = frame;
		while start > 0
			&& !self.frames[start].header.is_keyframe()
			&& self.last_decoded != Some(start - 1)
		{
			start -= 1;
		}
		trace!("PPM decoding frames {start}..={frame} for frame {frame}");

		let resumes = start > 0 && self.last_decoded == Some(start - 1);
		self.last_decoded = None;
		if !resumes {
			// the frame before the chain decodes as blank
			for plane in &mut self.layers {
				plane.fill(0);
			}
		}
		for index in start..=frame {
			self.decode_single(index)?;
		}

		self.last_decoded = Some(frame);
		Ok(&self.layers)
	}

	/// Decodes a frame and returns one layer plane
	pub fn layer_pixels(&mut self, frame: usize, layer: usize) -> Result<&[u8]> {
		if layer >= LAYER_COUNT {
			return Err(FlipnoteError::out_of_range(FileType::Ppm, "layer", layer, LAYER_COUNT));
		}
		let layers = self.decode_frame(frame)?;
		Ok(&layers[layer])
	}

	/// Decodes and composites a frame into palette slot indices: 0 for the
	/// paper, 1 for layer 1 and 2 for layer 2. Layer 1 is drawn on top.
	pub fn frame_pixels(&mut self, frame: usize) -> Result<Vec<u8>> {
		self.decode_frame(frame)?;
		let mut out = vec![0u8; FRAME_WIDTH * FRAME_HEIGHT];
		for layer in [1, 0] {
			if self.settings.apply_layer_visibility && !self.meta.layer_visibility[layer] {
				continue;
			}
			let slot = layer as u8 + 1;
			for (dst, &pixel) in out.iter_mut().zip(&self.layers[layer]) {
				if pixel != 0 {
					*dst = slot;
				}
			}
		}
		Ok(out)
	}

	/// Decodes and composites a frame into RGBA bytes
	pub fn frame_rgba(&mut self, frame: usize) -> Result<Vec<u8>> {
		let colors = self.frame_palette(frame)?;
		let pixels = self.frame_pixels(frame)?;
		Ok(pixels.iter().flat_map(|&slot| colors[slot as usize].to_array()).collect())
	}

	/// Thumbnail size in pixels
	pub fn thumbnail_size(&self) -> (usize, usize) {
		(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
	}

	/// The 64x48 thumbnail as palette indices
	pub fn thumbnail_indices(&self) -> Result<Vec<u8>> {
		thumbnail::decode_indices(&self.data)
	}

	/// The 64x48 thumbnail as RGBA bytes
	pub fn thumbnail_rgba(&self) -> Result<Vec<u8>> {
		thumbnail::decode_rgba(&self.data)
	}

	/// Location of an audio track; `None` for [`AudioTrack::Se4`]
	pub fn audio_track_span(&self, track: AudioTrack) -> Option<TrackSpan> {
		self.sound.span(track)
	}

	/// Returns true if the track holds any audio
	pub fn has_audio_track(&self, track: AudioTrack) -> bool {
		self.audio_track_span(track).is_some_and(|span| span.length > 0)
	}

	/// Raw ADPCM bytes of a track
	pub fn audio_track_raw(&self, track: AudioTrack) -> Bytes {
		match self.audio_track_span(track) {
			Some(span) => self.data.slice(span.range()),
			None => Bytes::new(),
		}
	}

	/// Decodes a track to PCM at the stored sample rate of 8192 Hz
	pub fn decode_audio_track(&self, track: AudioTrack) -> Vec<i16> {
		sound::decode_adpcm(&self.audio_track_raw(track))
	}

	fn track_source_rate(&self, track: AudioTrack) -> f64 {
		match track {
			AudioTrack::Bgm => RAW_SAMPLE_RATE * self.meta.framerate / self.meta.bgm_framerate,
			_ => RAW_SAMPLE_RATE,
		}
	}

	/// Decodes a track and resamples it to `sample_rate` Hz.
	///
	/// Background music is sped up or slowed down to match the playback
	/// framerate when it was recorded at a different one.
	pub fn audio_track_pcm(&self, track: AudioTrack, sample_rate: u32) -> Vec<i16> {
		let pcm = self.decode_audio_track(track);
		audio::resample_nearest(&pcm, self.track_source_rate(track), f64::from(sample_rate))
	}

	/// Mixes all tracks into one soundtrack at `sample_rate` Hz
	pub fn audio_master(&self, sample_rate: u32) -> MasterAudio {
		let dst = f64::from(sample_rate);
		let len = (self.meta.duration * dst).ceil() as usize;
		let bgm = self
			.has_audio_track(AudioTrack::Bgm)
			.then(|| self.audio_track_pcm(AudioTrack::Bgm, sample_rate));
		let effects: Vec<Option<Vec<i16>>> = [AudioTrack::Se1, AudioTrack::Se2, AudioTrack::Se3]
			.into_iter()
			.map(|track| {
				self.has_audio_track(track).then(|| self.audio_track_pcm(track, sample_rate))
			})
			.collect();
		let usage = self.sound_effect_usage();
		let samples_per_frame = dst / self.meta.framerate;

		let samples = audio::mix_master(len, bgm.as_deref(), &effects, &usage, samples_per_frame);
		let clip_ratio = audio::clipping_ratio(&samples);
		if clip_ratio > 0.0 {
			debug!("PPM master audio clip ratio {clip_ratio:.4}");
		}
		MasterAudio {
			samples,
			sample_rate,
			clip_ratio,
		}
	}

	/// Mixes all tracks at the default output rate of 32768 Hz
	pub fn audio_master_default(&self) -> MasterAudio {
		self.audio_master(OUTPUT_SAMPLE_RATE)
	}

	/// Sound data length is taken from the file header, not the track table
	fn body_end(&self) -> usize {
		self.sound.offset + SOUND_HEADER_SIZE + self.sound_data_len
	}

	/// The signed part of the file: header, frames and sound
	pub fn body(&self) -> Bytes {
		self.data.slice(..self.body_end().min(self.data.len()))
	}

	/// The 128-byte signature, if the file is long enough to hold one
	pub fn signature(&self) -> Option<Bytes> {
		let start = self.body_end();
		let end = start + SIGNATURE_SIZE;
		(end <= self.data.len()).then(|| self.data.slice(start..end))
	}

	/// Verifies the signature against the Flipnote Studio public key
	pub fn verify(&self) -> Result<bool> {
		self.verify_with_key(PPM_PUBLIC_KEY)
	}

	/// Verifies the signature against a PEM-encoded public key
	pub fn verify_with_key(&self, public_key_pem: &str) -> Result<bool> {
		let Some(signature) = self.signature() else {
			warn!("PPM file has no room for a signature after 0x{:X}", self.body_end());
			return Ok(false);
		};
		signature::verify_pkcs1v15(public_key_pem, SignatureDigest::Sha1, &self.body(), &signature)
	}
}
