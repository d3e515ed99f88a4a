//! Core file operations for KWZ files.

use std::path::Path;

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::file::audio::{self, AudioTrack, MasterAudio, TrackSpan};
use crate::file::cursor::ByteCursor;
use crate::file::palette::{self, Color};
use crate::file::signature::{self, KWZ_PUBLIC_KEY, SignatureDigest};
use crate::file::{FileType, FlipnoteError, Meta, ParserSettings, Result};

use super::constants::{
	FRAME_HEIGHT, FRAME_RECORD_SIZE, FRAME_WIDTH, ICON_SIZE, LAYER_COUNT, OUTPUT_SAMPLE_RATE,
	PALETTE_SLOTS, RAW_SAMPLE_RATE, SIGNATURE_SIZE, SOUND_EFFECT_COUNT,
};
use super::frame::{self, ALL_LAYERS, FrameRecord};
use super::header;
use super::sections::{KFH, KIC, KMC, KMI, KSN, KTN, SectionMap};
use super::sound::{self, SoundHeader};

/// A parsed Flipnote Studio 3D animation.
///
/// Metadata and the frame table are read once when the file is opened.
/// Frames are decoded on demand into three layer planes owned by the file;
/// see [`File::decode_frame`] for how long borrowed planes stay valid.
#[derive(Debug, Clone)]
pub struct File {
	data: Bytes,
	settings: ParserSettings,
	sections: SectionMap,
	meta: Meta,
	frames: Vec<FrameRecord>,
	sound: Option<SoundHeader>,
	is_folder_icon: bool,
	layers: Vec<Vec<u8>>,
	last_decoded: Option<usize>,
}

impl File {
	/// Parses a KWZ file with default settings
	pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
		Self::from_bytes_with_settings(data, ParserSettings::default())
	}

	/// Parses a KWZ file
	pub fn from_bytes_with_settings(
		data: impl Into<Bytes>,
		settings: ParserSettings,
	) -> Result<Self> {
		let data: Bytes = data.into();
		let sections = SectionMap::scan(&data)?;
		let kmi = *sections.require(KMI, "KMI")?;
		let kmc = *sections.require(KMC, "KMC")?;
		let is_folder_icon = sections.contains(KIC);

		let mut meta = match sections.get(KFH) {
			Some(kfh) => header::parse(&data, kfh)?,
			None if is_folder_icon => header::headerless(1),
			None => header::headerless(kmi.length / FRAME_RECORD_SIZE),
		};
		let frames = frame::build_frame_table(&data, &kmi, &kmc, meta.frame_count)?;

		let sound = sections.get(KSN).map(|ksn| sound::parse(&data, ksn)).transpose()?;
		if let Some(sound) = &sound {
			meta.bgm_speed = sound.bgm_speed;
			meta.bgm_framerate = header::framerate(sound.bgm_speed);
		}
		if let Some(force) = settings.force_dsi_library {
			meta.is_dsi_library = force;
		}

		debug!(
			"Opened KWZ: {} frames at {} fps, {} sections, icon: {}, DSi Library: {}",
			meta.frame_count,
			meta.framerate,
			sections.len(),
			is_folder_icon,
			meta.is_dsi_library
		);

		Ok(Self {
			data,
			settings,
			sections,
			meta,
			frames,
			sound,
			is_folder_icon,
			layers: vec![vec![0u8; FRAME_WIDTH * FRAME_HEIGHT]; LAYER_COUNT],
			last_decoded: None,
		})
	}

	/// Reads and parses a KWZ file from disk
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

	/// Section table
	pub fn sections(&self) -> &SectionMap {
		&self.sections
	}

	/// The whole file
	pub fn data(&self) -> &Bytes {
		&self.data
	}

	/// Number of frames
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Output width in pixels (24 for folder icons)
	pub fn width(&self) -> usize {
		if self.is_folder_icon { ICON_SIZE } else { FRAME_WIDTH }
	}

	/// Output height in pixels (24 for folder icons)
	pub fn height(&self) -> usize {
		if self.is_folder_icon { ICON_SIZE } else { FRAME_HEIGHT }
	}

	/// Returns true for single-frame folder icons
	pub fn is_folder_icon(&self) -> bool {
		self.is_folder_icon
	}

	/// Returns true for single-frame comments, which have no sound section
	pub fn is_comment(&self) -> bool {
		!self.is_folder_icon && self.sound.is_none()
	}

	fn record(&self, frame: usize) -> Result<&FrameRecord> {
		let count = self.frames.len();
		self.frames
			.get(frame)
			.ok_or_else(|| FlipnoteError::out_of_range(FileType::Kwz, "frame", frame, count))
	}

	/// The global palette
	pub fn global_palette(&self) -> &'static [Color] {
		&palette::kwz::GLOBAL
	}

	/// Global palette indices for the frame's 7 slots: paper, then the two
	/// pens of layers A, B and C
	pub fn frame_palette_indices(&self, frame: usize) -> Result<[u8; PALETTE_SLOTS]> {
		Ok(self.record(frame)?.palette_nibbles())
	}

	/// Colours for the frame's 7 palette slots
	pub fn frame_palette(&self, frame: usize) -> Result<[Color; PALETTE_SLOTS]> {
		let indices = self.frame_palette_indices(frame)?;
		Ok(indices.map(|index| palette::lookup(&palette::kwz::GLOBAL, index)))
	}

	/// Depth of each layer; deeper layers are drawn first
	pub fn frame_layer_depths(&self, frame: usize) -> Result<[u8; LAYER_COUNT]> {
		Ok(self.record(frame)?.layer_depths)
	}

	/// Layer indices in drawing order, bottom first
	pub fn frame_layer_order(&self, frame: usize) -> Result<[usize; LAYER_COUNT]> {
		Ok(self.record(frame)?.layer_order())
	}

	/// Encoded size of each layer in bytes
	pub fn frame_layer_sizes(&self, frame: usize) -> Result<[u16; LAYER_COUNT]> {
		Ok(self.record(frame)?.layer_sizes)
	}

	/// Bit mask of layers that reuse tiles from the previous frame
	pub fn frame_diffing_layers(&self, frame: usize) -> Result<u8> {
		Ok(self.record(frame)?.diffing_layers())
	}

	/// Returns true if the frame can be decoded without its predecessors
	pub fn is_keyframe(&self, frame: usize) -> Result<bool> {
		Ok(self.record(frame)?.dependent_layers() == 0)
	}

	/// FSID of the author who drew the frame
	pub fn frame_author(&self, frame: usize) -> Result<String> {
		let record = self.record(frame)?;
		let mut cursor = ByteCursor::new(&self.data[..], FileType::Kwz);
		cursor.seek(record.record_offset + 0x0A)?;
		header::read_fsid(&mut cursor)
	}

	/// Which layers contain a camera photo
	pub fn frame_camera_flags(&self, frame: usize) -> Result<[bool; LAYER_COUNT]> {
		let flags = self.record(frame)?.camera_flags;
		Ok([flags & 0x1 != 0, flags & 0x2 != 0, flags & 0x4 != 0])
	}

	/// Which sound effects start on the frame (SE1 to SE4)
	pub fn frame_sound_flags(&self, frame: usize) -> Result<[bool; SOUND_EFFECT_COUNT]> {
		let flags = self.record(frame)?.sound_flags;
		Ok([flags & 0x1 != 0, flags & 0x2 != 0, flags & 0x4 != 0, flags & 0x8 != 0])
	}

	/// Sound effect flags for every frame
	pub fn sound_effect_usage(&self) -> Vec<Vec<bool>> {
		self.frames
			.iter()
			.map(|record| {
				(0..SOUND_EFFECT_COUNT).map(|se| record.sound_flags & (1 << se) != 0).collect()
			})
			.collect()
	}

	/// Decodes a frame into the three layer planes and returns them.
	///
	/// Each plane is 320x240 pixels with values 0 (transparent), 1 or 2. The
	/// planes are reused by the next call, so copy them out before decoding
	/// another frame if they are needed afterwards. Decoding the frame that
	/// was decoded last is free.
	///
	/// Frames that reuse tiles from their predecessors are resolved by
	/// walking back to the nearest frame that does not depend on the one
	/// before it, or to the last decoded frame, then decoding forward.
	pub fn decode_frame(&mut self, frame: usize) -> Result<&[Vec<u8>]> {
		self.record(frame)?;
		if self.last_decoded == Some(frame) {
			return Ok(&self.layers);
		}

		// needs[i] holds the layers required from frame start + i
		let mut needs = vec![ALL_LAYERS];
		let mut start = frame;
		while start > 0 && self.last_decoded != Some(start - 1) {
			let need = needs[needs.len() - 1] & self.frames[start].dependent_layers();
			if need == 0 {
				break;
			}
			needs.push(need);
			start -= 1;
		}
		needs.reverse();
		trace!("KWZ decoding frames {start}..={frame} for frame {frame}");

		self.last_decoded = None;
		if start == 0 {
			for (layer, plane) in self.layers.iter_mut().enumerate() {
				if needs[0] & (1 << layer) != 0 {
					plane.fill(0);
				}
			}
		}

		for (index, need) in (start..=frame).zip(needs) {
			let record = self.frames[index];
			for layer in 0..LAYER_COUNT {
				if need & (1 << layer) == 0 {
					continue;
				}
				if record.unchanged_layers() & (1 << layer) != 0 {
					continue;
				}
				let (offset, size) = record.layer_span(layer);
				frame::decode_layer(&self.data[offset..offset + size], &mut self.layers[layer])?;
			}
		}

		self.last_decoded = Some(frame);
		Ok(&self.layers)
	}

	/// Decodes a frame and returns one layer plane
	pub fn layer_pixels(&mut self, frame: usize, layer: usize) -> Result<&[u8]> {
		if layer >= LAYER_COUNT {
			return Err(FlipnoteError::out_of_range(FileType::Kwz, "layer", layer, LAYER_COUNT));
		}
		let layers = self.decode_frame(frame)?;
		Ok(&layers[layer])
	}

	/// Decodes and composites a frame into palette slot indices.
	///
	/// Slot 0 is the paper; layer `n` pixels map to slots `2n + 1` and
	/// `2n + 2`. Folder icons are cropped to 24x24.
	pub fn frame_pixels(&mut self, frame: usize) -> Result<Vec<u8>> {
		let record = *self.record(frame)?;
		self.decode_frame(frame)?;

		let (width, height) = (self.width(), self.height());
		let mut out = vec![0u8; width * height];
		for layer in record.layer_order() {
			if self.settings.apply_layer_visibility
				&& !self.meta.layer_visibility.get(layer).copied().unwrap_or(true)
			{
				continue;
			}
			let plane = &self.layers[layer];
			let slot_offset = layer as u8 * 2;
			for y in 0..height {
				let row = &plane[y * FRAME_WIDTH..y * FRAME_WIDTH + width];
				for (dst, &pixel) in out[y * width..(y + 1) * width].iter_mut().zip(row) {
					if pixel != 0 {
						*dst = pixel + slot_offset;
					}
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

	/// The embedded JPEG thumbnail, if present
	pub fn thumbnail(&self) -> Option<Bytes> {
		let ktn = self.sections.get(KTN)?;
		let start = ktn.offset + 12;
		(start <= ktn.end()).then(|| self.data.slice(start..ktn.end()))
	}

	/// Location of an audio track
	pub fn audio_track_span(&self, track: AudioTrack) -> Option<TrackSpan> {
		self.sound.map(|sound| sound.span(track))
	}

	/// Returns true if the track holds any audio
	pub fn has_audio_track(&self, track: AudioTrack) -> bool {
		self.audio_track_span(track).is_some_and(|span| span.length > 0)
	}

	/// Raw ADPCM bytes of a track; empty if the note has no such track
	pub fn audio_track_raw(&self, track: AudioTrack) -> Bytes {
		match self.audio_track_span(track) {
			Some(span) => self.data.slice(span.range()),
			None => Bytes::new(),
		}
	}

	/// Decodes a track to PCM at the stored sample rate of 16364 Hz.
	///
	/// DSi Library notes store audio with an unknown initial decoder state.
	/// Unless fixed by the settings, the background music uses the step
	/// index that gives the quietest output. Sound effects start from the
	/// configured initial step index.
	pub fn decode_audio_track(&self, track: AudioTrack) -> Vec<i16> {
		let raw = self.audio_track_raw(track);
		if !self.meta.is_dsi_library {
			return sound::decode_adpcm(&raw, 0, self.settings.initial_step_index);
		}
		let predictor = self.settings.dsi_library_predictor.unwrap_or(0);
		match (self.settings.dsi_library_step_index, track) {
			(Some(step_index), _) => sound::decode_adpcm(&raw, predictor, step_index),
			(None, AudioTrack::Bgm) => sound::decode_adpcm_search(&raw, predictor).0,
			(None, _) => sound::decode_adpcm(&raw, predictor, self.settings.initial_step_index),
		}
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
		audio::resample_linear(&pcm, self.track_source_rate(track), f64::from(sample_rate))
	}

	/// Mixes all tracks into one soundtrack at `sample_rate` Hz
	pub fn audio_master(&self, sample_rate: u32) -> MasterAudio {
		let dst = f64::from(sample_rate);
		let len = (self.meta.duration * dst).ceil() as usize;
		let bgm = self
			.has_audio_track(AudioTrack::Bgm)
			.then(|| self.audio_track_pcm(AudioTrack::Bgm, sample_rate));
		let effects: Vec<Option<Vec<i16>>> = AudioTrack::ALL[1..]
			.iter()
			.map(|&track| {
				self.has_audio_track(track).then(|| self.audio_track_pcm(track, sample_rate))
			})
			.collect();
		let usage = self.sound_effect_usage();
		let samples_per_frame = dst / self.meta.framerate;

		let samples = audio::mix_master(len, bgm.as_deref(), &effects, &usage, samples_per_frame);
		let clip_ratio = audio::clipping_ratio(&samples);
		if clip_ratio > 0.0 {
			debug!("KWZ master audio clip ratio {clip_ratio:.4}");
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

	/// The signed part of the file: everything before the signature
	pub fn body(&self) -> Bytes {
		self.data.slice(..self.sections.end())
	}

	/// The 256-byte signature, if the file is long enough to hold one
	pub fn signature(&self) -> Option<Bytes> {
		let start = self.sections.end();
		let end = start + SIGNATURE_SIZE;
		(end <= self.data.len()).then(|| self.data.slice(start..end))
	}

	/// Verifies the signature against the Flipnote Studio 3D public key
	pub fn verify(&self) -> Result<bool> {
		self.verify_with_key(KWZ_PUBLIC_KEY)
	}

	/// Verifies the signature against a PEM-encoded public key
	pub fn verify_with_key(&self, public_key_pem: &str) -> Result<bool> {
		let Some(signature) = self.signature() else {
			warn!("KWZ file has no room for a signature after 0x{:X}", self.sections.end());
			return Ok(false);
		};
		signature::verify_pkcs1v15(public_key_pem, SignatureDigest::Sha256, &self.body(), &signature)
	}
}
