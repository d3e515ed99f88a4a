//! Authorship and playback metadata common to both formats.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::fsid::FsidRegion;

/// Seconds between the Unix epoch and 2000-01-01 00:00:00 UTC
pub const NINTENDO_EPOCH_OFFSET: i64 = 946_684_800;

/// Converts a timestamp counted from 2000-01-01 UTC
pub fn date_from_nintendo_timestamp(seconds: u32) -> DateTime<Utc> {
	DateTime::from_timestamp(i64::from(seconds) + NINTENDO_EPOCH_OFFSET, 0).unwrap_or_default()
}

/// One link of the authorship chain
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Author {
	/// Display name
	pub name: String,
	/// Flipnote Studio ID
	pub fsid: String,
	/// Region derived from the ID
	pub region: FsidRegion,
	/// Filename of the note as saved by this author
	pub filename: String,
}

impl Display for Author {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} ({}, {}) {}", self.name, self.fsid, self.region, self.filename)
	}
}

/// Note metadata, computed once when the file is opened
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Meta {
	/// Whether the note is locked against editing
	pub lock: bool,
	/// Whether playback loops
	pub loop_playback: bool,
	/// True if the current author differs from the parent or root author
	pub is_spinoff: bool,
	/// True for KWZ notes converted from PPM by the DSi Library service
	pub is_dsi_library: bool,
	/// Number of frames
	pub frame_count: usize,
	/// Frame speed index into the format's framerate table
	pub frame_speed: u8,
	/// Frame speed index the background music was recorded at
	pub bgm_speed: u8,
	/// Animation framerate in frames per second
	pub framerate: f64,
	/// Framerate during background music recording
	pub bgm_framerate: f64,
	/// Playback duration in seconds
	pub duration: f64,
	/// Index of the frame used as thumbnail
	pub thumb_index: usize,
	/// Creation time (KWZ only)
	pub created: Option<DateTime<Utc>>,
	/// Last modification time
	pub modified: DateTime<Utc>,
	/// Original author
	pub root: Author,
	/// Author of the version this one was derived from
	pub parent: Author,
	/// Latest author
	pub current: Author,
	/// Per-layer visibility, in layer order
	pub layer_visibility: Vec<bool>,
}

pub(crate) fn is_spinoff(root: &Author, parent: &Author, current: &Author) -> bool {
	current.fsid != parent.fsid || current.fsid != root.fsid
}

pub(crate) fn note_duration(frame_count: usize, framerate: f64) -> f64 {
	if framerate <= 0.0 {
		return 0.0;
	}
	frame_count as f64 / framerate
}
