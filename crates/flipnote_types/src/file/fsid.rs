//! Flipnote Studio ID helpers.
//!
//! ```text
//! PPM              16 hex chars, region nibble first      5A2B8C3D0E4F6071
//! KWZ              4-4-4-6 dashed groups                  1000-2B3C-4D5E-6F7081
//! KWZ DSi Library  20 raw hex chars, leading "14",        14000123456789ABCDE9
//!                  region nibble at char 19
//! ```

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

type Pattern = LazyLock<Option<Regex>>;

static PPM_FSID: Pattern =
	LazyLock::new(|| Regex::new(r"^[0159][0-9A-F]{6}0[0-9A-F]{8}$").ok());

static KWZ_FSID: Pattern = LazyLock::new(|| {
	Regex::new(r"^(00|10|12|14)[0-9A-F]{2}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{6}$").ok()
});

static KWZ_DSI_LIBRARY_FSID: Pattern =
	LazyLock::new(|| Regex::new(r"^14[0-9A-F]{17}[0159]$").ok());

/// Matches the uppercased `fsid`; a pattern that failed to compile matches nothing
fn matches(pattern: &Pattern, fsid: &str) -> bool {
	LazyLock::force(pattern).as_ref().is_some_and(|re| re.is_match(&fsid.to_ascii_uppercase()))
}

/// Console region an FSID was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FsidRegion {
	/// Japan
	Japan,
	/// The Americas
	America,
	/// Europe and Oceania
	Europe,
	/// Not derivable from the ID
	#[default]
	Unknown,
}

impl Display for FsidRegion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FsidRegion::Japan => write!(f, "JPN"),
			FsidRegion::America => write!(f, "USA"),
			FsidRegion::Europe => write!(f, "EUR"),
			FsidRegion::Unknown => write!(f, "UNKNOWN"),
		}
	}
}

fn region_from_ppm_nibble(nibble: Option<char>) -> FsidRegion {
	match nibble {
		Some('0' | '1') => FsidRegion::Japan,
		Some('5') => FsidRegion::America,
		Some('9') => FsidRegion::Europe,
		_ => FsidRegion::Unknown,
	}
}

/// Returns true if `fsid` is a well-formed PPM FSID
pub fn is_ppm_fsid(fsid: &str) -> bool {
	matches(&PPM_FSID, fsid)
}

/// Returns true if `fsid` is a well-formed dashed KWZ FSID
pub fn is_kwz_fsid(fsid: &str) -> bool {
	matches(&KWZ_FSID, fsid)
}

/// Returns true if `fsid` is the raw form used by DSi Library conversions
pub fn is_kwz_dsi_library_fsid(fsid: &str) -> bool {
	matches(&KWZ_DSI_LIBRARY_FSID, fsid)
}

/// Region of a PPM FSID, from its leading nibble
pub fn ppm_fsid_region(fsid: &str) -> FsidRegion {
	region_from_ppm_nibble(fsid.chars().next())
}

/// Region of a KWZ FSID in either the dashed or the DSi Library form
pub fn kwz_fsid_region(fsid: &str) -> FsidRegion {
	if is_kwz_dsi_library_fsid(fsid) {
		return region_from_ppm_nibble(fsid.chars().nth(19));
	}
	match fsid.get(0..2) {
		Some("00") => FsidRegion::Japan,
		Some("10") => FsidRegion::America,
		Some("12") => FsidRegion::Europe,
		_ => FsidRegion::Unknown,
	}
}

/// Formats 20 raw hex chars as a dashed KWZ FSID. The last byte is padding.
pub fn format_kwz_fsid(raw: &str) -> String {
	let part = |range: std::ops::Range<usize>| raw.get(range).unwrap_or("");
	format!("{}-{}-{}-{}", part(0..4), part(4..8), part(8..12), part(12..18))
}
