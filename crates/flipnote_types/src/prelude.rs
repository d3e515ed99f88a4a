//! Prelude module for `flipnote_types`.
//!
//! This module provides a convenient way to import commonly used types.
//!
//! # Examples
//!
//! ```no_run
//! use flipnote_types::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("note.kwz")?;
//! if let Ok(FormatKind::Kwz) = detect_format(&data) {
//!     let note = KwzFile::from_bytes(data)?;
//!     println!("{}", note.meta().current);
//! }
//! # Ok(())
//! # }
//! ```

#[doc(inline)]
pub use crate::file::{
	// Shared types
	AudioTrack,
	Author,
	Color,
	FileType,

	// Facade
	Flipnote,
	FlipnoteError,
	FormatKind,
	FsidRegion,

	// Format types
	KwzFile,
	MasterAudio,
	Meta,
	ParserSettings,
	PpmFile,
	Thumbnail,

	detect_format,
};
