//! This crate provides the decoding engine for the `flipnote-rs` project.
//!
//! # File Formats
//!
//! - **PPM**: Flipnote Studio (Nintendo DSi) animations, 256x192 with two layers
//! - **KWZ**: Flipnote Studio 3D animations, 320x240 with three layers, plus
//!   folder icons and comments stored in the same container
//!
//! Both are decoded into palette-indexed layer planes, composited frames,
//! 16-bit PCM audio and authorship metadata. Embedded RSA signatures can be
//! checked without affecting decoding.
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use flipnote_types::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut note = Flipnote::open("note.ppm")?;
//! println!("{} by {}", note.format(), note.meta().current.name);
//!
//! for frame in 0..note.frame_count() {
//!     let rgba = note.frame_rgba(frame)?;
//!     assert_eq!(rgba.len(), note.width() * note.height() * 4);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or use the per-format types directly:
//!
//! ```no_run
//! use flipnote_types::file::KwzFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let note = KwzFile::open("note.kwz")?;
//! println!("signature valid: {}", note.verify()?);
//! # Ok(())
//! # }
//! ```

pub mod file;

/// `use flipnote_types::prelude::*;` to import commonly used items.
pub mod prelude;
