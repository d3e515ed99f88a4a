#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `flipnote-rs` decodes animations made with Flipnote Studio (`.ppm`) and
//! Flipnote Studio 3D (`.kwz`).
//!
//! The decoding engine lives in the `flipnote_types` crate and is re-exported
//! here in full.
//!
//! ```no_run
//! use flipnote_rs::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut note = Flipnote::open("note.kwz")?;
//! let pixels = note.frame_pixels(note.meta().thumb_index)?;
//! println!("{} pixels", pixels.len());
//! # Ok(())
//! # }
//! ```
pub use flipnote_types::*;
