//! Flipnote Studio 3D (`.KWZ`) support.
//!
//! # File Structure
//!
//! A KWZ file is a sequence of sections, each an 8-byte header (4-byte magic,
//! u32 length) followed by its payload, and ends with a 256-byte RSA
//! signature:
//!
//! - `KFH`: authors, timestamps, frame count and speed, lock and loop flags
//! - `KTN`: JPEG thumbnail
//! - `KMC`: encoded frame data
//! - `KMI`: one 28-byte record per frame (palette, layer sizes and depths,
//!   sound effect and camera flags)
//! - `KSN`: ADPCM audio tracks
//! - `KIC`: marks a single-frame folder icon
//!
//! `KMC` and `KMI` are required. Files with `KIC` are folder icons, whose
//! output is cropped to 24x24; files without `KSN` are silent comments.
//!
//! Each frame has three 320x240 layers. A layer is encoded as a bitstream of
//! 8x8 tiles, each tile built from lines looked up in a table of every
//! combination of 8 three-colour pixels. Tiles can be skipped, which keeps
//! the previous frame's contents.
//!
//! # Examples
//!
//! ```no_run
//! use flipnote_types::file::kwz::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut note = File::open("note.kwz")?;
//! println!("{} frames at {} fps", note.frame_count(), note.meta().framerate);
//!
//! let pixels = note.frame_pixels(0)?;
//! let palette = note.frame_palette(0)?;
//! println!("first pixel: {}", palette[pixels[0] as usize]);
//!
//! let audio = note.audio_master_default();
//! audio.write(&mut std::fs::File::create("note.wav")?)?;
//! # Ok(())
//! # }
//! ```

mod bit_reader;
mod constants;
mod file;
mod frame;
mod header;
mod sections;
mod sound;
mod tables;

pub use self::constants::*;
pub use self::file::File;
pub use self::sections::{KFH, KIC, KMC, KMI, KSN, KTN, Section, SectionMap};
pub use self::sound::{decode_adpcm, decode_adpcm_search};
