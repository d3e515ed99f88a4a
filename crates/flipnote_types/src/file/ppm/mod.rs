//! Flipnote Studio (`.PPM`) support.
//!
//! # File Structure
//!
//! A PPM file has a fixed layout:
//!
//! - `0x000`: `PARA` magic, frame data and sound data sizes, frame count,
//!   lock flag, thumbnail frame index
//! - `0x014`: names, FSIDs and filenames of the root, parent and current
//!   authors, and the modification timestamp
//! - `0x0A0`: 64x48 thumbnail bitmap with 4-bit colour indices
//! - `0x6A0`: frame data, starting with the offset table and the animation
//!   flags
//! - after the frame data: one sound effect flag byte per frame, then the
//!   32-byte sound header and the ADPCM tracks
//! - the 128-byte RSA signature
//!
//! Each frame has two 256x192 one-bit layers stored as runs of encoded lines.
//! Frames that are not keyframes are XORed onto the previous frame, which may
//! be shifted by a translation first.
//!
//! # Examples
//!
//! ```no_run
//! use flipnote_types::file::ppm::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut note = File::open("note.ppm")?;
//! println!("{} frames, signed: {}", note.frame_count(), note.verify()?);
//!
//! let layers = note.decode_frame(0)?;
//! let inked = layers[0].iter().filter(|&&pixel| pixel != 0).count();
//! println!("layer 1 has {inked} pixels");
//! # Ok(())
//! # }
//! ```

mod constants;
mod file;
mod frame;
mod header;
mod sound;
mod thumbnail;

pub use self::constants::*;
pub use self::file::File;
pub use self::sound::decode_adpcm;
