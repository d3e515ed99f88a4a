//! File type support for `flipnote-rs` project.

mod error;
mod flipnote;
mod meta;
mod settings;

pub mod audio;
pub mod cursor;
pub mod fsid;
pub mod kwz;
pub mod palette;
pub mod ppm;
pub mod signature;

// Re-export unified error type
pub use error::{FileType, FlipnoteError, Result};

// Re-export shared types
pub use audio::{AudioTrack, MasterAudio, TrackSpan};
pub use cursor::{ByteCursor, Endian};
pub use flipnote::{Flipnote, FormatKind, Thumbnail, detect_format};
pub use fsid::FsidRegion;
pub use meta::{Author, Meta, NINTENDO_EPOCH_OFFSET, date_from_nintendo_timestamp};
pub use palette::Color;
pub use settings::ParserSettings;
pub use signature::SignatureDigest;

// Re-export main file types
pub use kwz::File as KwzFile;
pub use ppm::File as PpmFile;
