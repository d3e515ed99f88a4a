//! Error types for Flipnote parsing and decoding.

use std::fmt::Display;

use thiserror::Error;

/// Container formats understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum FileType {
	/// Flipnote Studio (Nintendo DSi) animation
	Ppm,
	/// Flipnote Studio 3D animation
	Kwz,
}

impl Display for FileType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FileType::Ppm => write!(f, "PPM"),
			FileType::Kwz => write!(f, "KWZ"),
		}
	}
}

/// Errors that can occur while opening or decoding a Flipnote
#[derive(Debug, Error)]
pub enum FlipnoteError {
	/// The first four bytes do not match any known signature
	#[error("Unrecognized file signature: {actual:02X?}")]
	BadMagic {
		/// The bytes that were found
		actual: [u8; 4],
	},

	/// A section required by the container is absent
	#[error("{file_type}: required section {section} is missing")]
	MissingSection {
		/// Format being parsed
		file_type: FileType,
		/// Section magic, e.g. `KMC`
		section: &'static str,
	},

	/// A fixed-offset read ran past the end of the buffer
	#[error("{file_type}: insufficient data, expected {expected} bytes, got {actual} bytes")]
	TruncatedMeta {
		/// Format being parsed
		file_type: FileType,
		/// Number of bytes required
		expected: usize,
		/// Number of bytes available
		actual: usize,
	},

	/// A frame, layer or track index is outside the valid range
	#[error("{file_type}: {what} index {index} out of range (count: {count})")]
	OutOfRange {
		/// Format being parsed
		file_type: FileType,
		/// Kind of index, e.g. "frame"
		what: &'static str,
		/// Requested index
		index: usize,
		/// Number of valid entries
		count: usize,
	},

	/// A frame or section pointer points outside the buffer
	#[error("{file_type}: malformed frame table: {message}")]
	MalformedFrameTable {
		/// Format being parsed
		file_type: FileType,
		/// Details
		message: String,
	},

	/// An encoding the decoder does not define was encountered
	#[error("{file_type}: unsupported variant: {message}")]
	UnsupportedVariant {
		/// Format being parsed
		file_type: FileType,
		/// Details
		message: String,
	},

	/// A signature public key could not be parsed
	#[error("Invalid public key: {0}")]
	InvalidKey(String),

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// WAV encoding error
	#[error(transparent)]
	Wav(#[from] hound::Error),
}

impl FlipnoteError {
	/// Shorthand for [`FlipnoteError::TruncatedMeta`]
	pub fn insufficient_data(file_type: FileType, expected: usize, actual: usize) -> Self {
		Self::TruncatedMeta {
			file_type,
			expected,
			actual,
		}
	}

	/// Shorthand for [`FlipnoteError::OutOfRange`]
	pub fn out_of_range(file_type: FileType, what: &'static str, index: usize, count: usize) -> Self {
		Self::OutOfRange {
			file_type,
			what,
			index,
			count,
		}
	}

	/// Shorthand for [`FlipnoteError::MalformedFrameTable`]
	pub fn malformed(file_type: FileType, message: impl Into<String>) -> Self {
		Self::MalformedFrameTable {
			file_type,
			message: message.into(),
		}
	}

	/// Shorthand for [`FlipnoteError::UnsupportedVariant`]
	pub fn unsupported(file_type: FileType, message: impl Into<String>) -> Self {
		Self::UnsupportedVariant {
			file_type,
			message: message.into(),
		}
	}
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FlipnoteError>;
