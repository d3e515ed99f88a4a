//! Colour types and the fixed global palettes of both formats.

use std::fmt;

use serde::Serialize;

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
	/// Red component (0-255)
	pub r: u8,
	/// Green component (0-255)
	pub g: u8,
	/// Blue component (0-255)
	pub b: u8,
	/// Alpha component (0-255)
	pub a: u8,
}

impl Color {
	/// Creates a new RGBA color.
	pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
		Self {
			r,
			g,
			b,
			a,
		}
	}

	/// Creates a new RGB color with full opacity.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self::new(r, g, b, 255)
	}

	/// Creates an opaque color from a `0xRRGGBB` value.
	pub const fn from_rgb24(rgb: u32) -> Self {
		Self::rgb(((rgb >> 16) & 0xFF) as u8, ((rgb >> 8) & 0xFF) as u8, (rgb & 0xFF) as u8)
	}

	/// Returns the components as `[r, g, b, a]`.
	pub const fn to_array(&self) -> [u8; 4] {
		[self.r, self.g, self.b, self.a]
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
	}
}

/// Global PPM palette: white, black, red, blue
pub mod ppm {
	use super::Color;

	/// Paper or pen white
	pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
	/// Paper or pen black
	pub const BLACK: Color = Color::rgb(0x0E, 0x0E, 0x0E);
	/// Red pen
	pub const RED: Color = Color::rgb(0xFF, 0x2A, 0x2A);
	/// Blue pen
	pub const BLUE: Color = Color::rgb(0x0A, 0x39, 0xFF);

	/// Indexed by the values returned from `frame_palette_indices`
	pub const GLOBAL: [Color; 4] = [WHITE, BLACK, RED, BLUE];

	/// Fixed palette of the 64x48 thumbnail bitmap
	pub const THUMBNAIL: [Color; 16] = [
		Color::from_rgb24(0xFFFFFF),
		Color::from_rgb24(0x525252),
		Color::from_rgb24(0xFFFFFF),
		Color::from_rgb24(0x9C9C9C),
		Color::from_rgb24(0xFF4844),
		Color::from_rgb24(0xC8514F),
		Color::from_rgb24(0xFFADAC),
		Color::from_rgb24(0x00FF00),
		Color::from_rgb24(0x4840FF),
		Color::from_rgb24(0x514FB8),
		Color::from_rgb24(0xADABFF),
		Color::from_rgb24(0x00FF00),
		Color::from_rgb24(0xB657B7),
		Color::from_rgb24(0x00FF00),
		Color::from_rgb24(0x00FF00),
		Color::from_rgb24(0x00FF00),
	];
}

/// Global KWZ palette
pub mod kwz {
	use super::Color;

	/// White
	pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
	/// Black
	pub const BLACK: Color = Color::rgb(0x10, 0x10, 0x10);
	/// Red
	pub const RED: Color = Color::rgb(0xFF, 0x10, 0x10);
	/// Yellow
	pub const YELLOW: Color = Color::rgb(0xFF, 0xE7, 0x00);
	/// Green
	pub const GREEN: Color = Color::rgb(0x00, 0x86, 0x31);
	/// Blue
	pub const BLUE: Color = Color::rgb(0x00, 0x38, 0xCE);
	/// "None": transparent white
	pub const NONE: Color = Color::new(0xFF, 0xFF, 0xFF, 0x00);

	/// Indexed by the 4-bit palette nibbles of a frame's flags word
	pub const GLOBAL: [Color; 7] = [WHITE, BLACK, RED, YELLOW, GREEN, BLUE, NONE];
}

/// Maps a global palette index to a colour, falling back to the last entry
/// (transparent for KWZ) for out-of-range nibbles.
pub(crate) fn lookup(global: &[Color], index: u8) -> Color {
	global.get(index as usize).or(global.last()).copied().unwrap_or(Color::new(0, 0, 0, 0))
}
