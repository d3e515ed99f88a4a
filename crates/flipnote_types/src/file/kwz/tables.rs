//! Line lookup tables for the KWZ tile codec.
//!
//! A line is a row of 8 pixels, each 0 (transparent), 1 or 2. The full table
//! holds all 3^8 combinations; the common table picks out 32 of them that are
//! addressable with a 5-bit code. Every table has a twin whose lines are
//! rotated left by one pixel.

/// A row of 8 pixels
pub(crate) type Line = [u8; 8];

/// Number of entries in the full line table
pub(crate) const LINE_COUNT: usize = 6561;

/// Indices into the full line table that make up the common line table
pub(crate) const COMMON_LINE_INDICES: [u16; 32] = [
	0x0000, 0x0CD0, 0x19A0, 0x02D9, 0x088B, 0x0051, 0x00F3, 0x0009, 0x001B, 0x0001, 0x0003, 0x05B2,
	0x1116, 0x00A2, 0x01E6, 0x0012, 0x0036, 0x0002, 0x0006, 0x0B64, 0x08DC, 0x1344, 0x0144, 0x0510,
	0x0DAC, 0x00C8, 0x1D80, 0x0370, 0x01A4, 0x09A0, 0x0672, 0x0264,
];

/// Expands a table index into its 8 pixels.
///
/// With base-3 digits `a..h` (most significant first) the pixels are laid out
/// as `b a d c f e h g`.
const fn line_from_index(index: usize) -> Line {
	let mut digits = [0u8; 8];
	let mut rest = index;
	let mut i = 8;
	while i > 0 {
		i -= 1;
		digits[i] = (rest % 3) as u8;
		rest /= 3;
	}
	let [a, b, c, d, e, f, g, h] = digits;
	[b, a, d, c, f, e, h, g]
}

const fn rotate_left(line: Line) -> Line {
	let [p0, p1, p2, p3, p4, p5, p6, p7] = line;
	[p1, p2, p3, p4, p5, p6, p7, p0]
}

const fn build_line_table(shifted: bool) -> [Line; LINE_COUNT] {
	let mut table = [[0u8; 8]; LINE_COUNT];
	let mut i = 0;
	while i < LINE_COUNT {
		let line = line_from_index(i);
		table[i] = if shifted {
			rotate_left(line)
		} else {
			line
		};
		i += 1;
	}
	table
}

const fn build_common_table(shifted: bool) -> [Line; 32] {
	let mut table = [[0u8; 8]; 32];
	let mut i = 0;
	while i < 32 {
		let line = line_from_index(COMMON_LINE_INDICES[i] as usize);
		table[i] = if shifted {
			rotate_left(line)
		} else {
			line
		};
		i += 1;
	}
	table
}

pub(crate) static LINE_TABLE: [Line; LINE_COUNT] = build_line_table(false);

pub(crate) static LINE_TABLE_SHIFTED: [Line; LINE_COUNT] = build_line_table(true);

pub(crate) static COMMON_LINE_TABLE: [Line; 32] = build_common_table(false);

pub(crate) static COMMON_LINE_TABLE_SHIFTED: [Line; 32] = build_common_table(true);

/// Row assignments for tile type 7: `false` takes the first line, `true` the
/// second
pub(crate) const TYPE7_PATTERNS: [[bool; 8]; 4] = {
	const A: bool = false;
	const B: bool = true;
	[
		[A, B, A, B, A, B, A, B],
		[A, A, B, A, A, B, A, A],
		[A, B, A, A, B, A, A, B],
		[A, B, B, A, B, B, A, B],
	]
};

/// Looks up a 13-bit full table index. Codes past the end of the table are
/// clamped to the last line.
#[inline]
pub(crate) fn line(index: u32, shifted: bool) -> &'static Line {
	let index = (index as usize).min(LINE_COUNT - 1);
	if shifted {
		&LINE_TABLE_SHIFTED[index]
	} else {
		&LINE_TABLE[index]
	}
}

/// Looks up a 5-bit common table index
#[inline]
pub(crate) fn common_line(index: u32, shifted: bool) -> &'static Line {
	let index = index as usize & 0x1F;
	if shifted {
		&COMMON_LINE_TABLE_SHIFTED[index]
	} else {
		&COMMON_LINE_TABLE[index]
	}
}
