//! Synthetic Flipnote Studio notes.
//!
//! [`PpmBuilder`] writes the fixed header, the thumbnail, the frame table and
//! the sound block. Frames are given as the images they should decode to;
//! for frames that are not keyframes the builder stores the XOR against the
//! previous image, shifted by the frame's translation.

/// Layer width in pixels
pub const WIDTH: usize = 256;
/// Layer height in pixels
pub const HEIGHT: usize = 192;
/// Size of the trailing signature
pub const SIGNATURE_SIZE: usize = 128;
/// Offset of the frame data block
pub const FRAME_DATA_OFFSET: usize = 0x6A0;
/// Size of the thumbnail bitmap
pub const THUMBNAIL_SIZE: usize = 0x600;

/// A 256x192 plane with one byte per pixel, values 0 or 1
pub type Plane = Vec<u8>;

/// Returns an empty plane
pub fn blank_plane() -> Plane {
	vec![0; WIDTH * HEIGHT]
}

/// Raw current FSID used when none is given; reads as `5F1A2B304D5E6F70`
pub const DEFAULT_FSID: [u8; 8] = [0x70, 0x6F, 0x5E, 0x4D, 0x30, 0x2B, 0x1A, 0x5F];

/// One frame to encode
#[derive(Debug, Clone)]
pub struct PpmFrame {
	/// Layer 1 and layer 2 images as they should decode
	pub layers: [Plane; 2],
	/// Stored without reference to the previous frame
	pub keyframe: bool,
	/// White paper when true, black otherwise
	pub paper_white: bool,
	/// Pen of each layer: 0 or 1 inverse of the paper, 2 red, 3 blue
	pub pens: [u8; 2],
	/// Horizontal and vertical shift of the previous frame
	pub translate: Option<(i8, i8)>,
	/// Sound effect flags (bits 0..2)
	pub sound_flags: u8,
}

impl PpmFrame {
	/// A blank white keyframe with red and blue pens
	pub fn blank() -> Self {
		Self {
			layers: [blank_plane(), blank_plane()],
			keyframe: true,
			paper_white: true,
			pens: [2, 3],
			translate: None,
			sound_flags: 0,
		}
	}

	fn header(&self) -> u8 {
		let mut header = u8::from(self.paper_white);
		header |= (self.pens[0] & 3) << 1;
		header |= (self.pens[1] & 3) << 3;
		if self.translate.is_some() {
			header |= 0x20;
		}
		if self.keyframe {
			header |= 0x80;
		}
		header
	}
}

/// Packs 8 pixels, first pixel in the lowest bit
fn pack_chunk(pixels: &[u8]) -> u8 {
	pixels.iter().enumerate().fold(0, |byte, (i, &p)| byte | (p & 1) << i)
}

/// Encodes one line, choosing the cheapest of the four line types
fn encode_line(line: &[u8], out: &mut Vec<u8>) -> u8 {
	let chunks: Vec<u8> = line.chunks(8).map(pack_chunk).collect();
	if chunks.iter().all(|&c| c == 0) {
		return 0;
	}
	let set = chunks.iter().filter(|&&c| c != 0).count();
	let unset = chunks.iter().filter(|&&c| c != 0xFF).count();
	if 4 + set.min(unset) >= chunks.len() {
		out.extend_from_slice(&chunks);
		return 3;
	}

	let (kind, blank) = if set <= unset { (1, 0x00) } else { (2, 0xFF) };
	let mask = chunks
		.iter()
		.enumerate()
		.filter(|&(_, &c)| c != blank)
		.fold(0u32, |mask, (i, _)| mask | 1 << (31 - i));
	out.extend_from_slice(&mask.to_be_bytes());
	out.extend(chunks.iter().filter(|&&c| c != blank));
	kind
}

/// Encodes a layer into its 48-byte line type table and line data
pub fn encode_layer(plane: &[u8]) -> ([u8; 48], Vec<u8>) {
	let mut table = [0u8; 48];
	let mut data = Vec::new();
	for (y, line) in plane.chunks(WIDTH).enumerate() {
		let kind = encode_line(line, &mut data);
		table[y / 4] |= kind << ((y % 4) * 2);
	}
	(table, data)
}

/// Stored plane for a frame that diffs against `previous`
pub fn diff_plane(plane: &[u8], previous: &[u8], (tx, ty): (i8, i8)) -> Plane {
	let mut stored = plane.to_vec();
	for y in 0..HEIGHT as isize {
		let sy = y - isize::from(ty);
		if !(0..HEIGHT as isize).contains(&sy) {
			continue;
		}
		for x in 0..WIDTH as isize {
			let sx = x - isize::from(tx);
			if !(0..WIDTH as isize).contains(&sx) {
				continue;
			}
			stored[(y as usize) * WIDTH + x as usize] ^= previous[sy as usize * WIDTH + sx as usize];
		}
	}
	stored
}

/// Assembles a PPM file
#[derive(Debug, Clone)]
pub struct PpmBuilder {
	/// Frames in order
	pub frames: Vec<PpmFrame>,
	/// Frame speed (1 to 8)
	pub frame_speed: u8,
	/// Frame speed during background music recording
	pub bgm_speed: u8,
	/// Lock flag
	pub lock: bool,
	/// Loop flag
	pub loop_playback: bool,
	/// Hidden layers
	pub hidden: [bool; 2],
	/// Thumbnail frame index
	pub thumb_index: u16,
	/// Root, parent and current author names
	pub names: [String; 3],
	/// Raw root, parent and current FSIDs (stored byte order)
	pub fsids: [[u8; 8]; 3],
	/// Parent and current filenames (18-byte structures)
	pub filenames: [[u8; 18]; 2],
	/// Root filename fragment
	pub root_fragment: [u8; 8],
	/// Modification time in Nintendo epoch seconds
	pub modified: u32,
	/// Thumbnail bitmap, 64x48 at 4 bits per pixel in 8x8 tiles
	pub thumbnail: Vec<u8>,
	/// ADPCM tracks: BGM, SE1, SE2, SE3
	pub tracks: [Vec<u8>; 4],
}

impl Default for PpmBuilder {
	fn default() -> Self {
		let mut filename = [0u8; 18];
		filename[..3].copy_from_slice(&[0xF7, 0x8D, 0x4E]);
		filename[3..16].copy_from_slice(b"0123456789ABC");
		filename[16..].copy_from_slice(&3u16.to_le_bytes());
		Self {
			frames: Vec::new(),
			frame_speed: 6,
			bgm_speed: 6,
			lock: false,
			loop_playback: true,
			hidden: [false; 2],
			thumb_index: 0,
			names: ["root".into(), "parent".into(), "current".into()],
			fsids: [DEFAULT_FSID; 3],
			filenames: [filename; 2],
			root_fragment: [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0],
			modified: 0x1000_0000,
			thumbnail: vec![0; THUMBNAIL_SIZE],
			tracks: Default::default(),
		}
	}
}

fn put(out: &mut [u8], offset: usize, bytes: &[u8]) {
	out[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn align4(value: usize) -> usize {
	(value + 3) & !3
}

impl PpmBuilder {
	/// A builder with default metadata and the given frames
	pub fn with_frames(frames: Vec<PpmFrame>) -> Self {
		Self {
			frames,
			..Self::default()
		}
	}

	fn encode_frames(&self) -> (Vec<u32>, Vec<u8>) {
		let mut offsets = Vec::with_capacity(self.frames.len());
		let mut data = Vec::new();
		let blank = [blank_plane(), blank_plane()];
		let mut previous = &blank;
		for frame in &self.frames {
			offsets.push(data.len() as u32);
			data.push(frame.header());
			let shift = frame.translate.unwrap_or((0, 0));
			if let Some((tx, ty)) = frame.translate {
				data.extend_from_slice(&[tx as u8, ty as u8]);
			}
			let mut tables = Vec::with_capacity(96);
			let mut lines = Vec::new();
			for (layer, plane) in frame.layers.iter().enumerate() {
				let stored = if frame.keyframe {
					plane.clone()
				} else {
					diff_plane(plane, &previous[layer], shift)
				};
				let (table, line_data) = encode_layer(&stored);
				tables.extend_from_slice(&table);
				lines.extend_from_slice(&line_data);
			}
			data.extend_from_slice(&tables);
			data.extend_from_slice(&lines);
			previous = &frame.layers;
		}
		(offsets, data)
	}

	/// Everything before the signature
	pub fn body(&self) -> Vec<u8> {
		let frame_count = self.frames.len();
		let (offsets, frame_data) = self.encode_frames();
		let table_len = offsets.len() * 4;
		let frame_data_len = 8 + table_len + frame_data.len();
		let sound_data_len: usize = self.tracks.iter().map(Vec::len).sum();
		let sound_header = align4(FRAME_DATA_OFFSET + frame_data_len + frame_count);

		let mut out = vec![0u8; sound_header + 32];
		put(&mut out, 0, b"PARA");
		put(&mut out, 0x04, &(frame_data_len as u32).to_le_bytes());
		put(&mut out, 0x08, &(sound_data_len as u32).to_le_bytes());
		put(&mut out, 0x0C, &(frame_count.saturating_sub(1) as u16).to_le_bytes());
		put(&mut out, 0x0E, &0x24u16.to_le_bytes());
		put(&mut out, 0x10, &u16::from(self.lock).to_le_bytes());
		put(&mut out, 0x12, &self.thumb_index.to_le_bytes());
		for (i, name) in self.names.iter().enumerate() {
			let units: Vec<u8> = name.encode_utf16().take(11).flat_map(u16::to_le_bytes).collect();
			put(&mut out, 0x14 + i * 22, &units);
		}
		let [root, parent, current] = &self.fsids;
		put(&mut out, 0x56, parent);
		put(&mut out, 0x5E, current);
		put(&mut out, 0x66, &self.filenames[0]);
		put(&mut out, 0x78, &self.filenames[1]);
		put(&mut out, 0x8A, root);
		put(&mut out, 0x92, &self.root_fragment);
		put(&mut out, 0x9A, &self.modified.to_le_bytes());
		let thumb_len = self.thumbnail.len().min(THUMBNAIL_SIZE);
		put(&mut out, 0xA0, &self.thumbnail[..thumb_len]);

		put(&mut out, FRAME_DATA_OFFSET, &(table_len as u16).to_le_bytes());
		let flags = u16::from(self.loop_playback) << 1
			| u16::from(self.hidden[0]) << 4
			| u16::from(self.hidden[1]) << 5;
		put(&mut out, 0x6A6, &flags.to_le_bytes());
		for (i, offset) in offsets.iter().enumerate() {
			put(&mut out, 0x6A8 + i * 4, &offset.to_le_bytes());
		}
		put(&mut out, 0x6A8 + table_len, &frame_data);
		for (i, frame) in self.frames.iter().enumerate() {
			out[FRAME_DATA_OFFSET + frame_data_len + i] = frame.sound_flags & 0x7;
		}

		for (i, track) in self.tracks.iter().enumerate() {
			put(&mut out, sound_header + i * 4, &(track.len() as u32).to_le_bytes());
		}
		out[sound_header + 16] = 8u8.saturating_sub(self.frame_speed);
		out[sound_header + 17] = 8u8.saturating_sub(self.bgm_speed);
		for track in &self.tracks {
			out.extend_from_slice(track);
		}
		out
	}

	/// Builds the file with a zeroed signature
	pub fn build(&self) -> Vec<u8> {
		self.build_signed(|_| vec![0; SIGNATURE_SIZE])
	}

	/// Builds the file, signing the body with `sign`.
	///
	/// The signature is padded or truncated to 128 bytes and followed by the
	/// 16 bytes of padding real files end with.
	pub fn build_signed(&self, sign: impl FnOnce(&[u8]) -> Vec<u8>) -> Vec<u8> {
		let mut out = self.body();
		let mut signature = sign(&out);
		signature.resize(SIGNATURE_SIZE, 0);
		out.extend_from_slice(&signature);
		out.extend_from_slice(&[0; 16]);
		out
	}
}

/// A plane with a filled rectangle
pub fn rectangle(x: usize, y: usize, width: usize, height: usize) -> Plane {
	let mut plane = blank_plane();
	for row in y..(y + height).min(HEIGHT) {
		for col in x..(x + width).min(WIDTH) {
			plane[row * WIDTH + col] = 1;
		}
	}
	plane
}

/// A plane with sparse noise, so every line type shows up
pub fn noise(rng: &mut crate::XorShift) -> Plane {
	let mut plane = blank_plane();
	for (y, line) in plane.chunks_mut(WIDTH).enumerate() {
		match y % 4 {
			0 => {}
			1 => line.iter_mut().for_each(|p| *p = u8::from(rng.below(16) == 0)),
			2 => line.iter_mut().for_each(|p| *p = u8::from(rng.below(16) != 0)),
			_ => line.iter_mut().for_each(|p| *p = rng.below(2) as u8),
		}
	}
	plane
}

/// A keyframe followed by frames that move two rectangles around, some of
/// them using a translated diff
pub fn animated_note(frame_count: usize, seed: u32) -> PpmBuilder {
	let mut rng = crate::XorShift::new(seed);
	let mut frames = Vec::with_capacity(frame_count);
	for index in 0..frame_count {
		let mut frame = PpmFrame::blank();
		frame.keyframe = index % 16 == 0;
		if !frame.keyframe && index % 3 == 0 {
			frame.translate = Some((rng.below(9) as i8 - 4, rng.below(9) as i8 - 4));
		}
		let step = index * 3;
		frame.layers[0] = rectangle(step % WIDTH, 40, 32, 24);
		frame.layers[1] = rectangle(100, (step * 2) % HEIGHT, 48, 48);
		if index % 7 == 0 {
			frame.layers[1] = noise(&mut rng);
		}
		frame.sound_flags = (index % 8) as u8;
		frames.push(frame);
	}
	PpmBuilder::with_frames(frames)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_line_types() {
		let mut out = Vec::new();
		assert_eq!(encode_line(&[0; WIDTH], &mut out), 0);
		assert!(out.is_empty());

		let mut line = [0u8; WIDTH];
		line[9] = 1;
		assert_eq!(encode_line(&line, &mut out), 1);
		assert_eq!(out, vec![0x40, 0, 0, 0, 0b10]);

		out.clear();
		let mut line = [1u8; WIDTH];
		line[0] = 0;
		assert_eq!(encode_line(&line, &mut out), 2);
		assert_eq!(out, vec![0x80, 0, 0, 0, 0xFE]);
	}

	#[test]
	fn test_diff_plane_is_xor() {
		let previous = rectangle(0, 0, 8, 8);
		let stored = diff_plane(&previous, &previous, (0, 0));
		assert!(stored.iter().all(|&p| p == 0));
		let moved = diff_plane(&previous, &previous, (1, 0));
		assert_eq!(moved[0], 1);
		assert_eq!(moved[8], 1);
	}

	#[test]
	fn test_layout() {
		let data = PpmBuilder::with_frames(vec![PpmFrame::blank()]).build();
		assert_eq!(&data[0..4], b"PARA");
		assert_eq!(u16::from_le_bytes([data[0x6A0], data[0x6A1]]), 4);
		assert_eq!(data[0x6AC], 0x80 | 0x01 | 2 << 1 | 3 << 3);
		assert_eq!(data.len() % 4, 0);
	}
}
