//! KWZ section table.

use std::fmt::Display;

use log::debug;

use crate::file::cursor::ByteCursor;
use crate::file::{FileType, FlipnoteError, Result};

use super::constants::{MAX_SECTIONS, SECTION_HEADER_SIZE, SIGNATURE_SIZE};

/// File header: authorship, timestamps and playback settings
pub const KFH: [u8; 3] = *b"KFH";
/// Thumbnail JPEG
pub const KTN: [u8; 3] = *b"KTN";
/// Frame data
pub const KMC: [u8; 3] = *b"KMC";
/// Frame records
pub const KMI: [u8; 3] = *b"KMI";
/// Sound header and track data
pub const KSN: [u8; 3] = *b"KSN";
/// Folder icon marker
pub const KIC: [u8; 3] = *b"KIC";

/// One entry of the section table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Section {
	/// First three bytes of the section magic
	pub magic: [u8; 3],
	/// Offset of the section header
	pub offset: usize,
	/// Payload length, excluding the 8-byte header
	pub length: usize,
}

impl Section {
	/// Offset one past the last payload byte
	pub fn end(&self) -> usize {
		self.offset + SECTION_HEADER_SIZE + self.length
	}

	/// Section magic as text
	pub fn name(&self) -> String {
		self.magic.iter().map(|&b| b as char).collect()
	}
}

impl Display for Section {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} @ 0x{:08X} ({} bytes)", self.name(), self.offset, self.length)
	}
}

/// Sections found while scanning a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
	sections: Vec<Section>,
	end: usize,
}

impl SectionMap {
	/// Walks the section headers from the start of the buffer.
	///
	/// Scanning stops after [`MAX_SECTIONS`] sections or when the signature
	/// block at the end of the file is reached. `KMC` and `KMI` are required.
	pub fn scan(data: &[u8]) -> Result<Self> {
		let mut cursor = ByteCursor::new(data, FileType::Kwz);
		let limit = data.len().saturating_sub(SIGNATURE_SIZE);
		let mut sections = Vec::with_capacity(MAX_SECTIONS);
		let mut offset = 0usize;

		while offset < limit && sections.len() < MAX_SECTIONS {
			cursor.seek(offset)?;
			let raw = cursor.read_bytes(4)?;
			let magic = [raw[0], raw[1], raw[2]];
			let length = cursor.read_u32()? as usize;
			let section = Section {
				magic,
				offset,
				length,
			};
			if section.end() > data.len() {
				return Err(FlipnoteError::malformed(
					FileType::Kwz,
					format!("section {section} runs past end of file ({} bytes)", data.len()),
				));
			}
			debug!("KWZ section {section}");
			sections.push(section);
			offset = section.end();
		}

		let map = Self {
			sections,
			end: offset,
		};
		for (magic, name) in [(KMC, "KMC"), (KMI, "KMI")] {
			if !map.contains(magic) {
				return Err(FlipnoteError::MissingSection {
					file_type: FileType::Kwz,
					section: name,
				});
			}
		}
		Ok(map)
	}

	/// Looks up a section by magic
	pub fn get(&self, magic: [u8; 3]) -> Option<&Section> {
		self.sections.iter().find(|s| s.magic == magic)
	}

	/// Returns true if the section was found
	pub fn contains(&self, magic: [u8; 3]) -> bool {
		self.get(magic).is_some()
	}

	/// Looks up a section that must be present
	pub(crate) fn require(&self, magic: [u8; 3], name: &'static str) -> Result<&Section> {
		self.get(magic).ok_or(FlipnoteError::MissingSection {
			file_type: FileType::Kwz,
			section: name,
		})
	}

	/// Sections in file order
	pub fn iter(&self) -> impl Iterator<Item = &Section> {
		self.sections.iter()
	}

	/// Number of sections
	pub fn len(&self) -> usize {
		self.sections.len()
	}

	/// Returns true if no section was found
	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	/// Offset where scanning stopped. The signature starts here.
	pub fn end(&self) -> usize {
		self.end
	}
}
