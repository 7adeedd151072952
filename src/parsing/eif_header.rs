//! EIF file header parser.
//!
//! The file header is a fixed 548-byte structure at offset 0:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic (`.eif`) |
//! | 4 | 2 | version |
//! | 6 | 2 | flags |
//! | 8 | 8 | default memory |
//! | 16 | 8 | default cpus |
//! | 24 | 2 | reserved |
//! | 26 | 2 | section count |
//! | 28 | 32 x 8 | section offsets |
//! | 284 | 32 x 8 | section sizes |
//! | 540 | 4 | unused |
//! | 544 | 4 | crc32 |
//!
//! Only the first `section_count` offset/size entries describe sections.
//! The rest are padding: they are decoded so that later fields land at the
//! right place, and are otherwise ignored.

use super::bytes::BigEndianReader;
use crate::error::{EifError, Result};
use log::debug;

/// EIF magic: ASCII `.eif`.
pub const EIF_MAGIC: [u8; 4] = *b".eif";

/// Number of offset/size slots in the file header.
pub const MAX_SECTIONS: usize = 32;

/// Decoded EIF file header.
///
/// `section_offsets` and `section_sizes` keep the padded on-disk form so the
/// header can be re-encoded byte for byte. Use [`EifHeader::sections`] to
/// get just the declared entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EifHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub default_memory: u64,
    pub default_cpus: u64,
    pub reserved: u16,
    pub section_count: u16,
    pub section_offsets: [u64; MAX_SECTIONS],
    pub section_sizes: [u64; MAX_SECTIONS],
    pub unused: u32,
    /// Checksum of the whole file. Recorded, never verified.
    pub crc32: u32,
}

/// One declared section as listed in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    pub index: usize,
    pub offset: u64,
    /// Size as declared by the file header.
    pub size: u64,
}

impl EifHeader {
    /// Whether the magic reads `.eif`.
    pub fn has_valid_magic(&self) -> bool {
        self.magic == EIF_MAGIC
    }

    /// Whether the declared section count fits the fixed slot arrays.
    pub fn section_count_in_bounds(&self) -> bool {
        usize::from(self.section_count) <= MAX_SECTIONS
    }

    /// Fail with [`EifError::TooManySections`] if the count exceeds the slots.
    pub fn check_section_count(&self) -> Result<()> {
        if self.section_count_in_bounds() {
            Ok(())
        } else {
            Err(EifError::TooManySections {
                count: self.section_count,
                max: MAX_SECTIONS,
            })
        }
    }

    /// Caller-level structural checks that decoding deliberately skips.
    ///
    /// Rejects a magic other than `.eif` and a section count above
    /// [`MAX_SECTIONS`], in that order.
    pub fn validate(&self) -> Result<()> {
        if !self.has_valid_magic() {
            return Err(EifError::InvalidMagic { found: self.magic });
        }
        self.check_section_count()
    }

    /// Declared sections in header order.
    ///
    /// Yields at most [`MAX_SECTIONS`] entries even when the count is out of
    /// bounds.
    pub fn sections(&self) -> impl Iterator<Item = SectionEntry> + '_ {
        (0..self.declared_section_slots()).filter_map(|index| self.section(index))
    }

    /// The declared section at `index`, or `None` past the declared count.
    pub fn section(&self, index: usize) -> Option<SectionEntry> {
        if index >= self.declared_section_slots() {
            return None;
        }
        Some(SectionEntry {
            index,
            offset: self.section_offsets[index],
            size: self.section_sizes[index],
        })
    }

    fn declared_section_slots(&self) -> usize {
        usize::from(self.section_count).min(MAX_SECTIONS)
    }

    /// Encode back into the 548-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; EifHeaderParser::HEADER_SIZE] {
        let mut out = [0u8; EifHeaderParser::HEADER_SIZE];
        let mut pos = 0;
        let mut put = |bytes: &[u8]| {
            out[pos..pos + bytes.len()].copy_from_slice(bytes);
            pos += bytes.len();
        };

        put(&self.magic);
        put(&self.version.to_be_bytes());
        put(&self.flags.to_be_bytes());
        put(&self.default_memory.to_be_bytes());
        put(&self.default_cpus.to_be_bytes());
        put(&self.reserved.to_be_bytes());
        put(&self.section_count.to_be_bytes());
        for offset in &self.section_offsets {
            put(&offset.to_be_bytes());
        }
        for size in &self.section_sizes {
            put(&size.to_be_bytes());
        }
        put(&self.unused.to_be_bytes());
        put(&self.crc32.to_be_bytes());

        out
    }
}

pub struct EifHeaderParser;

impl EifHeaderParser {
    pub const HEADER_SIZE: usize = 548;

    /// Parse the file header from the start of `buffer`.
    ///
    /// Bytes beyond the first 548 are ignored. The magic and section count
    /// are recorded as read, not checked; see [`EifHeader::validate`].
    pub fn parse(buffer: &[u8]) -> Result<EifHeader> {
        if buffer.len() < Self::HEADER_SIZE {
            return Err(EifError::TruncatedInput {
                needed: Self::HEADER_SIZE,
                have: buffer.len(),
            });
        }

        let mut reader = BigEndianReader::new(&buffer[..Self::HEADER_SIZE]);
        let truncated = || EifError::TruncatedInput {
            needed: Self::HEADER_SIZE,
            have: buffer.len(),
        };

        let magic = reader.read_array().ok_or_else(truncated)?;
        let version = reader.read_u16_be().ok_or_else(truncated)?;
        let flags = reader.read_u16_be().ok_or_else(truncated)?;
        let default_memory = reader.read_u64_be().ok_or_else(truncated)?;
        let default_cpus = reader.read_u64_be().ok_or_else(truncated)?;
        let reserved = reader.read_u16_be().ok_or_else(truncated)?;
        let section_count = reader.read_u16_be().ok_or_else(truncated)?;
        let section_offsets = reader.read_u64_array_be().ok_or_else(truncated)?;
        let section_sizes = reader.read_u64_array_be().ok_or_else(truncated)?;
        let unused = reader.read_u32_be().ok_or_else(truncated)?;
        let crc32 = reader.read_u32_be().ok_or_else(truncated)?;

        debug_assert_eq!(reader.position(), Self::HEADER_SIZE);

        let header = EifHeader {
            magic,
            version,
            flags,
            default_memory,
            default_cpus,
            reserved,
            section_count,
            section_offsets,
            section_sizes,
            unused,
            crc32,
        };
        debug!(
            "EIF header: version {}, {} section(s), crc32 {:#010x}",
            header.version, header.section_count, header.crc32
        );
        Ok(header)
    }
}

/// Decode the fixed-size file header. See [`EifHeaderParser::parse`].
pub fn decode_header(bytes: &[u8]) -> Result<EifHeader> {
    EifHeaderParser::parse(bytes)
}
