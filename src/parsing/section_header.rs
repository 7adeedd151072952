//! Section header parser.
//!
//! Each section starts with a 12-byte header at the offset listed in the
//! file header: type (u16), flags (u16), size (u64), all big-endian. The
//! payload of `size` bytes follows immediately.

use super::bytes::BigEndianReader;
use crate::error::{EifError, Result};
use std::fmt;

/// Section type codes.
///
/// Values outside 0..=5 are kept as [`SectionType::Unknown`]; they are not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    Invalid,
    Kernel,
    Cmdline,
    Ramdisk,
    Signature,
    Metadata,
    Unknown(u16),
}

impl SectionType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Kernel => "kernel",
            Self::Cmdline => "cmdline",
            Self::Ramdisk => "ramdisk",
            Self::Signature => "signature",
            Self::Metadata => "metadata",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u16> for SectionType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Invalid,
            1 => Self::Kernel,
            2 => Self::Cmdline,
            3 => Self::Ramdisk,
            4 => Self::Signature,
            5 => Self::Metadata,
            other => Self::Unknown(other),
        }
    }
}

impl From<SectionType> for u16 {
    fn from(value: SectionType) -> Self {
        match value {
            SectionType::Invalid => 0,
            SectionType::Kernel => 1,
            SectionType::Cmdline => 2,
            SectionType::Ramdisk => 3,
            SectionType::Signature => 4,
            SectionType::Metadata => 5,
            SectionType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub section_type: SectionType,
    pub flags: u16,
    /// Payload length following this header.
    pub section_size: u64,
}

pub struct SectionHeaderParser;

impl SectionHeaderParser {
    pub const HEADER_SIZE: usize = 12;

    pub fn parse(buffer: &[u8]) -> Result<SectionHeader> {
        let truncated = || EifError::TruncatedSectionHeader {
            needed: Self::HEADER_SIZE,
            have: buffer.len(),
        };
        if buffer.len() < Self::HEADER_SIZE {
            return Err(truncated());
        }

        let mut reader = BigEndianReader::new(buffer);
        let section_type = reader.read_u16_be().ok_or_else(truncated)?;
        let flags = reader.read_u16_be().ok_or_else(truncated)?;
        let section_size = reader.read_u64_be().ok_or_else(truncated)?;

        Ok(SectionHeader {
            section_type: SectionType::from(section_type),
            flags,
            section_size,
        })
    }
}

/// Decode a 12-byte section header. See [`SectionHeaderParser::parse`].
pub fn decode_section_header(bytes: &[u8]) -> Result<SectionHeader> {
    SectionHeaderParser::parse(bytes)
}
