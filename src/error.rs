//! Error types for EIF decoding and section walking.
//!
//! This module provides the [`EifError`] type which covers every fatal
//! condition that can occur while decoding an EIF header or visiting its
//! sections.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Truncation | [`TruncatedInput`], [`TruncatedSectionHeader`], [`TruncatedMetadata`] | Fewer bytes than the layout requires |
//! | Structure | [`TooManySections`], [`InvalidMagic`], [`SectionTooLarge`] | Header values the format cannot accept |
//! | I/O | [`SeekFailed`], [`Io`] | Byte source failures |
//!
//! A section size disagreement between the file header and the section
//! header is *not* an error; see [`SizeMismatch`](crate::SizeMismatch).
//!
//! [`walk_sections`](crate::walk_sections) and [`parse_eif`](crate::parse_eif)
//! wrap the `EifError` in [`WalkError`](crate::WalkError) and
//! [`ParseError`](crate::ParseError), which keep the results decoded before
//! the failure. Both convert back into `EifError` with `?`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eif_parse::{parse_eif, EifError, ParseOptions};
//!
//! let file = std::fs::File::open("enclave.eif")?;
//! match parse_eif(file, &ParseOptions::default()) {
//!     Ok(eif) => println!("{} sections", eif.sections.len()),
//!     Err(e) => match e.source {
//!         EifError::InvalidMagic { found } => eprintln!("Not an EIF file: {:02x?}", found),
//!         _ => eprintln!("Error after {} sections: {}", e.sections.len(), e),
//!     },
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! [`TruncatedInput`]: EifError::TruncatedInput
//! [`TruncatedSectionHeader`]: EifError::TruncatedSectionHeader
//! [`TruncatedMetadata`]: EifError::TruncatedMetadata
//! [`TooManySections`]: EifError::TooManySections
//! [`InvalidMagic`]: EifError::InvalidMagic
//! [`SectionTooLarge`]: EifError::SectionTooLarge
//! [`SeekFailed`]: EifError::SeekFailed
//! [`Io`]: EifError::Io

use std::io;
use thiserror::Error;

/// Error type for EIF operations.
///
/// Every variant is fatal for the parse that produced it. Malformed input
/// cannot self-correct, so nothing is retried.
#[derive(Debug, Error)]
pub enum EifError {
    /// Fewer bytes than the fixed 548-byte file header were available.
    #[error("Truncated EIF header: need {needed} bytes, have {have}")]
    TruncatedInput {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// Fewer than 12 bytes were available at a section's declared offset.
    #[error("Truncated section header: need {needed} bytes, have {have}")]
    TruncatedSectionHeader {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// The metadata payload ended before its declared size.
    #[error("Truncated metadata: expected {expected} bytes, read {actual}")]
    TruncatedMetadata {
        /// Size declared by the section header.
        expected: u64,
        /// Bytes actually read.
        actual: u64,
    },

    /// The byte source could not be positioned at a section offset.
    ///
    /// `actual` is the position the source reported, or `None` when the
    /// seek itself returned an error.
    #[error("Failed to seek to offset {requested}{}", display_landed(.actual))]
    SeekFailed {
        /// The requested absolute offset.
        requested: u64,
        /// Where the source ended up, if it reported a position.
        actual: Option<u64>,
    },

    /// The header declares more sections than the format allows.
    #[error("Too many sections: {count} declared, at most {max} allowed")]
    TooManySections {
        /// Declared section count.
        count: u16,
        /// Format maximum.
        max: usize,
    },

    /// The first four bytes are not `.eif`.
    ///
    /// Only raised by [`EifHeader::validate`](crate::EifHeader::validate);
    /// plain decoding records whatever magic was read.
    #[error("Invalid EIF magic: {found:02x?}")]
    InvalidMagic {
        /// The bytes actually read.
        found: [u8; 4],
    },

    /// A metadata section declares a size that cannot be held in memory.
    #[error("Section too large: {size} bytes")]
    SectionTooLarge {
        /// Declared section size.
        size: u64,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn display_landed(actual: &Option<u64>) -> String {
    match actual {
        Some(pos) => format!(" (landed at {})", pos),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, EifError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_failed_display() {
        let err = EifError::SeekFailed {
            requested: 4096,
            actual: Some(600),
        };
        assert_eq!(err.to_string(), "Failed to seek to offset 4096 (landed at 600)");

        let err = EifError::SeekFailed {
            requested: 4096,
            actual: None,
        };
        assert_eq!(err.to_string(), "Failed to seek to offset 4096");
    }

    #[test]
    fn test_io_source_is_preserved() {
        use std::error::Error as _;

        let err = EifError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(err.source().is_some());
    }
}
