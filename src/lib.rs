//! EIF enclave image decoding and validation.
//!
//! An EIF file is a fixed 548-byte header followed by up to 32 sections
//! (kernel, command line, ramdisk, signature, metadata), each located by an
//! offset/size pair in the header and introduced by its own 12-byte section
//! header. All integers are big-endian.
//!
//! This crate decodes the header, walks the declared sections, cross-checks
//! the two independent size fields of every section, and captures the first
//! metadata payload. It never writes EIF files and never verifies the CRC32
//! or the signature.
//!
//! ## Features
//! - `cli` - the `eif-parse` command line tool
//! - `async` - section walking over tokio byte sources
//!
//! ## Example
//!
//! ```rust,no_run
//! use eif_parse::{parse_eif, ParseOptions};
//!
//! let file = std::io::BufReader::new(std::fs::File::open("enclave.eif")?);
//! let eif = parse_eif(file, &ParseOptions::default())?;
//! for mismatch in eif.size_mismatches() {
//!     eprintln!("Warning: {}", mismatch);
//! }
//! print!("{}", eif.report());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod byte_source;
pub mod error;
mod parser;
pub mod parsing;
mod report;
mod walker;

#[cfg(feature = "async")]
mod async_walker;

#[cfg(test)]
mod fixtures;

pub use byte_source::ByteSource;
pub use error::{EifError, Result};
pub use parser::{parse_eif, read_header, ParseError, ParseOptions, ParsedEif};
pub use parsing::{
    decode_header, decode_section_header, EifHeader, SectionEntry, SectionHeader, SectionType,
    EIF_MAGIC, MAX_SECTIONS,
};
pub use report::{
    HeaderBlock, MetadataBlock, Report, SectionBlock, SECTIONS_BEGIN, SECTIONS_END,
};
pub use walker::{
    walk_sections, MetadataPayload, SectionDescriptor, SectionWalk, SectionWalker, SizeMismatch,
    WalkError,
};

#[cfg(feature = "async")]
pub use async_walker::{parse_eif_async, read_header_async, walk_sections_async};
#[cfg(feature = "async")]
pub use byte_source::AsyncByteSource;
