//! SectionWalker - visits every declared section of an EIF file.
//!
//! Sections are visited in header declaration order, not sorted by offset.
//! Offsets may go backwards or overlap; each one is seeked to directly.
//!
//! For every section the walker:
//! 1. seeks to the declared offset,
//! 2. reads and decodes the 12-byte section header,
//! 3. compares the file header's size with the section header's size,
//!    warning on a mismatch without stopping,
//! 4. captures the payload of the first metadata section.
//!
//! Only one metadata payload is ever kept. Later metadata sections are
//! still decoded and reported, but their payload is not read.

use crate::byte_source::ByteSource;
use crate::error::{EifError, Result};
use crate::parsing::{EifHeader, SectionEntry, SectionHeader, SectionHeaderParser, SectionType};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::ffi::CStr;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use thiserror::Error;

/// One visited section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Position in the file header's section list.
    pub index: usize,
    /// Absolute offset of the section header.
    pub offset: u64,
    pub section_type: SectionType,
    pub flags: u16,
    /// Size listed in the file header.
    pub declared_size: u64,
    /// Size listed in the section's own header. Payload reads use this one.
    pub header_size: u64,
    pub size_mismatch: bool,
}

impl SectionDescriptor {
    /// Absolute offset of the first payload byte.
    pub fn payload_offset(&self) -> u64 {
        self.offset
            .saturating_add(SectionHeaderParser::HEADER_SIZE as u64)
    }

    /// The size disagreement for this section, if any.
    pub fn mismatch(&self) -> Option<SizeMismatch> {
        self.size_mismatch.then_some(SizeMismatch {
            index: self.index,
            declared: self.declared_size,
            actual: self.header_size,
        })
    }
}

/// Non-fatal warning: the file header and the section header disagree on a
/// section's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub index: usize,
    /// Size from the file header.
    pub declared: u64,
    /// Size from the section header.
    pub actual: u64,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "section {} size mismatch between header and section header: header {}, section header {}",
            self.index, self.declared, self.actual
        )
    }
}

/// Captured metadata section payload.
///
/// Stored with a trailing NUL so it can be handed out as a C string. The
/// content itself is expected to be JSON text but is neither parsed nor
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPayload {
    bytes: Vec<u8>,
}

impl MetadataPayload {
    pub(crate) fn new(mut bytes: Vec<u8>) -> Self {
        bytes.push(0);
        Self { bytes }
    }

    /// Payload bytes, without the trailing NUL.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload up to its first NUL byte.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.bytes).unwrap_or_default()
    }

    pub fn to_str(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes, without the trailing NUL.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.pop();
        self.bytes
    }
}

/// Result of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionWalk {
    /// One descriptor per declared section, in header order.
    pub sections: Vec<SectionDescriptor>,
    /// Payload of the first metadata section, if any.
    pub metadata: Option<MetadataPayload>,
}

impl SectionWalk {
    pub fn size_mismatches(&self) -> impl Iterator<Item = SizeMismatch> + '_ {
        self.sections.iter().filter_map(SectionDescriptor::mismatch)
    }
}

/// A walk that stopped on a fatal error.
///
/// Keeps the descriptors produced before the failure so callers can still
/// report them.
#[derive(Debug, Error)]
#[error("Section walk stopped at section {index}: {source}")]
pub struct WalkError {
    /// Index of the section being visited when the walk stopped.
    pub index: usize,
    /// Sections fully visited before the failure.
    pub sections: Vec<SectionDescriptor>,
    #[source]
    pub source: EifError,
}

impl From<WalkError> for EifError {
    fn from(err: WalkError) -> Self {
        err.source
    }
}

/// State carried from one section to the next.
///
/// Shared by the blocking and async walkers so both follow the same rules.
#[derive(Debug)]
pub(crate) struct WalkState {
    capture_metadata: bool,
    metadata: Option<MetadataPayload>,
}

impl WalkState {
    pub(crate) fn new(capture_metadata: bool) -> Self {
        Self {
            capture_metadata,
            metadata: None,
        }
    }

    /// Build the descriptor for a decoded section header.
    pub(crate) fn describe(entry: SectionEntry, header: &SectionHeader) -> SectionDescriptor {
        let size_mismatch = entry.size != header.section_size;
        debug!(
            "section {} at offset {}: type {}, flags {:#06x}, size {}",
            entry.index, entry.offset, header.section_type, header.flags, header.section_size
        );

        let descriptor = SectionDescriptor {
            index: entry.index,
            offset: entry.offset,
            section_type: header.section_type,
            flags: header.flags,
            declared_size: entry.size,
            header_size: header.section_size,
            size_mismatch,
        };
        if let Some(mismatch) = descriptor.mismatch() {
            warn!("{}", mismatch);
        }
        descriptor
    }

    /// Number of payload bytes to capture after this section header, if any.
    ///
    /// First metadata section wins.
    pub(crate) fn metadata_len(
        &self,
        entry: SectionEntry,
        header: &SectionHeader,
    ) -> Result<Option<u64>> {
        if header.section_type != SectionType::Metadata || !self.capture_metadata {
            return Ok(None);
        }
        if self.metadata.is_some() {
            info!(
                "section {}: metadata already captured, skipping payload",
                entry.index
            );
            return Ok(None);
        }
        if usize::try_from(header.section_size).is_err() {
            return Err(EifError::SectionTooLarge {
                size: header.section_size,
            });
        }
        Ok(Some(header.section_size))
    }

    pub(crate) fn capture(
        &mut self,
        entry: SectionEntry,
        expected: u64,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let actual = bytes.len() as u64;
        if actual != expected {
            return Err(EifError::TruncatedMetadata { expected, actual });
        }
        info!(
            "section {}: captured {} bytes of metadata",
            entry.index, actual
        );
        self.metadata = Some(MetadataPayload::new(bytes));
        Ok(())
    }

    pub(crate) fn metadata(&self) -> Option<&MetadataPayload> {
        self.metadata.as_ref()
    }

    pub(crate) fn into_metadata(self) -> Option<MetadataPayload> {
        self.metadata
    }
}

/// Turn the outcome of a seek into a walk result.
pub(crate) fn check_seek(requested: u64, landed: io::Result<u64>) -> Result<()> {
    match landed {
        Ok(actual) if actual == requested => Ok(()),
        Ok(actual) => Err(EifError::SeekFailed {
            requested,
            actual: Some(actual),
        }),
        Err(e) => {
            debug!("seek to {} failed: {}", requested, e);
            Err(EifError::SeekFailed {
                requested,
                actual: None,
            })
        }
    }
}

/// Lazy section walker.
///
/// Yields one descriptor per declared section. After the first error the
/// walker is exhausted and touches the source no further.
pub struct SectionWalker<'a, S: ?Sized> {
    header: &'a EifHeader,
    source: &'a mut S,
    state: WalkState,
    next_index: usize,
    failed: bool,
}

impl<'a, S: ByteSource + ?Sized> SectionWalker<'a, S> {
    /// Create a walker that captures the first metadata payload.
    ///
    /// Fails with [`EifError::TooManySections`] before touching the source
    /// if the header declares more than 32 sections.
    pub fn new(header: &'a EifHeader, source: &'a mut S) -> Result<Self> {
        Self::with_metadata_capture(header, source, true)
    }

    pub fn with_metadata_capture(
        header: &'a EifHeader,
        source: &'a mut S,
        capture_metadata: bool,
    ) -> Result<Self> {
        header.check_section_count()?;
        Ok(Self {
            header,
            source,
            state: WalkState::new(capture_metadata),
            next_index: 0,
            failed: false,
        })
    }

    /// Metadata captured so far.
    pub fn metadata(&self) -> Option<&MetadataPayload> {
        self.state.metadata()
    }

    pub fn into_metadata(self) -> Option<MetadataPayload> {
        self.state.into_metadata()
    }

    fn visit(&mut self, entry: SectionEntry) -> Result<SectionDescriptor> {
        let landed = ByteSource::seek_to(&mut *self.source, entry.offset);
        check_seek(entry.offset, landed)?;

        let raw =
            ByteSource::read_up_to(&mut *self.source, SectionHeaderParser::HEADER_SIZE as u64)?;
        let section_header = SectionHeaderParser::parse(&raw)?;
        let descriptor = WalkState::describe(entry, &section_header);

        if let Some(len) = self.state.metadata_len(entry, &section_header)? {
            let payload = ByteSource::read_up_to(&mut *self.source, len)?;
            self.state.capture(entry, len, payload)?;
        }

        Ok(descriptor)
    }
}

impl<S: ByteSource + ?Sized> Iterator for SectionWalker<'_, S> {
    type Item = Result<SectionDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let entry = self.header.section(self.next_index)?;
        self.next_index += 1;

        let result = self.visit(entry);
        self.failed = result.is_err();
        Some(result)
    }
}

/// Visit every declared section and capture the first metadata payload.
pub fn walk_sections<S: ByteSource + ?Sized>(
    header: &EifHeader,
    source: &mut S,
) -> std::result::Result<SectionWalk, WalkError> {
    walk_sections_with(header, source, true)
}

pub(crate) fn walk_sections_with<S: ByteSource + ?Sized>(
    header: &EifHeader,
    source: &mut S,
    capture_metadata: bool,
) -> std::result::Result<SectionWalk, WalkError> {
    let mut walker = SectionWalker::with_metadata_capture(header, source, capture_metadata)
        .map_err(|err| WalkError {
            index: 0,
            sections: Vec::new(),
            source: err,
        })?;

    let mut sections = Vec::with_capacity(usize::from(header.section_count));
    for result in walker.by_ref() {
        match result {
            Ok(descriptor) => sections.push(descriptor),
            Err(err) => {
                return Err(WalkError {
                    index: sections.len(),
                    sections,
                    source: err,
                })
            }
        }
    }

    Ok(SectionWalk {
        sections,
        metadata: walker.into_metadata(),
    })
}
