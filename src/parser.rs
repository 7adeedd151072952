//! End-to-end EIF parsing: header, validation, section walk.

use crate::byte_source::ByteSource;
use crate::error::{EifError, Result};
use crate::parsing::{decode_header, EifHeader, EifHeaderParser};
use crate::report::Report;
use crate::walker::{
    check_seek, walk_sections_with, MetadataPayload, SectionDescriptor, SectionWalk, SizeMismatch,
    WalkError,
};
use log::debug;
use thiserror::Error;

/// Options for [`parse_eif`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject files whose magic is not `.eif`.
    pub require_magic: bool,
    /// Read the payload of the first metadata section.
    pub capture_metadata: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            require_magic: true,
            capture_metadata: true,
        }
    }
}

impl ParseOptions {
    /// Run the header checks these options ask for.
    ///
    /// With `require_magic` unset, a bad magic is only logged. The section
    /// count is checked again by the walk either way.
    pub fn check_header(&self, header: &EifHeader) -> Result<()> {
        if self.require_magic {
            header.validate()
        } else {
            if !header.has_valid_magic() {
                debug!("ignoring bad magic {:02x?}", header.magic);
            }
            Ok(())
        }
    }
}

/// A fully parsed EIF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEif {
    pub header: EifHeader,
    /// One descriptor per declared section, in header order.
    pub sections: Vec<SectionDescriptor>,
    pub metadata: Option<MetadataPayload>,
}

impl ParsedEif {
    pub(crate) fn new(header: EifHeader, walk: SectionWalk) -> Self {
        Self {
            header,
            sections: walk.sections,
            metadata: walk.metadata,
        }
    }

    pub fn size_mismatches(&self) -> impl Iterator<Item = SizeMismatch> + '_ {
        self.sections.iter().filter_map(SectionDescriptor::mismatch)
    }

    /// Text rendering of the header, sections and metadata.
    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

/// A parse that stopped on a fatal error.
///
/// Keeps what was decoded before the failure: the file header once it was
/// read, and the sections fully visited.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ParseError {
    /// `None` when the failure happened while reading the file header.
    pub header: Option<EifHeader>,
    pub sections: Vec<SectionDescriptor>,
    #[source]
    pub source: EifError,
}

impl ParseError {
    pub(crate) fn rejected(header: EifHeader, source: EifError) -> Self {
        Self {
            header: Some(header),
            sections: Vec::new(),
            source,
        }
    }

    pub(crate) fn from_walk(header: EifHeader, err: WalkError) -> Self {
        Self {
            header: Some(header),
            sections: err.sections,
            source: err.source,
        }
    }
}

impl From<EifError> for ParseError {
    fn from(source: EifError) -> Self {
        Self {
            header: None,
            sections: Vec::new(),
            source,
        }
    }
}

impl From<ParseError> for EifError {
    fn from(err: ParseError) -> Self {
        err.source
    }
}

/// Read and decode the file header from the start of `source`.
pub fn read_header<S: ByteSource + ?Sized>(source: &mut S) -> Result<EifHeader> {
    check_seek(0, ByteSource::seek_to(&mut *source, 0))?;
    let raw = ByteSource::read_up_to(&mut *source, EifHeaderParser::HEADER_SIZE as u64)?;
    decode_header(&raw)
}

/// Parse an EIF file: decode the header, validate it, walk its sections.
///
/// On failure the returned [`ParseError`] still holds the header and the
/// sections decoded up to that point.
pub fn parse_eif<S: ByteSource>(
    mut source: S,
    opts: &ParseOptions,
) -> std::result::Result<ParsedEif, ParseError> {
    let header = read_header(&mut source)?;
    if let Err(err) = opts.check_header(&header) {
        return Err(ParseError::rejected(header, err));
    }

    match walk_sections_with(&header, &mut source, opts.capture_metadata) {
        Ok(walk) => Ok(ParsedEif::new(header, walk)),
        Err(err) => Err(ParseError::from_walk(header, err)),
    }
}
