//! Plain-text rendering of a parsed EIF file.
//!
//! [`Report`] renders a whole [`ParsedEif`]. The block types render one
//! piece each, for callers that print while the walk is still running.

use crate::parser::ParsedEif;
use crate::parsing::EifHeader;
use crate::walker::{MetadataPayload, SectionDescriptor};
use std::fmt;

/// Opening line of the section list.
pub const SECTIONS_BEGIN: &str = "------EIF Section Headers-----";
/// Closing line of the section list.
pub const SECTIONS_END: &str = "------EIF Section Headers------";

/// Text report: header block, one block per section, then the metadata.
///
/// Size mismatch warnings are not part of the report; callers print them
/// wherever warnings belong (see [`ParsedEif::size_mismatches`]).
pub struct Report<'a> {
    eif: &'a ParsedEif,
}

impl<'a> Report<'a> {
    pub fn new(eif: &'a ParsedEif) -> Self {
        Self { eif }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HeaderBlock(&self.eif.header))?;

        writeln!(f, "{SECTIONS_BEGIN}")?;
        writeln!(f)?;
        for section in &self.eif.sections {
            write!(f, "{}", SectionBlock(section))?;
        }
        writeln!(f, "{SECTIONS_END}")?;
        writeln!(f)?;

        if let Some(metadata) = &self.eif.metadata {
            write!(f, "{}", MetadataBlock(metadata))?;
        }
        Ok(())
    }
}

/// The `------EIF Header------` block.
pub struct HeaderBlock<'a>(pub &'a EifHeader);

impl fmt::Display for HeaderBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.0;
        // Magic is printed like a C "%.4s": stop at the first NUL.
        let magic_len = header.magic.iter().position(|&b| b == 0).unwrap_or(4);
        let magic = String::from_utf8_lossy(&header.magic[..magic_len]);

        writeln!(f, "------EIF Header------")?;
        writeln!(f, "magic           {} ({})", magic, hex::encode(header.magic))?;
        writeln!(f, "version         {}", header.version)?;
        writeln!(f, "flags           {}", header.flags)?;
        writeln!(f, "default memory  {}", header.default_memory)?;
        writeln!(f, "default cpus    {}", header.default_cpus)?;
        writeln!(f, "section count   {}", header.section_count)?;
        writeln!(f, "crc32           {}", header.crc32)?;
        writeln!(f, "------EIF Header------")?;
        writeln!(f)
    }
}

/// One section entry inside the section list.
pub struct SectionBlock<'a>(pub &'a SectionDescriptor);

impl fmt::Display for SectionBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "section type    {}", self.0.section_type)?;
        writeln!(f, "flags           {}", self.0.flags)?;
        writeln!(f, "section size    {}", self.0.header_size)?;
        writeln!(f)
    }
}

/// The `------metadata json------` block.
pub struct MetadataBlock<'a>(pub &'a MetadataPayload);

impl fmt::Display for MetadataBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------metadata json------")?;
        writeln!(f, "{}", self.0.as_c_str().to_string_lossy())?;
        writeln!(f, "------metadata json------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{SectionType, MAX_SECTIONS};
    use crate::walker::{MetadataPayload, SectionWalk};

    fn parsed(metadata: Option<&[u8]>) -> ParsedEif {
        let header = EifHeader {
            magic: *b".eif",
            version: 4,
            flags: 0,
            default_memory: 536_870_912,
            default_cpus: 2,
            reserved: 0,
            section_count: 1,
            section_offsets: [0; MAX_SECTIONS],
            section_sizes: [0; MAX_SECTIONS],
            unused: 0,
            crc32: 3_735_928_559,
        };
        let walk = SectionWalk {
            sections: vec![SectionDescriptor {
                index: 0,
                offset: 548,
                section_type: SectionType::Kernel,
                flags: 0,
                declared_size: 4096,
                header_size: 4096,
                size_mismatch: false,
            }],
            metadata: metadata.map(|m| MetadataPayload::new(m.to_vec())),
        };
        ParsedEif::new(header, walk)
    }

    #[test]
    fn test_report_layout() {
        let text = parsed(Some(br#"{"a":1}"#)).report().to_string();
        let expected = "\
------EIF Header------
magic           .eif (2e656966)
version         4
flags           0
default memory  536870912
default cpus    2
section count   1
crc32           3735928559
------EIF Header------

------EIF Section Headers-----

section type    kernel
flags           0
section size    4096

------EIF Section Headers------

------metadata json------
{\"a\":1}
------metadata json------
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_report_without_metadata() {
        let text = parsed(None).report().to_string();
        assert!(text.ends_with("------EIF Section Headers------\n\n"));
        assert!(!text.contains("metadata json"));
    }

    #[test]
    fn test_blocks_compose_the_report() {
        let eif = parsed(Some(b"{}"));
        let mut pieces = HeaderBlock(&eif.header).to_string();
        pieces.push_str(SECTIONS_BEGIN);
        pieces.push_str("\n\n");
        for section in &eif.sections {
            pieces.push_str(&SectionBlock(section).to_string());
        }
        pieces.push_str(SECTIONS_END);
        pieces.push_str("\n\n");
        pieces.push_str(&MetadataBlock(eif.metadata.as_ref().unwrap()).to_string());

        assert_eq!(pieces, eif.report().to_string());
    }
}
