//! EIF header parsing modules.

pub mod bytes;
pub mod eif_header;
pub mod section_header;

pub use bytes::BigEndianReader;
pub use eif_header::{
    decode_header, EifHeader, EifHeaderParser, SectionEntry, EIF_MAGIC, MAX_SECTIONS,
};
pub use section_header::{decode_section_header, SectionHeader, SectionHeaderParser, SectionType};
