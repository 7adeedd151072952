//! Builders shared by the walker tests.

use crate::parsing::{EifHeader, MAX_SECTIONS};

/// A `.eif` header declaring one section per `(offset, size)` pair.
pub(crate) fn header_with(sections: &[(u64, u64)]) -> EifHeader {
    let mut section_offsets = [0u64; MAX_SECTIONS];
    let mut section_sizes = [0u64; MAX_SECTIONS];
    for (i, &(offset, size)) in sections.iter().enumerate() {
        section_offsets[i] = offset;
        section_sizes[i] = size;
    }
    EifHeader {
        magic: *b".eif",
        version: 4,
        flags: 0,
        default_memory: 0,
        default_cpus: 0,
        reserved: 0,
        section_count: sections.len() as u16,
        section_offsets,
        section_sizes,
        unused: 0,
        crc32: 0,
    }
}

/// A section header claiming `size` payload bytes, followed by `payload`.
pub(crate) fn section_bytes(section_type: u16, size: u64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&section_type.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes());
    buf.extend_from_slice(&size.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}
