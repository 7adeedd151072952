//! Async section walking over tokio byte sources.
//!
//! Same rules as the blocking [`walk_sections`](crate::walk_sections): header
//! order, first metadata wins, size mismatches only warn.

use crate::byte_source::AsyncByteSource;
use crate::error::Result;
use crate::parser::{ParseError, ParseOptions, ParsedEif};
use crate::parsing::{decode_header, EifHeader, EifHeaderParser, SectionEntry, SectionHeaderParser};
use crate::walker::{check_seek, SectionDescriptor, SectionWalk, WalkError, WalkState};

/// Visit every declared section and capture the first metadata payload.
pub async fn walk_sections_async<S: AsyncByteSource + ?Sized>(
    header: &EifHeader,
    source: &mut S,
) -> std::result::Result<SectionWalk, WalkError> {
    walk_sections_async_with(header, source, true).await
}

async fn walk_sections_async_with<S: AsyncByteSource + ?Sized>(
    header: &EifHeader,
    source: &mut S,
    capture_metadata: bool,
) -> std::result::Result<SectionWalk, WalkError> {
    header.check_section_count().map_err(|err| WalkError {
        index: 0,
        sections: Vec::new(),
        source: err,
    })?;

    let mut state = WalkState::new(capture_metadata);
    let mut sections = Vec::with_capacity(usize::from(header.section_count));

    for entry in header.sections() {
        match visit(&mut state, &mut *source, entry).await {
            Ok(descriptor) => sections.push(descriptor),
            Err(err) => {
                return Err(WalkError {
                    index: entry.index,
                    sections,
                    source: err,
                })
            }
        }
    }

    Ok(SectionWalk {
        sections,
        metadata: state.into_metadata(),
    })
}

async fn visit<S: AsyncByteSource + ?Sized>(
    state: &mut WalkState,
    source: &mut S,
    entry: SectionEntry,
) -> Result<SectionDescriptor> {
    let landed = AsyncByteSource::seek_to(&mut *source, entry.offset).await;
    check_seek(entry.offset, landed)?;

    let raw = AsyncByteSource::read_up_to(&mut *source, SectionHeaderParser::HEADER_SIZE as u64)
        .await?;
    let section_header = SectionHeaderParser::parse(&raw)?;
    let descriptor = WalkState::describe(entry, &section_header);

    if let Some(len) = state.metadata_len(entry, &section_header)? {
        let payload = AsyncByteSource::read_up_to(&mut *source, len).await?;
        state.capture(entry, len, payload)?;
    }
    Ok(descriptor)
}

/// Read and decode the file header from the start of `source`.
pub async fn read_header_async<S: AsyncByteSource + ?Sized>(source: &mut S) -> Result<EifHeader> {
    check_seek(0, AsyncByteSource::seek_to(&mut *source, 0).await)?;
    let raw = AsyncByteSource::read_up_to(&mut *source, EifHeaderParser::HEADER_SIZE as u64).await?;
    decode_header(&raw)
}

/// Async counterpart of [`parse_eif`](crate::parse_eif).
pub async fn parse_eif_async<S: AsyncByteSource>(
    mut source: S,
    opts: &ParseOptions,
) -> std::result::Result<ParsedEif, ParseError> {
    let header = read_header_async(&mut source).await?;
    if let Err(err) = opts.check_header(&header) {
        return Err(ParseError::rejected(header, err));
    }

    match walk_sections_async_with(&header, &mut source, opts.capture_metadata).await {
        Ok(walk) => Ok(ParsedEif::new(header, walk)),
        Err(err) => Err(ParseError::from_walk(header, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EifError;
    use crate::fixtures::{header_with, section_bytes};
    use crate::parsing::SectionType;
    use std::io::Cursor;

    /// Full image: header followed by the given `(type, payload)` sections.
    fn image(magic: &[u8; 4], sections: &[(u16, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        let mut entries = Vec::new();
        for &(section_type, payload) in sections {
            let offset = (EifHeaderParser::HEADER_SIZE + body.len()) as u64;
            entries.push((offset, payload.len() as u64));
            body.extend(section_bytes(section_type, payload.len() as u64, payload));
        }
        let mut header = header_with(&entries);
        header.magic = *magic;

        let mut data = header.to_bytes().to_vec();
        data.extend(body);
        data
    }

    #[tokio::test]
    async fn test_async_first_metadata_wins() {
        let mut data = section_bytes(5, 5, b"first");
        let second = data.len() as u64;
        data.extend(section_bytes(5, 6, b"second"));

        let header = header_with(&[(0, 5), (second, 6)]);
        let walk = walk_sections_async(&header, &mut Cursor::new(data))
            .await
            .unwrap();

        assert_eq!(walk.sections.len(), 2);
        assert!(walk
            .sections
            .iter()
            .all(|s| s.section_type == SectionType::Metadata));
        assert_eq!(walk.metadata.unwrap().as_bytes(), b"first");
    }

    #[tokio::test]
    async fn test_async_seek_failure_keeps_earlier_sections() {
        let data = section_bytes(1, 4, b"kern");
        let header = header_with(&[(0, 4), (1 << 20, 0)]);

        let err = walk_sections_async(&header, &mut Cursor::new(data))
            .await
            .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.sections.len(), 1);
        assert!(matches!(err.source, EifError::SeekFailed { .. }));
    }

    #[tokio::test]
    async fn test_async_too_many_sections() {
        let mut header = header_with(&[]);
        header.section_count = 33;

        let err = walk_sections_async(&header, &mut Cursor::new(Vec::<u8>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err.source, EifError::TooManySections { .. }));
    }

    #[tokio::test]
    async fn test_async_truncated_section_header() {
        let header = header_with(&[(0, 0)]);

        let err = walk_sections_async(&header, &mut Cursor::new(vec![0u8; 11]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.source,
            EifError::TruncatedSectionHeader { needed: 12, have: 11 }
        ));
    }

    #[tokio::test]
    async fn test_async_capture_disabled() {
        let data = section_bytes(5, 3, b"abc");
        let header = header_with(&[(0, 3)]);

        let walk = walk_sections_async_with(&header, &mut Cursor::new(data), false)
            .await
            .unwrap();
        assert_eq!(walk.sections.len(), 1);
        assert!(walk.metadata.is_none());
    }

    #[tokio::test]
    async fn test_read_header_async() {
        let data = image(b".eif", &[(1, b"kernel")]);
        let mut source = Cursor::new(data);
        source.set_position(100);

        let header = read_header_async(&mut source).await.unwrap();
        assert!(header.has_valid_magic());
        assert_eq!(header.section_count, 1);
        assert_eq!(header.section_offsets[0], 548);
    }

    #[tokio::test]
    async fn test_parse_eif_async() {
        let data = image(b".eif", &[(1, b"kernel"), (2, b"console=ttyS0"), (5, b"{}")]);

        let eif = parse_eif_async(Cursor::new(data), &ParseOptions::default())
            .await
            .unwrap();
        let types: Vec<_> = eif.sections.iter().map(|s| s.section_type).collect();
        assert_eq!(
            types,
            vec![SectionType::Kernel, SectionType::Cmdline, SectionType::Metadata]
        );
        assert_eq!(eif.size_mismatches().count(), 0);
        assert_eq!(eif.metadata.unwrap().as_bytes(), b"{}");
    }

    #[tokio::test]
    async fn test_parse_eif_async_bad_magic() {
        let data = image(b"NOPE", &[(5, b"{}")]);

        let err = parse_eif_async(Cursor::new(data.clone()), &ParseOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.source, EifError::InvalidMagic { found } if &found == b"NOPE"));
        assert!(err.header.is_some());

        let opts = ParseOptions {
            require_magic: false,
            ..Default::default()
        };
        let eif = parse_eif_async(Cursor::new(data), &opts).await.unwrap();
        assert_eq!(&eif.header.magic, b"NOPE");
        assert_eq!(eif.metadata.unwrap().as_bytes(), b"{}");
    }

    #[tokio::test]
    async fn test_parse_eif_async_truncated_metadata() {
        let mut data = image(b".eif", &[(1, b"kernel"), (5, &[b'x'; 40])]);
        data.truncate(data.len() - 15);

        let err = parse_eif_async(Cursor::new(data), &ParseOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.source,
            EifError::TruncatedMetadata { expected: 40, actual: 25 }
        ));
        assert_eq!(err.header.unwrap().section_count, 2);
        assert_eq!(err.sections.len(), 1);
        assert_eq!(err.sections[0].section_type, SectionType::Kernel);
    }
}
