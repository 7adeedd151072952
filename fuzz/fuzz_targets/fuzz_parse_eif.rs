#![no_main]
use eif_parse::{parse_eif, ParseOptions};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Fuzz a complete image: header, every declared section, metadata capture.
fuzz_target!(|data: &[u8]| {
    let opts = ParseOptions {
        require_magic: false,
        ..Default::default()
    };

    if let Ok(eif) = parse_eif(Cursor::new(data), &opts) {
        assert_eq!(eif.sections.len(), usize::from(eif.header.section_count));
        // Metadata never outgrows the input it was read from.
        if let Some(metadata) = &eif.metadata {
            assert!(metadata.len() <= data.len());
        }
        let _ = eif.report().to_string();
    }
});
