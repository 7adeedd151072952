#![no_main]
use eif_parse::{decode_header, decode_section_header};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = decode_header(data) {
        assert_eq!(&header.to_bytes()[..], &data[..548]);
        let _ = header.validate();
        assert!(header.sections().count() <= 32);
    }
    let _ = decode_section_header(data);
});
