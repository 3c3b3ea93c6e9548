#![no_main]

use libfuzzer_sys::fuzz_target;
use mjcf_prep::{Document, Preprocessor};

fuzz_target!(|data: &[u8]| {
    // Parsing and preprocessing must fail gracefully, never panic
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut doc) = Document::parse_str(xml) else {
        return;
    };

    let preprocessor = Preprocessor::default();
    if preprocessor.preprocess_document(&mut doc).is_ok() {
        let _ = preprocessor.extract_metadata(&doc);
        let _ = doc.to_xml_string();
    }
});
