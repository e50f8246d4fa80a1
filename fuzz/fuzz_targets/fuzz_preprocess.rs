#![no_main]

use libfuzzer_sys::fuzz_target;
use oas_preprocess_core::{preprocess_document, PreprocessOptions};

// Arbitrary bytes that parse as JSON go through the whole pipeline with a
// dedicated response document. Errors are fine; panics and hangs are not.
fuzz_target!(|data: &[u8]| {
    if let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) {
        let options = PreprocessOptions {
            use_dedicated_response_doc: true,
            max_ref_hops: 8,
            ..PreprocessOptions::default()
        };
        let _ = preprocess_document(document, &options);
    }
});
