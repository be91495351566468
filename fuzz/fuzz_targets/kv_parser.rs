#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_log_pipeline::parser::KvParser;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(event) = KvParser::new().parse_body(text) {
        let map = event.as_object().expect("kv output is always an object");
        assert!(!map.is_empty());
        assert!(map.keys().all(|k| !k.is_empty()));
    }
});
