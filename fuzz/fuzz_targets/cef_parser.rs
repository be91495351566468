#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_log_pipeline::parser::CefParser;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(event) = CefParser::new().parse_event(text) {
        assert!(text.starts_with("CEF:"));
        assert!(!event.version.is_empty());
    }
});
