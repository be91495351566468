#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use sluice_core::types::ParserKind;
use sluice_log_pipeline::collector::decoder;
use sluice_log_pipeline::{PipelineConfig, RecordProcessor};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    parser: u8,
    keep_syslog: bool,
    keep_message: bool,
    message: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let parser = match input.parser % 4 {
        0 => ParserKind::Json,
        1 => ParserKind::Kv,
        2 => ParserKind::Cef,
        _ => ParserKind::Raw,
    };
    let config = PipelineConfig {
        parser,
        keep_syslog: input.keep_syslog,
        keep_message: input.keep_message,
        ..Default::default()
    };
    let Ok(processor) = RecordProcessor::from_config(&config) else {
        return;
    };

    let record = decoder::decode(&input.message, "127.0.0.1:514");
    if let Ok(line) = processor.process(&record) {
        // 출력은 줄바꿈 없는 JSON 한 줄, 병합이 켜져 있으면 객체
        assert!(!line.contains(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&line).expect("valid JSON");
        if input.keep_syslog && parser != ParserKind::Raw {
            assert!(value.is_object());
        }
    }
});
