#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_log_pipeline::collector::decoder;

fuzz_target!(|data: &[u8]| {
    let record = decoder::decode(data, "127.0.0.1:514");

    // 디코딩은 실패하지 않고 항상 client 필드와 본문 필드를 남긴다
    assert!(record.get("client").is_some());
    assert!(record.body().is_ok());
});
