#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use sluice_log_pipeline::parser::GrokLibrary;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 사용자 정의 패턴 (이름, 정의) -- 최대 4개 사용
    definitions: Vec<(String, String)>,
    /// 컴파일할 패턴
    pattern: String,
    /// 매칭 대상
    text: String,
}

fuzz_target!(|input: FuzzInput| {
    let mut library = GrokLibrary::with_builtins();
    for (name, definition) in input.definitions.iter().take(4) {
        // 이름 검증 실패는 무시
        let _ = library.add(name, definition);
    }

    // 순환 정의나 알 수 없는 패턴도 패닉 없이 에러가 되어야 한다
    if let Ok(pattern) = library.compile(&input.pattern) {
        let _ = pattern.captures(&input.text);
    }
});
