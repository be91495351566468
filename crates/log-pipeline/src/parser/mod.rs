//! 본문 파서 모듈 -- 설정된 파서 종류에 따라 레코드 본문을 구조화합니다.
//!
//! [`ParserDispatch`]는 시작 시 설정된 [`ParserKind`]에 맞는 파서를 하나 만들고,
//! 레코드마다 그 파서를 호출합니다. 각 파서는 [`RecordParser`] trait을 구현합니다.
//!
//! # 지원 형식
//! - grok 패턴 목록, 첫 매칭 사용 ([`GrokParser`])
//! - JSON 본문 정규화 ([`JsonParser`])
//! - 공백 구분 key=value ([`KvParser`])
//! - ArcSight CEF ([`CefParser`])
//! - 레코드 전체 직렬화 ([`RawParser`])
//!
//! # 사용 예시
//! ```ignore
//! use sluice_log_pipeline::config::PipelineConfig;
//! use sluice_log_pipeline::parser::ParserDispatch;
//!
//! let dispatch = ParserDispatch::from_config(&PipelineConfig::default())?;
//! let event = dispatch.dispatch(&record)?;
//! ```

pub mod cef;
pub mod grok;
pub mod json;
pub mod kv;
pub mod raw;

pub use cef::CefParser;
pub use grok::{GrokLibrary, GrokParser, GrokPattern};
pub use json::JsonParser;
pub use kv::KvParser;
pub use raw::RawParser;

use sluice_core::error::ParseError;
use sluice_core::types::{ParserKind, RawRecord};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;

/// 파서가 만드는 구조화 결과
///
/// 파싱과 직렬화 사이에만 메모리에 존재합니다.
pub type ParsedEvent = serde_json::Value;

/// 레코드 본문 파서
///
/// 구현체는 상태 없이 `&self`로 호출되며, 파싱 실패는 레코드 단위의
/// 복구 가능한 [`ParseError`]로 보고합니다.
pub trait RecordParser: Send + Sync {
    /// 로그와 메트릭에 쓰는 파서 이름
    fn format_name(&self) -> &str;

    /// 레코드 하나를 파싱합니다.
    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError>;
}

/// 파서 디스패치
///
/// 설정된 파서 하나를 소유하며 레코드 단위로 호출합니다.
pub struct ParserDispatch {
    kind: ParserKind,
    parser: Box<dyn RecordParser>,
}

impl ParserDispatch {
    /// 설정에서 파서를 생성합니다.
    ///
    /// grok 패턴 컴파일 실패는 여기서 [`LogPipelineError::Pattern`]으로 반환됩니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        let parser: Box<dyn RecordParser> = match config.parser {
            ParserKind::Grok => Box::new(GrokParser::new(
                &config.grok_patterns,
                &config.custom_patterns,
            )?),
            ParserKind::Json => Box::new(JsonParser::new(config.max_input_size)),
            ParserKind::Kv => Box::new(KvParser::new()),
            ParserKind::Cef => Box::new(CefParser::new()),
            ParserKind::Raw => Box::new(RawParser::new()),
        };
        tracing::info!(parser = parser.format_name(), "parser initialized");
        Ok(Self::new(config.parser, parser))
    }

    /// 임의의 파서로 디스패치를 생성합니다.
    pub fn new(kind: ParserKind, parser: Box<dyn RecordParser>) -> Self {
        Self { kind, parser }
    }

    /// 설정된 파서 종류
    pub fn kind(&self) -> ParserKind {
        self.kind
    }

    /// 파서 이름
    pub fn format_name(&self) -> &str {
        self.parser.format_name()
    }

    /// 레코드 하나를 파싱합니다.
    ///
    /// 본문 필드가 없는 레코드는 파서 종류와 관계없이
    /// [`ParseError::MissingBodyField`]로 거부합니다.
    pub fn dispatch(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        record.body()?;
        self.parser.parse(record)
    }
}

impl std::fmt::Debug for ParserDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserDispatch")
            .field("kind", &self.kind)
            .field("parser", &self.parser.format_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use serde_json::json;

    fn dispatch_for(kind: ParserKind) -> ParserDispatch {
        let config = PipelineConfigBuilder::new()
            .parser(kind)
            .grok_patterns(["%{IP:client} %{WORD:action}"])
            .build()
            .unwrap();
        ParserDispatch::from_config(&config).unwrap()
    }

    fn record(body: &str) -> RawRecord {
        RawRecord::new()
            .with("hostname", "web-01")
            .with("content", body)
    }

    #[test]
    fn builds_each_kind() {
        for (kind, name) in [
            (ParserKind::Grok, "grok"),
            (ParserKind::Json, "json"),
            (ParserKind::Kv, "kv"),
            (ParserKind::Cef, "cef"),
            (ParserKind::Raw, "raw"),
        ] {
            let dispatch = dispatch_for(kind);
            assert_eq!(dispatch.kind(), kind);
            assert_eq!(dispatch.format_name(), name);
        }
    }

    #[test]
    fn missing_body_rejected_for_every_kind() {
        let no_body = RawRecord::new().with("hostname", "web-01");
        for kind in [
            ParserKind::Grok,
            ParserKind::Json,
            ParserKind::Kv,
            ParserKind::Cef,
            ParserKind::Raw,
        ] {
            assert_eq!(
                dispatch_for(kind).dispatch(&no_body),
                Err(ParseError::MissingBodyField),
                "{kind}"
            );
        }
    }

    #[test]
    fn non_string_body_rejected() {
        let record = RawRecord::new().with("content", 42);
        assert_eq!(
            dispatch_for(ParserKind::Kv).dispatch(&record),
            Err(ParseError::MissingBodyField)
        );
    }

    #[test]
    fn grok_dispatch() {
        let event = dispatch_for(ParserKind::Grok)
            .dispatch(&record("192.168.1.1 connect"))
            .unwrap();
        assert_eq!(event, json!({"client": "192.168.1.1", "action": "connect"}));
    }

    #[test]
    fn kv_dispatch() {
        let event = dispatch_for(ParserKind::Kv)
            .dispatch(&record("user=alice action=login result=success"))
            .unwrap();
        assert_eq!(
            event,
            json!({"user": "alice", "action": "login", "result": "success"})
        );
    }

    #[test]
    fn raw_dispatch_keeps_metadata() {
        let event = dispatch_for(ParserKind::Raw)
            .dispatch(&record("hello"))
            .unwrap();
        assert_eq!(event, json!({"hostname": "web-01", "content": "hello"}));
    }

    #[test]
    fn invalid_grok_pattern_fails_at_construction() {
        let config = PipelineConfigBuilder::new()
            .parser(ParserKind::Grok)
            .grok_patterns(["%{MISSING:x}"])
            .build()
            .unwrap();
        let err = ParserDispatch::from_config(&config).unwrap_err();
        assert!(matches!(err, LogPipelineError::Pattern { .. }));
    }
}
