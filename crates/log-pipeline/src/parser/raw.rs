//! raw 파서 -- 레코드 전체를 그대로 JSON 객체로 내보냅니다.
//!
//! 수집 메타데이터가 이미 모두 들어 있으므로 메타데이터 병합 대상이 아닙니다.

use serde_json::Value;

use sluice_core::error::ParseError;
use sluice_core::types::RawRecord;

use super::{ParsedEvent, RecordParser};

/// 레코드 전체 직렬화 파서
#[derive(Debug, Clone, Default)]
pub struct RawParser;

impl RawParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for RawParser {
    fn format_name(&self) -> &str {
        "raw"
    }

    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        if record.is_empty() {
            return Err(ParseError::EmptyRecord);
        }
        Ok(Value::Object(record.fields().clone()))
    }
}
