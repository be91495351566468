//! 메타데이터 병합 -- 파싱 결과에 원본 syslog 필드를 합칩니다.
//!
//! `keep_syslog`가 켜져 있고 파서가 raw가 아닐 때만 동작합니다.
//! 본문 필드(`content`, `message`)는 `keep_message`가 켜져 있을 때만 남습니다.
//! 꺼져 있으면 파서가 만든 같은 이름의 키도 결과에서 제거됩니다.
//! 같은 키가 있으면 레코드의 메타데이터가 파싱 결과를 덮어씁니다.

use serde_json::Value;

use sluice_core::types::{CONTENT_FIELD, MESSAGE_FIELD, ParserKind, RawRecord};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::parser::ParsedEvent;

/// 메타데이터 병합기
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataMerger {
    enabled: bool,
    keep_message: bool,
}

impl MetadataMerger {
    /// 파서 종류와 플래그로 병합기를 생성합니다.
    pub fn new(parser: ParserKind, keep_syslog: bool, keep_message: bool) -> Self {
        Self {
            enabled: keep_syslog && parser != ParserKind::Raw,
            keep_message,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.parser, config.keep_syslog, config.keep_message)
    }

    /// 병합이 활성화되어 있는지 확인합니다.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 파싱 결과에 레코드 메타데이터를 병합합니다.
    ///
    /// 비활성화 상태면 입력을 그대로 반환합니다. 활성화 상태에서 결과가
    /// JSON 객체가 아니면 [`LogPipelineError::MergeFailure`]입니다.
    pub fn merge(
        &self,
        event: ParsedEvent,
        record: &RawRecord,
    ) -> Result<ParsedEvent, LogPipelineError> {
        if !self.enabled {
            return Ok(event);
        }

        let mut object = match event {
            Value::Object(map) => map,
            other => {
                return Err(LogPipelineError::MergeFailure {
                    kind: json_kind(&other),
                });
            }
        };

        for (key, value) in record.fields() {
            let is_body = key == CONTENT_FIELD || key == MESSAGE_FIELD;
            if is_body && !self.keep_message {
                continue;
            }
            object.insert(key.clone(), value.clone());
        }

        if !self.keep_message {
            object.retain(|key, _| key != CONTENT_FIELD && key != MESSAGE_FIELD);
        }

        Ok(Value::Object(object))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
