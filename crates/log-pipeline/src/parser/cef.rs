//! CEF (ArcSight Common Event Format) 파서
//!
//! `CEF:<version>|<vendor>|<product>|<deviceVersion>|<classId>|<name>|<severity>|<extension>`
//! 형식을 구조화된 객체로 변환합니다.
//!
//! # 규칙
//! - 헤더는 이스케이프되지 않은 `|`로 나누며, 7번째 필드 이후는 모두 확장 문자열입니다.
//! - 헤더 이스케이프: `\\` → `\`, `\|` → `|`, `\n` → 줄바꿈
//! - 확장은 공백으로 구분된 `key=value` 토큰입니다. `=`가 없는 토큰은 무시합니다.
//! - 확장 값 이스케이프: `\\` → `\`, `\n` → 줄바꿈, `\=` → `=`
//!
//! # 사용 예시
//! ```ignore
//! use sluice_log_pipeline::parser::CefParser;
//!
//! let event = CefParser::new().parse_event(
//!     "CEF:0|Security|threatmanager|1.0|100|worm successfully stopped|10|src=10.0.0.1",
//! )?;
//! assert_eq!(event.device_vendor, "Security");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sluice_core::error::ParseError;
use sluice_core::types::RawRecord;

use super::{ParsedEvent, RecordParser};

const CEF_PREFIX: &str = "CEF:";

/// 헤더 필드 수 (version 포함)
const HEADER_FIELDS: usize = 7;

/// 파싱된 CEF 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CefEvent {
    pub version: String,
    pub device_vendor: String,
    pub device_product: String,
    pub device_version: String,
    pub device_event_class_id: String,
    pub name: String,
    pub severity: String,
    /// 확장 필드 (입력 순서 유지)
    pub extensions: Map<String, Value>,
}

/// CEF 본문 파서
#[derive(Debug, Clone, Default)]
pub struct CefParser;

impl CefParser {
    pub fn new() -> Self {
        Self
    }

    /// 본문을 [`CefEvent`]로 파싱합니다.
    pub fn parse_event(&self, body: &str) -> Result<CefEvent, ParseError> {
        let rest = body
            .strip_prefix(CEF_PREFIX)
            .ok_or_else(|| ParseError::InvalidCefFormat("missing 'CEF:' prefix".to_owned()))?;

        let parts = split_unescaped_pipes(rest, HEADER_FIELDS + 1);
        if parts.len() < HEADER_FIELDS {
            return Err(ParseError::InvalidCefFormat(format!(
                "expected {HEADER_FIELDS} header fields, found {}",
                parts.len()
            )));
        }

        let version = parts[0].trim();
        if !is_valid_version(version) {
            return Err(ParseError::InvalidCefFormat(format!(
                "invalid version '{version}'"
            )));
        }

        let extension = parts.get(HEADER_FIELDS).copied().unwrap_or_default();

        Ok(CefEvent {
            version: version.to_owned(),
            device_vendor: unescape_header(parts[1]),
            device_product: unescape_header(parts[2]),
            device_version: unescape_header(parts[3]),
            device_event_class_id: unescape_header(parts[4]),
            name: unescape_header(parts[5]),
            severity: unescape_header(parts[6]),
            extensions: parse_extension(extension),
        })
    }

    /// 본문 텍스트를 파싱하여 JSON 객체로 반환합니다.
    pub fn parse_body(&self, body: &str) -> Result<ParsedEvent, ParseError> {
        let event = self.parse_event(body)?;
        serde_json::to_value(event).map_err(|e| ParseError::InvalidCefFormat(e.to_string()))
    }
}

impl RecordParser for CefParser {
    fn format_name(&self) -> &str {
        "cef"
    }

    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        self.parse_body(record.body()?)
    }
}

/// 버전은 숫자 또는 점으로 구분된 숫자 (`0`, `1.2`)
fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// 이스케이프되지 않은 `|`로 최대 `limit`개까지 나눕니다. 마지막 조각은 나머지 전체입니다.
fn split_unescaped_pipes(text: &str, limit: usize) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::with_capacity(limit);
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() && parts.len() + 1 < limit {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                parts.push(&text[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&text[start..]);
    parts
}

/// 백슬래시 이스케이프를 한 번의 순회로 해제합니다.
///
/// `escapes`에 없는 시퀀스는 그대로 둡니다.
fn unescape(text: &str, escapes: &[(char, char)]) -> String {
    if !text.contains('\\') {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => match escapes.iter().find(|(from, _)| *from == next) {
                Some((_, to)) => out.push(*to),
                None => {
                    out.push('\\');
                    out.push(next);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}

fn unescape_header(field: &str) -> String {
    unescape(field, &[('\\', '\\'), ('|', '|'), ('n', '\n')])
}

fn unescape_extension_value(value: &str) -> String {
    unescape(value, &[('\\', '\\'), ('n', '\n'), ('=', '=')])
}

/// 첫 번째 이스케이프되지 않은 `=`의 위치
fn first_unescaped_equals(token: &str) -> Option<usize> {
    let bytes = token.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'=' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// 확장 문자열을 key=value 맵으로 파싱합니다.
///
/// 공백으로 나눈 토큰 중 이스케이프되지 않은 `=`가 있는 것만 사용하며,
/// 첫 `=`에서 키와 값을 나눕니다. 키가 비어 있거나 `=`가 없는 토큰은 버립니다.
fn parse_extension(extension: &str) -> Map<String, Value> {
    let mut extensions = Map::new();
    for token in extension.split_whitespace() {
        let Some(eq) = first_unescaped_equals(token) else {
            continue;
        };
        if eq == 0 {
            continue;
        }
        extensions.insert(
            token[..eq].to_owned(),
            Value::String(unescape_extension_value(&token[eq + 1..])),
        );
    }
    extensions
}
