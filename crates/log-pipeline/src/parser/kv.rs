//! key=value 파서
//!
//! 공백으로 구분된 `key=value` 토큰을 객체로 변환합니다.
//!
//! - 값은 큰따옴표나 작은따옴표로 감쌀 수 있으며, 따옴표 안의 `\x`는 `x`가 됩니다.
//! - `=`가 없는 토큰과 키가 빈 토큰은 무시합니다.
//! - 같은 키가 반복되면 마지막 값이 남습니다.
//! - 값은 항상 문자열입니다.

use serde_json::{Map, Value};

use sluice_core::error::ParseError;
use sluice_core::types::RawRecord;

use super::{ParsedEvent, RecordParser};

/// key=value 본문 파서
#[derive(Debug, Clone, Default)]
pub struct KvParser;

impl KvParser {
    pub fn new() -> Self {
        Self
    }

    /// 본문 텍스트를 파싱합니다. 쌍이 하나도 없으면 [`ParseError::MalformedKv`].
    pub fn parse_body(&self, body: &str) -> Result<ParsedEvent, ParseError> {
        let bytes = body.as_bytes();
        let mut fields = Map::new();
        let mut pos = 0;

        while pos < bytes.len() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            let key_start = pos;
            while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if bytes.get(pos) != Some(&b'=') {
                // 맨 토큰
                continue;
            }

            let key = &body[key_start..pos];
            let (value, next) = read_value(body, pos + 1);
            pos = next;

            if !key.is_empty() {
                fields.insert(key.to_owned(), Value::String(value));
            }
        }

        if fields.is_empty() {
            return Err(ParseError::MalformedKv(truncate(body)));
        }
        Ok(Value::Object(fields))
    }
}

/// `start`부터 값 하나를 읽고 (값, 다음 위치)를 반환합니다.
fn read_value(body: &str, start: usize) -> (String, usize) {
    let bytes = body.as_bytes();
    match bytes.get(start) {
        Some(&quote @ (b'"' | b'\'')) => {
            let quote = char::from(quote);
            let mut value = String::new();
            let mut escaped = false;
            for (offset, c) in body[start + 1..].char_indices() {
                if escaped {
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    return (value, start + 1 + offset + c.len_utf8());
                } else {
                    value.push(c);
                }
            }
            // 닫히지 않은 따옴표는 끝까지 값으로 취급
            if escaped {
                value.push('\\');
            }
            (value, bytes.len())
        }
        _ => {
            let end = bytes[start..]
                .iter()
                .position(u8::is_ascii_whitespace)
                .map_or(bytes.len(), |p| start + p);
            (body[start..end].to_owned(), end)
        }
    }
}

/// 에러 메시지에 넣을 본문 앞부분
fn truncate(body: &str) -> String {
    const MAX: usize = 64;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("no key=value pairs in '{}...'", &body[..idx]),
        None => format!("no key=value pairs in '{body}'"),
    }
}

impl RecordParser for KvParser {
    fn format_name(&self) -> &str {
        "kv"
    }

    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        self.parse_body(record.body()?)
    }
}
