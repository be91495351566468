//! JSON 파서
//!
//! 본문이 이미 JSON이라고 보고 파싱 후 그대로 돌려줍니다. 배치 파일에 기록할 때
//! 한 줄로 다시 직렬화되므로 공백과 줄바꿈은 정규화되고, 키 순서는 유지됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use sluice_log_pipeline::parser::JsonParser;
//!
//! let parser = JsonParser::default();
//! let event = parser.parse_body(r#"{ "level": "info" }"#)?;
//! assert_eq!(event.to_string(), r#"{"level":"info"}"#);
//! ```

use sluice_core::error::ParseError;
use sluice_core::types::RawRecord;

use super::{ParsedEvent, RecordParser};

/// 기본 입력 최대 크기 (1MB)
const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// JSON 본문 파서
#[derive(Debug, Clone)]
pub struct JsonParser {
    /// 입력 최대 크기 (바이트)
    max_input_size: usize,
}

impl JsonParser {
    /// 입력 크기 제한을 지정하여 파서를 생성합니다.
    pub fn new(max_input_size: usize) -> Self {
        Self { max_input_size }
    }

    /// 본문 텍스트를 파싱합니다.
    pub fn parse_body(&self, body: &str) -> Result<ParsedEvent, ParseError> {
        if body.len() > self.max_input_size {
            return Err(ParseError::InvalidJson(format!(
                "input too large: {} bytes (max: {})",
                body.len(),
                self.max_input_size
            )));
        }

        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_SIZE)
    }
}

impl RecordParser for JsonParser {
    fn format_name(&self) -> &str {
        "json"
    }

    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        self.parse_body(record.body()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_name_is_json() {
        assert_eq!(JsonParser::default().format_name(), "json");
    }

    #[test]
    fn whitespace_is_normalized() {
        let parser = JsonParser::default();
        let event = parser
            .parse_body("{\n  \"user\" : \"alice\",\n  \"count\": 3,\n  \"tags\": [ \"a\", \"b\" ]\n}")
            .unwrap();
        assert_eq!(
            event.to_string(),
            r#"{"user":"alice","count":3,"tags":["a","b"]}"#
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let event = JsonParser::default()
            .parse_body(r#"{"z":1,"a":2,"m":3}"#)
            .unwrap();
        assert_eq!(event.to_string(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn non_object_json_is_accepted() {
        let parser = JsonParser::default();
        assert_eq!(parser.parse_body("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(parser.parse_body("\"text\"").unwrap(), json!("text"));
    }

    #[test]
    fn invalid_json_fails() {
        let parser = JsonParser::default();
        for input in ["", "not json", "{\"a\":", "{\"a\":1} trailing"] {
            assert!(
                matches!(parser.parse_body(input), Err(ParseError::InvalidJson(_))),
                "{input:?}"
            );
        }
    }

    #[test]
    fn too_large_input_fails() {
        let parser = JsonParser::new(10);
        let err = parser.parse_body(r#"{"message":"too long"}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(ref m) if m.contains("too large")));
    }

    #[test]
    fn parses_message_field_when_content_absent() {
        let record = RawRecord::new().with("message", r#"{"ok":true}"#);
        assert_eq!(
            JsonParser::default().parse(&record).unwrap(),
            json!({"ok": true})
        );
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use serde_json::{Map, Value};

        fn json_object() -> impl Strategy<Value = Value> {
            prop::collection::vec(("[a-z_]{1,8}", any::<i64>(), "[ -~]{0,16}"), 0..8).prop_map(
                |entries| {
                    let mut map = Map::new();
                    for (key, num, text) in entries {
                        map.insert(
                            key,
                            json!({"n": num, "s": text, "list": [num, text.clone()]}),
                        );
                    }
                    Value::Object(map)
                },
            )
        }

        proptest! {
            #[test]
            fn pretty_input_round_trips_to_compact(value in json_object()) {
                let pretty = serde_json::to_string_pretty(&value).unwrap();
                let compact = serde_json::to_string(&value).unwrap();
                let parsed = JsonParser::default().parse_body(&pretty).unwrap();
                prop_assert_eq!(parsed.to_string(), compact);
            }
        }
    }
}
