//! Grok 파서 -- 이름 있는 패턴을 정규식으로 확장하여 매칭합니다.
//!
//! `%{SYNTAX}`, `%{SYNTAX:field}`, `%{SYNTAX:field:type}` 참조를 내장 패턴 라이브러리와
//! 사용자 정의 패턴으로 재귀 확장한 뒤 [`regex::Regex`]로 컴파일합니다.
//! 컴파일은 시작 시 한 번만 수행하며, 알 수 없는 패턴, 순환 정의, 잘못된 정규식은
//! 설정 에러입니다.
//!
//! # 매칭 규칙
//! - 패턴 목록을 순서대로 시도하고 첫 번째 매칭 결과를 사용합니다.
//! - 매칭은 부분 검색입니다 (앵커 없음).
//! - 이름 있는 캡처만 결과에 포함되며, 참여하지 않은 선택적 캡처는 생략됩니다.
//! - 같은 필드 이름이 여러 번 나오면 마지막으로 참여한 캡처가 남습니다.
//! - `:type` 접미어는 허용하지만 값은 항상 문자열입니다.
//!
//! # 사용 예시
//! ```ignore
//! use sluice_log_pipeline::parser::GrokParser;
//!
//! let parser = GrokParser::new(
//!     &["%{IP:client} %{WORD:method} %{URIPATHPARAM:request}".to_owned()],
//!     &Default::default(),
//! )?;
//! let event = parser.parse_body("55.3.244.1 GET /index.html")?;
//! assert_eq!(event["method"], "GET");
//! ```

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde_json::{Map, Value};

use sluice_core::error::ParseError;
use sluice_core::types::RawRecord;

use super::{ParsedEvent, RecordParser};
use crate::error::LogPipelineError;

/// 확장 시 생성하는 캡처 그룹 이름 접두어
const GROUP_PREFIX: &str = "__grok";

/// 내장 grok 패턴 라이브러리
///
/// `regex` 크레이트가 지원하지 않는 lookaround, atomic group은 쓰지 않습니다.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("USERNAME", r"[a-zA-Z0-9._-]+"),
    ("USER", r"%{USERNAME}"),
    ("EMAILLOCALPART", r"[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*"),
    ("EMAILADDRESS", r"%{EMAILLOCALPART}@%{HOSTNAME}"),
    ("INT", r"(?:[+-]?(?:[0-9]+))"),
    ("BASE10NUM", r"(?:[+-]?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+))"),
    ("NUMBER", r"(?:%{BASE10NUM})"),
    ("BASE16NUM", r"(?:0[xX])?[0-9A-Fa-f]+"),
    ("POSINT", r"\b(?:[1-9][0-9]*)\b"),
    ("NONNEGINT", r"\b(?:[0-9]+)\b"),
    ("WORD", r"\b\w+\b"),
    ("NOTSPACE", r"\S+"),
    ("SPACE", r"\s*"),
    ("DATA", r".*?"),
    ("GREEDYDATA", r".*"),
    ("QUOTEDSTRING", r#"(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`)"#),
    ("QS", r"%{QUOTEDSTRING}"),
    ("UUID", r"[A-Fa-f0-9]{8}-(?:[A-Fa-f0-9]{4}-){3}[A-Fa-f0-9]{12}"),
    // 네트워크
    ("CISCOMAC", r"(?:(?:[A-Fa-f0-9]{4}\.){2}[A-Fa-f0-9]{4})"),
    ("WINDOWSMAC", r"(?:(?:[A-Fa-f0-9]{2}-){5}[A-Fa-f0-9]{2})"),
    ("COMMONMAC", r"(?:(?:[A-Fa-f0-9]{2}:){5}[A-Fa-f0-9]{2})"),
    ("MAC", r"(?:%{CISCOMAC}|%{WINDOWSMAC}|%{COMMONMAC})"),
    (
        "IPV4",
        r"(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])",
    ),
    (
        "IPV6",
        r"(?:(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}|(?:[0-9A-Fa-f]{1,4}:){1,6}:[0-9A-Fa-f]{1,4}|(?:[0-9A-Fa-f]{1,4}:){1,5}(?::[0-9A-Fa-f]{1,4}){1,2}|(?:[0-9A-Fa-f]{1,4}:){1,4}(?::[0-9A-Fa-f]{1,4}){1,3}|(?:[0-9A-Fa-f]{1,4}:){1,3}(?::[0-9A-Fa-f]{1,4}){1,4}|(?:[0-9A-Fa-f]{1,4}:){1,2}(?::[0-9A-Fa-f]{1,4}){1,5}|[0-9A-Fa-f]{1,4}:(?::[0-9A-Fa-f]{1,4}){1,6}|:(?:(?::[0-9A-Fa-f]{1,4}){1,7}|:)|(?:[0-9A-Fa-f]{1,4}:){1,7}:)",
    ),
    ("IP", r"(?:%{IPV6}|%{IPV4})"),
    (
        "HOSTNAME",
        r"\b(?:[0-9A-Za-z][0-9A-Za-z-]{0,62})(?:\.(?:[0-9A-Za-z][0-9A-Za-z-]{0,62}))*\.?",
    ),
    ("HOST", r"%{HOSTNAME}"),
    ("IPORHOST", r"(?:%{IP}|%{HOSTNAME})"),
    ("HOSTPORT", r"%{IPORHOST}:%{POSINT}"),
    // 경로, URI
    ("UNIXPATH", r"(?:/[\w_%!$@:.,+~-]*)+"),
    ("WINPATH", r"(?:[A-Za-z]+:|\\)(?:\\[^\\?*]*)+"),
    ("PATH", r"(?:%{UNIXPATH}|%{WINPATH})"),
    ("URIPROTO", r"[A-Za-z][A-Za-z0-9+\-.]+"),
    ("URIHOST", r"%{IPORHOST}(?::%{POSINT})?"),
    ("URIPATH", r"(?:/[A-Za-z0-9$.+!*'(){},~:;=@#%&_\-]*)+"),
    ("URIPARAM", r"\?[A-Za-z0-9$.+!*'|(){},~@#%&/=:;_?\-\[\]<>]*"),
    ("URIPATHPARAM", r"%{URIPATH}(?:%{URIPARAM})?"),
    (
        "URI",
        r"%{URIPROTO}://(?:%{USER}(?::[^@]*)?@)?(?:%{URIHOST})?(?:%{URIPATHPARAM})?",
    ),
    // 날짜, 시간
    (
        "MONTH",
        r"\b(?:[Jj]an(?:uary)?|[Ff]eb(?:ruary)?|[Mm]ar(?:ch)?|[Aa]pr(?:il)?|[Mm]ay|[Jj]un(?:e)?|[Jj]ul(?:y)?|[Aa]ug(?:ust)?|[Ss]ep(?:tember)?|[Oo]ct(?:ober)?|[Nn]ov(?:ember)?|[Dd]ec(?:ember)?)\b",
    ),
    ("MONTHNUM", r"(?:0?[1-9]|1[0-2])"),
    ("MONTHDAY", r"(?:(?:0[1-9])|(?:[12][0-9])|(?:3[01])|[1-9])"),
    (
        "DAY",
        r"(?:Mon(?:day)?|Tue(?:sday)?|Wed(?:nesday)?|Thu(?:rsday)?|Fri(?:day)?|Sat(?:urday)?|Sun(?:day)?)",
    ),
    ("YEAR", r"(?:\d\d){1,2}"),
    ("HOUR", r"(?:2[0123]|[01]?[0-9])"),
    ("MINUTE", r"(?:[0-5][0-9])"),
    ("SECOND", r"(?:(?:[0-5]?[0-9]|60)(?:[:.,][0-9]+)?)"),
    ("TIME", r"%{HOUR}:%{MINUTE}(?::%{SECOND})?"),
    ("ISO8601_TIMEZONE", r"(?:Z|[+-]%{HOUR}(?::?%{MINUTE}))"),
    (
        "TIMESTAMP_ISO8601",
        r"%{YEAR}-%{MONTHNUM}-%{MONTHDAY}[T ]%{HOUR}:?%{MINUTE}(?::?%{SECOND})?%{ISO8601_TIMEZONE}?",
    ),
    ("SYSLOGTIMESTAMP", r"%{MONTH} +%{MONTHDAY} %{TIME}"),
    ("HTTPDATE", r"%{MONTHDAY}/%{MONTH}/%{YEAR}:%{TIME} %{INT}"),
    // syslog
    ("PROG", r"[\x21-\x5a\x5c\x5e-\x7e]+"),
    ("SYSLOGPROG", r"%{PROG}(?:\[%{POSINT}\])?"),
    ("SYSLOGHOST", r"%{IPORHOST}"),
    (
        "LOGLEVEL",
        r"(?:[Aa]lert|ALERT|[Tt]race|TRACE|[Dd]ebug|DEBUG|[Nn]otice|NOTICE|[Ii]nfo|INFO|[Ww]arn?(?:ing)?|WARN?(?:ING)?|[Ee]rr?(?:or)?|ERR?(?:OR)?|[Cc]rit?(?:ical)?|CRIT?(?:ICAL)?|[Ff]atal|FATAL|[Ss]evere|SEVERE|EMERG(?:ENCY)?|[Ee]merg(?:ency)?)",
    ),
];

/// 캡처 그룹과 결과 필드 이름의 대응
#[derive(Debug, Clone)]
struct FieldCapture {
    group: String,
    field: String,
}

/// 컴파일된 grok 패턴 하나
#[derive(Debug, Clone)]
pub struct GrokPattern {
    source: String,
    regex: Regex,
    captures: Vec<FieldCapture>,
}

impl GrokPattern {
    /// 원본 패턴 문자열
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 확장된 정규식
    pub fn expanded(&self) -> &str {
        self.regex.as_str()
    }

    /// 텍스트를 검색하여 이름 있는 캡처를 반환합니다. 매칭되지 않으면 None.
    pub fn captures(&self, text: &str) -> Option<Map<String, Value>> {
        let caps = self.regex.captures(text)?;
        let mut fields = Map::new();
        for capture in &self.captures {
            if let Some(m) = caps.name(&capture.group) {
                fields.insert(capture.field.clone(), Value::String(m.as_str().to_owned()));
            }
        }
        Some(fields)
    }
}

/// grok 패턴 정의 모음
#[derive(Debug, Clone)]
pub struct GrokLibrary {
    definitions: HashMap<String, String>,
}

impl GrokLibrary {
    /// 내장 패턴만 가진 라이브러리를 생성합니다.
    pub fn with_builtins() -> Self {
        Self {
            definitions: BUILTIN_PATTERNS
                .iter()
                .map(|(name, def)| ((*name).to_owned(), (*def).to_owned()))
                .collect(),
        }
    }

    /// 패턴 정의를 추가합니다. 같은 이름의 내장 패턴은 덮어씁니다.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        definition: impl Into<String>,
    ) -> Result<(), LogPipelineError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(LogPipelineError::Pattern {
                pattern: name,
                reason: "pattern names may only contain letters, digits and '_'".to_owned(),
            });
        }
        self.definitions.insert(name, definition.into());
        Ok(())
    }

    /// 정의된 패턴 수
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// grok 패턴을 정규식으로 확장하여 컴파일합니다.
    pub fn compile(&self, pattern: &str) -> Result<GrokPattern, LogPipelineError> {
        let to_err = |reason: String| LogPipelineError::Pattern {
            pattern: pattern.to_owned(),
            reason,
        };

        let mut expanded = String::with_capacity(pattern.len() * 4);
        let mut fields = Vec::new();
        let mut stack = Vec::new();
        self.expand(pattern, &mut stack, &mut fields, &mut expanded)
            .map_err(to_err)?;

        let regex = Regex::new(&expanded).map_err(|e| to_err(e.to_string()))?;

        // 정규식에 직접 쓴 이름 있는 그룹도 결과 필드로 취급
        let captures = regex
            .capture_names()
            .flatten()
            .map(|group| {
                let field = match group.strip_prefix(GROUP_PREFIX) {
                    Some(idx) => idx
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| fields.get(i).cloned())
                        .unwrap_or_else(|| group.to_owned()),
                    None => group.to_owned(),
                };
                FieldCapture {
                    group: group.to_owned(),
                    field,
                }
            })
            .collect();

        Ok(GrokPattern {
            source: pattern.to_owned(),
            regex,
            captures,
        })
    }

    /// `%{...}` 참조를 재귀적으로 확장합니다.
    ///
    /// `stack`은 현재 확장 중인 패턴 이름 경로이며 순환 정의 검출에 씁니다.
    fn expand(
        &self,
        pattern: &str,
        stack: &mut Vec<String>,
        fields: &mut Vec<String>,
        out: &mut String,
    ) -> Result<(), String> {
        let mut rest = pattern;
        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| format!("unterminated '%{{' in '{pattern}'"))?;
            let reference = &after[..end];

            let mut parts = reference.splitn(3, ':');
            let name = parts.next().unwrap_or_default();
            let field = parts.next().filter(|f| !f.is_empty());

            if !is_valid_name(name) {
                return Err(format!("invalid pattern reference '%{{{reference}}}'"));
            }
            let definition = self
                .definitions
                .get(name)
                .ok_or_else(|| format!("unknown pattern '{name}'"))?;
            if stack.iter().any(|s| s == name) {
                return Err(format!(
                    "recursive pattern definition: {} -> {name}",
                    stack.join(" -> ")
                ));
            }

            match field {
                Some(field) => {
                    out.push_str(&format!("(?P<{GROUP_PREFIX}{}>", fields.len()));
                    fields.push(field.to_owned());
                }
                None => out.push_str("(?:"),
            }

            stack.push(name.to_owned());
            self.expand(definition, stack, fields, out)?;
            stack.pop();
            out.push(')');

            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(())
    }
}

impl Default for GrokLibrary {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Grok 파서
///
/// 순서가 있는 패턴 목록을 본문에 차례로 적용하고, 첫 번째로 매칭된 패턴의
/// 캡처를 JSON 객체로 반환합니다.
#[derive(Debug)]
pub struct GrokParser {
    patterns: Vec<GrokPattern>,
}

impl GrokParser {
    /// 패턴 목록과 사용자 정의 패턴으로 파서를 생성합니다.
    ///
    /// 사용자 정의 패턴은 참조 여부와 관계없이 모두 컴파일하여 검증합니다.
    pub fn new(
        patterns: &[String],
        custom_patterns: &BTreeMap<String, String>,
    ) -> Result<Self, LogPipelineError> {
        let mut library = GrokLibrary::with_builtins();
        for (name, definition) in custom_patterns {
            library.add(name.clone(), definition.clone())?;
        }
        for name in custom_patterns.keys() {
            library.compile(&format!("%{{{name}}}"))?;
        }

        let patterns = patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| library.compile(p))
            .collect::<Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            return Err(LogPipelineError::Config {
                field: "grok_patterns".to_owned(),
                reason: "at least one pattern is required for the grok parser".to_owned(),
            });
        }

        tracing::debug!(patterns = patterns.len(), "compiled grok patterns");
        Ok(Self { patterns })
    }

    /// 컴파일된 패턴 목록
    pub fn patterns(&self) -> &[GrokPattern] {
        &self.patterns
    }

    /// 본문 텍스트를 파싱합니다.
    pub fn parse_body(&self, body: &str) -> Result<ParsedEvent, ParseError> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.captures(body))
            .map(Value::Object)
            .ok_or(ParseError::NoPatternMatched {
                tried: self.patterns.len(),
            })
    }
}

impl RecordParser for GrokParser {
    fn format_name(&self) -> &str {
        "grok"
    }

    fn parse(&self, record: &RawRecord) -> Result<ParsedEvent, ParseError> {
        self.parse_body(record.body()?)
    }
}
