//! 도메인 타입 -- 수집기 전역에서 사용되는 공통 타입
//!
//! 수집 소스가 만드는 [`RawRecord`]와, 설정에서 선택하는 열거형
//! ([`ParserKind`], [`Protocol`] 등)을 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// 본문 필드 이름 (우선)
pub const CONTENT_FIELD: &str = "content";
/// 본문 필드 이름 (대체)
pub const MESSAGE_FIELD: &str = "message";

/// 수신된 syslog 메시지 하나를 나타내는 필드 맵
///
/// 수집 소스가 디코딩한 메타데이터(facility, severity, hostname 등)와
/// 본문 텍스트(`content` 또는 `message`)를 담습니다. 필드 순서는 의미가 없습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// 빈 레코드를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드를 추가합니다. 같은 키가 있으면 덮어씁니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 빌더 스타일 필드 추가
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 필드를 조회합니다.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 전체 필드 맵
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// 필드 개수
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 본문 텍스트를 반환합니다.
    ///
    /// `content`가 있으면 `message`보다 우선합니다. 선택된 필드가 문자열이
    /// 아니거나 둘 다 없으면 [`ParseError::MissingBodyField`]를 반환합니다.
    pub fn body(&self) -> Result<&str, ParseError> {
        let value = self
            .fields
            .get(CONTENT_FIELD)
            .or_else(|| self.fields.get(MESSAGE_FIELD))
            .ok_or(ParseError::MissingBodyField)?;
        value.as_str().ok_or(ParseError::MissingBodyField)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// 본문 파서 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// 순서가 있는 grok 패턴 목록, 첫 매칭 사용
    Grok,
    /// JSON 본문 정규화
    Json,
    /// 공백 구분 key=value
    Kv,
    /// ArcSight Common Event Format
    Cef,
    /// 레코드 전체를 그대로 직렬화
    #[default]
    Raw,
}

impl ParserKind {
    /// 설정/로그에서 쓰는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grok => "grok",
            Self::Json => "json",
            Self::Kv => "kv",
            Self::Cef => "cef",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grok" => Ok(Self::Grok),
            "json" => Ok(Self::Json),
            "kv" => Ok(Self::Kv),
            "cef" => Ok(Self::Cef),
            "raw" => Ok(Self::Raw),
            other => Err(format!(
                "unknown parser '{other}', expected one of: grok, json, kv, cef, raw"
            )),
        }
    }
}

/// 수신 프로토콜
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP만
    Tcp,
    /// UDP만
    #[default]
    Udp,
    /// 같은 주소에서 TCP와 UDP 모두
    Both,
}

impl Protocol {
    /// TCP 리스너를 열어야 하는지
    pub fn includes_tcp(&self) -> bool {
        matches!(self, Self::Tcp | Self::Both)
    }

    /// UDP 소켓을 열어야 하는지
    pub fn includes_udp(&self) -> bool {
        matches!(self, Self::Udp | Self::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown protocol '{other}', expected one of: tcp, udp, both"
            )),
        }
    }
}

/// TCP 스트림 프레이밍 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcpFraming {
    /// 줄바꿈 구분
    #[default]
    Newline,
    /// RFC 6587 octet counting (`<len> <msg>`)
    OctetCounting,
}

impl FromStr for TcpFraming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newline" => Ok(Self::Newline),
            "octet_counting" => Ok(Self::OctetCounting),
            other => Err(format!(
                "unknown framing '{other}', expected one of: newline, octet_counting"
            )),
        }
    }
}

/// 종료 시 미완성 배치 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// 전달하지 않고 파일 삭제
    #[default]
    Discard,
    /// 레코드가 있으면 싱크에 전달한 뒤 삭제
    Flush,
}

impl FromStr for ShutdownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "flush" => Ok(Self::Flush),
            other => Err(format!(
                "unknown shutdown policy '{other}', expected one of: discard, flush"
            )),
        }
    }
}

/// 싱크 전달 실패 시 배치 파일 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFailurePolicy {
    /// 결과와 무관하게 파일 삭제
    #[default]
    Discard,
    /// 실패한 파일은 디스크에 남김
    Retain,
}

impl FromStr for SinkFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "retain" => Ok(Self::Retain),
            other => Err(format!(
                "unknown sink failure policy '{other}', expected one of: discard, retain"
            )),
        }
    }
}

/// 출력 싱크 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// 디렉토리에 배치 파일 복사
    #[default]
    File,
    /// 표준 출력
    Stdout,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!(
                "unknown output '{other}', expected one of: file, stdout"
            )),
        }
    }
}
