//! Syslog 메시지 디코더 -- RFC 5424 / RFC 3164 자동 감지
//!
//! 리스너가 받은 원시 바이트를 [`RawRecord`]로 변환합니다.
//! 디코딩은 실패하지 않습니다. 형식을 알 수 없는 메시지는 `content` 필드만 가진
//! 레코드가 되며, 본문 필드 검사는 소비자 루프에서 이루어집니다.
//!
//! # 감지 규칙
//! ```text
//! <PRI>VERSION TIMESTAMP HOSTNAME APP-NAME PROCID MSGID SD MSG   -> RFC 5424
//! <PRI>MMM DD HH:MM:SS HOSTNAME TAG[PID]: CONTENT               -> RFC 3164
//! PRI 없음                                                       -> { content }
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use sluice_log_pipeline::collector::decoder::decode;
//!
//! let record = decode(b"<34>1 2024-01-15T12:00:00Z myhost sshd 1234 - - Failed", "10.0.0.1:514");
//! assert_eq!(record.body()?, "Failed");
//! ```

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, Utc};

use sluice_core::types::RawRecord;

/// 유효한 최대 PRI 값 (facility 23 * 8 + severity 7)
const MAX_SYSLOG_PRI: u16 = 191;

/// RFC 5424 NILVALUE
const NILVALUE: &str = "-";

/// BSD 타임스탬프 길이 (`Jan 15 12:00:00`)
const BSD_TIMESTAMP_LEN: usize = 15;

/// 원시 syslog 메시지를 레코드로 디코딩합니다.
///
/// `client`는 송신자 주소이며 모든 레코드에 `client` 필드로 들어갑니다.
pub fn decode(raw: &[u8], client: &str) -> RawRecord {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches(['\n', '\r', '\0']);

    let mut record = match split_pri(text) {
        Some((pri, rest)) => match split_version(rest) {
            Some((version, body)) => decode_rfc5424(pri, version, body),
            None => decode_rfc3164(pri, rest),
        },
        None => RawRecord::new().with("content", text),
    };

    record.insert("client", client);
    record.insert("tls_peer", "");
    record
}

/// `<PRI>` 접두어를 분리합니다. PRI가 없거나 범위를 벗어나면 None.
fn split_pri(text: &str) -> Option<(u16, &str)> {
    let inner = text.strip_prefix('<')?;
    let end = inner.find('>')?;
    let digits = &inner[..end];
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pri: u16 = digits.parse().ok()?;
    if pri > MAX_SYSLOG_PRI {
        return None;
    }
    Some((pri, &inner[end + 1..]))
}

/// PRI 뒤의 `VERSION SP`를 분리합니다. 숫자 뒤에 공백이 오면 RFC 5424입니다.
fn split_version(rest: &str) -> Option<(u16, &str)> {
    let space = rest.find(' ')?;
    let digits = &rest[..space];
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version: u16 = digits.parse().ok()?;
    if version == 0 {
        return None;
    }
    Some((version, &rest[space + 1..]))
}

/// PRI = facility * 8 + severity
fn decode_pri(pri: u16) -> (u16, u16) {
    (pri / 8, pri % 8)
}

fn with_pri(pri: u16) -> RawRecord {
    let (facility, severity) = decode_pri(pri);
    RawRecord::new()
        .with("priority", pri)
        .with("facility", facility)
        .with("severity", severity)
}

fn nilvalue_to_empty(value: &str) -> &str {
    if value == NILVALUE { "" } else { value }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 5424 본문 디코딩
///
/// 형식: `TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA MSG`
/// 필드가 모자라면 빈 문자열로 채웁니다.
fn decode_rfc5424(pri: u16, version: u16, body: &str) -> RawRecord {
    let mut parts = body.splitn(6, ' ');
    let mut next = || parts.next().unwrap_or("");

    let timestamp = next();
    let hostname = next();
    let app_name = next();
    let proc_id = next();
    let msg_id = next();
    let sd_and_msg = next();

    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
        })
        .unwrap_or_else(|_| now_rfc3339());

    let (structured_data, message) = split_sd_and_message(sd_and_msg);

    with_pri(pri)
        .with("version", version)
        .with("timestamp", timestamp)
        .with("hostname", nilvalue_to_empty(hostname))
        .with("app_name", nilvalue_to_empty(app_name))
        .with("proc_id", nilvalue_to_empty(proc_id))
        .with("msg_id", nilvalue_to_empty(msg_id))
        .with("structured_data", structured_data)
        .with("message", message)
}

/// Structured Data와 메시지를 분리합니다.
///
/// SD는 NILVALUE이거나 하나 이상의 `[...]` 블록입니다. 블록 안의 따옴표 값은
/// `\"`, `\]` 이스케이프를 가질 수 있습니다.
fn split_sd_and_message(input: &str) -> (String, String) {
    if input == NILVALUE {
        return (String::new(), String::new());
    }
    if let Some(msg) = input.strip_prefix("- ") {
        return (String::new(), msg.to_owned());
    }
    if !input.starts_with('[') {
        return (String::new(), input.to_owned());
    }

    let bytes = input.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos] == b'[' {
        match element_end(&bytes[pos..]) {
            Some(len) => pos += len,
            // 닫히지 않은 SD는 전체를 SD로 간주
            None => return (input.to_owned(), String::new()),
        }
    }

    let sd = &input[..pos];
    let msg = input[pos..].strip_prefix(' ').unwrap_or(&input[pos..]);
    (sd.to_owned(), msg.to_owned())
}

/// `[`로 시작하는 SD 요소 하나의 바이트 길이 (닫는 `]` 포함)
fn element_end(bytes: &[u8]) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quote => escaped = true,
            b'"' => in_quote = !in_quote,
            b']' if !in_quote => return Some(idx + 1),
            _ => {}
        }
    }
    None
}

/// RFC 3164 (BSD syslog) 본문을 최선 노력으로 디코딩합니다.
///
/// 타임스탬프를 읽지 못하면 수신 시각을 쓰고 본문 전체를 content로 둡니다.
fn decode_rfc3164(pri: u16, body: &str) -> RawRecord {
    let parsed = body
        .get(..BSD_TIMESTAMP_LEN)
        .and_then(parse_bsd_timestamp)
        .map(|ts| (ts, body[BSD_TIMESTAMP_LEN..].trim_start()));

    let Some((timestamp, rest)) = parsed else {
        return with_pri(pri)
            .with("timestamp", now_rfc3339())
            .with("hostname", "")
            .with("tag", "")
            .with("content", body);
    };

    let (hostname, tag_and_content) = match rest.split_once(' ') {
        Some((host, remainder)) => (host, remainder),
        None => ("", rest),
    };
    let (tag, content) = split_tag(tag_and_content);

    with_pri(pri)
        .with("timestamp", timestamp)
        .with("hostname", hostname)
        .with("tag", tag)
        .with("content", content)
}

/// `TAG[PID]: CONTENT` 또는 `TAG: CONTENT`에서 태그와 본문을 분리합니다.
///
/// 콜론으로 끝나는 태그가 없으면 태그는 비고 전체가 본문입니다.
fn split_tag(input: &str) -> (&str, &str) {
    let Some(end) = input.find(['[', ':', ' ']) else {
        return ("", input);
    };
    let tag = &input[..end];
    if tag.is_empty() {
        return ("", input);
    }

    let after_tag = &input[end..];
    let after_pid = match after_tag.strip_prefix('[') {
        Some(pid_and_rest) => match pid_and_rest.find(']') {
            Some(close) => &pid_and_rest[close + 1..],
            None => return ("", input),
        },
        None => after_tag,
    };

    match after_pid.strip_prefix(':') {
        Some(content) => (tag, content.strip_prefix(' ').unwrap_or(content)),
        None => ("", input),
    }
}

/// BSD syslog 타임스탬프를 파싱합니다.
///
/// 형식: `MMM DD HH:MM:SS` (예: `Jan 15 12:00:00`, `Jan  5 01:02:03`).
/// 연도 정보가 없으므로 현재 연도를 가정합니다.
fn parse_bsd_timestamp(timestamp: &str) -> Option<String> {
    let current_year = Utc::now().year();
    let with_year = format!("{current_year} {timestamp}");
    let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S").ok()?;
    let utc = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
    Some(utc.to_rfc3339_opts(SecondsFormat::Secs, true))
}
