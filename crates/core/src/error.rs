//! 에러 타입 -- 도메인별 에러 정의
//!
//! 치명적 에러(설정, 리스너 바인드)와 레코드 단위의 복구 가능한 에러를 구분합니다.
//! 레코드 단위 에러는 로그만 남기고 해당 레코드를 버립니다.

/// sluice 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SluiceError {
    /// 설정 관련 에러 (시작 시 치명적)
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 리스너 바인드 실패 (시작 시 치명적)
    #[error("listen error: {addr}: {reason}")]
    Listen { addr: String, reason: String },

    /// 레코드 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 출력 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SluiceError {
    /// 프로세스를 종료해야 하는 에러인지 확인합니다.
    ///
    /// 설정 에러와 리스너 바인드 에러만 치명적입니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Listen { .. })
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 레코드 파싱 에러
///
/// 모두 레코드 단위로 복구 가능하며, 파이프라인을 중단시키지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 레코드에 "content"/"message" 본문 필드가 없거나 문자열이 아님
    #[error("record has no string 'content' or 'message' field")]
    MissingBodyField,

    /// 어떤 grok 패턴도 매칭되지 않음
    #[error("no grok pattern matched ({tried} tried)")]
    NoPatternMatched { tried: usize },

    /// 본문이 유효한 JSON이 아님
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// key=value 쌍을 하나도 찾지 못함
    #[error("malformed kv: {0}")]
    MalformedKv(String),

    /// CEF 형식이 아님
    #[error("invalid CEF format: {0}")]
    InvalidCefFormat(String),

    /// 빈 레코드 (raw 파서)
    #[error("empty record")]
    EmptyRecord,
}

/// 출력 싱크 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 배치 파일 전달 실패
    #[error("delivery of '{path}' failed: {reason}")]
    Delivery { path: String, reason: String },

    /// I/O 에러
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 종료 처리 실패 (최선 노력, 프로세스 종료를 막지 않음)
    #[error("shutdown failed: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_listen_errors_are_fatal() {
        let config: SluiceError = ConfigError::InvalidValue {
            field: "listener.port".to_owned(),
            reason: "out of range".to_owned(),
        }
        .into();
        assert!(config.is_fatal());

        let listen = SluiceError::Listen {
            addr: "0.0.0.0:1514".to_owned(),
            reason: "address in use".to_owned(),
        };
        assert!(listen.is_fatal());
    }

    #[test]
    fn record_level_errors_are_not_fatal() {
        let parse: SluiceError = ParseError::NoPatternMatched { tried: 3 }.into();
        assert!(!parse.is_fatal());

        let sink: SluiceError = SinkError::Delivery {
            path: "/tmp/batch.jsonl".to_owned(),
            reason: "disk full".to_owned(),
        }
        .into();
        assert!(!sink.is_fatal());
    }

    #[test]
    fn parse_error_display() {
        assert!(
            ParseError::InvalidCefFormat("missing CEF: prefix".to_owned())
                .to_string()
                .contains("CEF")
        );
        assert!(
            ParseError::NoPatternMatched { tried: 2 }
                .to_string()
                .contains("2 tried")
        );
    }
}
