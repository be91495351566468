//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for SluiceError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use sluice_core::error::{ConfigError, ParseError, PipelineError, SinkError, SluiceError};

/// 로그 파이프라인 도메인 에러
///
/// 레코드 단위 에러(파싱, 병합, 직렬화, 기록)와 시작/종료 단계의 에러를 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 본문 파싱 실패 (레코드 단위)
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 메타데이터 병합 실패: 파싱 결과가 JSON 객체가 아님 (레코드 단위)
    #[error("merge failure: parsed event is not a JSON object (got {kind})")]
    MergeFailure {
        /// 실제 JSON 타입 이름
        kind: &'static str,
    },

    /// 결과 직렬화 실패 (레코드 단위)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// grok 패턴 컴파일 실패 (시작 시 치명적)
    #[error("grok pattern error: '{pattern}': {reason}")]
    Pattern {
        /// 문제가 된 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 리스너 바인드 실패 (시작 시 치명적)
    #[error("listen error: {addr}: {reason}")]
    Listen {
        /// 바인드 주소
        addr: String,
        /// 에러 사유
        reason: String,
    },

    /// 수집기 에러 (소켓 I/O, 타임아웃 등)
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 수집 소스 유형 (syslog_udp, syslog_tcp)
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 배치 파일 I/O 에러
    #[error("batch file error: {path}: {source}")]
    BatchFile {
        /// 배치 파일 경로
        path: String,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// 종료 처리 에러 (최선 노력)
    #[error("shutdown error: {0}")]
    Shutdown(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogPipelineError {
    /// 레코드를 버리고 계속 진행할 수 있는 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse(_)
                | Self::MergeFailure { .. }
                | Self::Serialization(_)
                | Self::BatchFile { .. }
                | Self::Collector { .. }
                | Self::Sink(_)
        )
    }

    /// 메트릭 레이블로 쓰는 드롭 사유
    pub fn drop_reason(&self) -> &'static str {
        match self {
            Self::Parse(ParseError::MissingBodyField) => "missing_body",
            Self::Parse(_) => "parse",
            Self::MergeFailure { .. } => "merge",
            Self::Serialization(_) => "serialization",
            Self::BatchFile { .. } | Self::Io(_) => "write",
            _ => "other",
        }
    }
}

impl From<LogPipelineError> for SluiceError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Config { field, reason } => {
                SluiceError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Pattern { pattern, reason } => {
                SluiceError::Config(ConfigError::InvalidValue {
                    field: "parser.grok_patterns".to_owned(),
                    reason: format!("'{pattern}': {reason}"),
                })
            }
            LogPipelineError::Listen { addr, reason } => SluiceError::Listen { addr, reason },
            LogPipelineError::Parse(e) => SluiceError::Parse(e),
            LogPipelineError::Sink(e) => SluiceError::Sink(e),
            LogPipelineError::Io(e) => SluiceError::Io(e),
            LogPipelineError::Shutdown(reason) => {
                SluiceError::Pipeline(PipelineError::Shutdown(reason))
            }
            other => SluiceError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
