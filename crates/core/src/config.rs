//! 설정 관리 -- sluice.toml 파싱 및 런타임 설정
//!
//! [`SluiceConfig`]는 수집기의 모든 설정을 담는 최상위 구조체입니다.
//! 시작 시 한 번 만들어지고 이후에는 변경되지 않습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SLUICE_LISTENER_PORT=5514` 형식)
//! 3. 설정 파일 (`sluice.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sluice_core::error::SluiceError> {
//! use sluice_core::config::SluiceConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SluiceConfig::load("sluice.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SluiceConfig::parse("[parser]\nkind = \"cef\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SluiceError};
use crate::types::{
    OutputKind, ParserKind, Protocol, ShutdownPolicy, SinkFailurePolicy, TcpFraming,
};

/// sluice 통합 설정
///
/// `sluice.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SluiceConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 리스너 설정
    #[serde(default)]
    pub listener: ListenerConfig,
    /// 파서 설정
    #[serde(default)]
    pub parser: ParserConfig,
    /// 배치 회전 설정
    #[serde(default)]
    pub batch: BatchConfig,
    /// 출력 싱크 설정
    #[serde(default)]
    pub output: OutputConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SluiceConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SluiceError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SluiceError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SluiceError> {
        toml::from_str(toml_str).map_err(|e| {
            SluiceError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SLUICE_{SECTION}_{FIELD}`
    /// 예: `SLUICE_PARSER_KIND=kv`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SLUICE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SLUICE_GENERAL_LOG_FORMAT");
        override_bool(&mut self.general.verbose, "SLUICE_GENERAL_VERBOSE");
        override_string(&mut self.general.pid_file, "SLUICE_GENERAL_PID_FILE");

        // Listener
        override_string(&mut self.listener.ip, "SLUICE_LISTENER_IP");
        override_parse(&mut self.listener.port, "SLUICE_LISTENER_PORT");
        override_parse(&mut self.listener.protocol, "SLUICE_LISTENER_PROTOCOL");
        override_usize(
            &mut self.listener.max_connections,
            "SLUICE_LISTENER_MAX_CONNECTIONS",
        );
        override_usize(
            &mut self.listener.max_message_size,
            "SLUICE_LISTENER_MAX_MESSAGE_SIZE",
        );
        override_u64(
            &mut self.listener.connection_timeout_secs,
            "SLUICE_LISTENER_CONNECTION_TIMEOUT_SECS",
        );
        override_parse(&mut self.listener.framing, "SLUICE_LISTENER_FRAMING");

        // Parser
        override_parse(&mut self.parser.kind, "SLUICE_PARSER_KIND");
        override_csv(&mut self.parser.grok_patterns, "SLUICE_PARSER_GROK_PATTERNS");
        override_bool(&mut self.parser.keep_syslog, "SLUICE_PARSER_KEEP_SYSLOG");
        override_bool(&mut self.parser.keep_message, "SLUICE_PARSER_KEEP_MESSAGE");
        override_usize(
            &mut self.parser.max_input_size,
            "SLUICE_PARSER_MAX_INPUT_SIZE",
        );

        // Batch
        override_u64(&mut self.batch.schedule_secs, "SLUICE_BATCH_SCHEDULE_SECS");
        override_string(&mut self.batch.tmp_dir, "SLUICE_BATCH_TMP_DIR");
        override_usize(
            &mut self.batch.channel_capacity,
            "SLUICE_BATCH_CHANNEL_CAPACITY",
        );
        override_parse(
            &mut self.batch.shutdown_policy,
            "SLUICE_BATCH_SHUTDOWN_POLICY",
        );
        override_parse(
            &mut self.batch.sink_failure_policy,
            "SLUICE_BATCH_SINK_FAILURE_POLICY",
        );

        // Output
        override_parse(&mut self.output.kind, "SLUICE_OUTPUT_KIND");
        override_string(&mut self.output.dir, "SLUICE_OUTPUT_DIR");
        override_string(&mut self.output.prefix, "SLUICE_OUTPUT_PREFIX");

        // Metrics
        override_bool(&mut self.metrics.enabled, "SLUICE_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "SLUICE_METRICS_LISTEN_ADDR");
        override_parse(&mut self.metrics.port, "SLUICE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SluiceError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // listener
        if self.listener.ip.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "listener.ip",
                format!("'{}' is not a valid IP address", self.listener.ip),
            ));
        }
        if self.listener.port == 0 {
            return Err(invalid("listener.port", "must be between 1 and 65535"));
        }
        if self.listener.max_connections == 0 {
            return Err(invalid("listener.max_connections", "must be at least 1"));
        }
        if self.listener.max_message_size == 0 {
            return Err(invalid("listener.max_message_size", "must be at least 1"));
        }
        if self.listener.connection_timeout_secs == 0 {
            return Err(invalid(
                "listener.connection_timeout_secs",
                "must be at least 1",
            ));
        }

        // parser
        match self.parser.kind {
            ParserKind::Grok => {
                if self.parser.grok_patterns.iter().all(|p| p.trim().is_empty()) {
                    return Err(invalid(
                        "parser.grok_patterns",
                        "at least one pattern is required when parser.kind = grok",
                    ));
                }
            }
            _ => {
                if !self.parser.grok_patterns.is_empty() {
                    return Err(invalid(
                        "parser.grok_patterns",
                        format!(
                            "grok patterns are only valid with parser.kind = grok (got {})",
                            self.parser.kind
                        ),
                    ));
                }
            }
        }
        if self.parser.max_input_size == 0 {
            return Err(invalid("parser.max_input_size", "must be at least 1"));
        }
        if self.parser.keep_message && !self.parser.keep_syslog {
            warn!("parser.keep_message has no effect without parser.keep_syslog");
        }

        // batch
        if self.batch.schedule_secs == 0 {
            return Err(invalid("batch.schedule_secs", "must be at least 1 second"));
        }
        if self.batch.tmp_dir.is_empty() {
            return Err(invalid("batch.tmp_dir", "must not be empty"));
        }
        if self.batch.channel_capacity == 0 {
            return Err(invalid("batch.channel_capacity", "must be at least 1"));
        }

        // output
        if self.output.kind == OutputKind::File {
            if self.output.dir.is_empty() {
                return Err(invalid(
                    "output.dir",
                    "must not be empty when output.kind = file",
                ));
            }
            if self.output.prefix.is_empty() || self.output.prefix.contains('/') {
                return Err(invalid(
                    "output.prefix",
                    "must be a non-empty file name prefix without '/'",
                ));
            }
        }

        // metrics
        if self.metrics.enabled && self.metrics.listen_addr.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "metrics.listen_addr",
                format!("'{}' is not a valid IP address", self.metrics.listen_addr),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> SluiceError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// true면 log_level과 무관하게 debug
    pub verbose: bool,
    /// PID 파일 경로 (빈 문자열이면 사용 안 함)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            verbose: false,
            pid_file: String::new(),
        }
    }
}

/// syslog 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// 바인드 IP
    pub ip: String,
    /// 바인드 포트
    pub port: u16,
    /// tcp, udp, both
    pub protocol: Protocol,
    /// 최대 동시 TCP 연결 수
    pub max_connections: usize,
    /// 메시지 최대 크기 (바이트)
    pub max_message_size: usize,
    /// TCP 유휴 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// TCP 프레이밍
    pub framing: TcpFraming,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_owned(),
            port: 1514,
            protocol: Protocol::Udp,
            max_connections: 256,
            max_message_size: 65535,
            connection_timeout_secs: 300,
            framing: TcpFraming::Newline,
        }
    }
}

impl ListenerConfig {
    /// `ip:port` 형식의 바인드 주소
    pub fn bind_addr(&self) -> String {
        match self.ip.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{v6}]:{}", self.port),
            _ => format!("{}:{}", self.ip, self.port),
        }
    }
}

/// 파서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// grok, json, kv, cef, raw
    pub kind: ParserKind,
    /// grok 패턴 목록 (순서대로 시도)
    pub grok_patterns: Vec<String>,
    /// 사용자 정의 grok 패턴 (이름 -> 정의)
    pub custom_patterns: BTreeMap<String, String>,
    /// syslog 메타데이터를 파싱 결과에 병합
    pub keep_syslog: bool,
    /// 병합 시 본문 필드(content/message)도 포함
    pub keep_message: bool,
    /// json 파서 입력 최대 크기 (바이트)
    pub max_input_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            kind: ParserKind::Raw,
            grok_patterns: Vec::new(),
            custom_patterns: BTreeMap::new(),
            keep_syslog: false,
            keep_message: false,
            max_input_size: 1024 * 1024,
        }
    }
}

/// 배치 회전 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 회전 주기 (초)
    pub schedule_secs: u64,
    /// 배치 파일 디렉토리
    pub tmp_dir: String,
    /// 수집 소스 -> 소비자 채널 용량
    pub channel_capacity: usize,
    /// 종료 시 미완성 배치 처리
    pub shutdown_policy: ShutdownPolicy,
    /// 싱크 실패 시 배치 파일 처리
    pub sink_failure_policy: SinkFailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            schedule_secs: 30,
            tmp_dir: std::env::temp_dir().display().to_string(),
            channel_capacity: 1024,
            shutdown_policy: ShutdownPolicy::Discard,
            sink_failure_policy: SinkFailurePolicy::Discard,
        }
    }
}

/// 출력 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// file, stdout
    pub kind: OutputKind,
    /// file 싱크 대상 디렉토리
    pub dir: String,
    /// file 싱크 파일 이름 접두어
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: OutputKind::File,
            dir: "./output".to_owned(),
            prefix: "sluice".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// exporter 활성화 여부
    pub enabled: bool,
    /// HTTP 리스너 주소
    pub listen_addr: String,
    /// HTTP 리스너 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

/// `FromStr` 타입(포트, 열거형) 공용 오버라이드
fn override_parse<T>(target: &mut T, env_key: &str)
where
    T: FromStr,
    T::Err: Display,
{
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(e) => warn!(
                env_key,
                value = val.as_str(),
                error = %e,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
