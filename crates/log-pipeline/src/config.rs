//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`SluiceConfig`](sluice_core::config::SluiceConfig)에서
//! 리스너/파서/배치 섹션을 모아 파이프라인이 쓰는 형태로 평탄화합니다.
//!
//! # 사용 예시
//! ```ignore
//! use sluice_core::config::SluiceConfig;
//! use sluice_log_pipeline::config::PipelineConfig;
//!
//! let core_config = SluiceConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sluice_core::config::SluiceConfig;
use sluice_core::types::{ParserKind, Protocol, ShutdownPolicy, SinkFailurePolicy, TcpFraming};

use crate::error::LogPipelineError;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // --- 리스너 ---
    /// 바인드 주소 (`ip:port`)
    pub bind_addr: String,
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

    // --- 파서 ---
    /// 본문 파서 종류
    pub parser: ParserKind,
    /// grok 패턴 목록
    pub grok_patterns: Vec<String>,
    /// 사용자 정의 grok 패턴
    pub custom_patterns: BTreeMap<String, String>,
    /// syslog 메타데이터 병합
    pub keep_syslog: bool,
    /// 병합 시 본문 필드 유지
    pub keep_message: bool,
    /// json 파서 입력 최대 크기
    pub max_input_size: usize,

    // --- 배치 ---
    /// 회전 주기 (초)
    pub schedule_secs: u64,
    /// 배치 파일 디렉토리
    pub tmp_dir: PathBuf,
    /// 채널 용량
    pub channel_capacity: usize,
    /// 종료 시 미완성 배치 처리
    pub shutdown_policy: ShutdownPolicy,
    /// 싱크 실패 시 배치 파일 처리
    pub sink_failure_policy: SinkFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&SluiceConfig::default())
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &SluiceConfig) -> Self {
        Self {
            bind_addr: core.listener.bind_addr(),
            protocol: core.listener.protocol,
            max_connections: core.listener.max_connections,
            max_message_size: core.listener.max_message_size,
            connection_timeout_secs: core.listener.connection_timeout_secs,
            framing: core.listener.framing,
            parser: core.parser.kind,
            grok_patterns: core.parser.grok_patterns.clone(),
            custom_patterns: core.parser.custom_patterns.clone(),
            keep_syslog: core.parser.keep_syslog,
            keep_message: core.parser.keep_message,
            max_input_size: core.parser.max_input_size,
            schedule_secs: core.batch.schedule_secs,
            tmp_dir: PathBuf::from(&core.batch.tmp_dir),
            channel_capacity: core.batch.channel_capacity,
            shutdown_policy: core.batch.shutdown_policy,
            sink_failure_policy: core.batch.sink_failure_policy,
        }
    }

    /// 회전 주기
    pub fn schedule(&self) -> Duration {
        Duration::from_secs(self.schedule_secs)
    }

    /// TCP 유휴 타임아웃
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        const MAX_CHANNEL_CAPACITY: usize = 10_000_000;
        const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

        if self.schedule_secs == 0 {
            return Err(config_err("schedule_secs", "must be at least 1 second"));
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(config_err(
                "channel_capacity",
                format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            ));
        }

        if self.max_message_size == 0 || self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(config_err(
                "max_message_size",
                format!("must be 1-{MAX_MESSAGE_SIZE}"),
            ));
        }

        if self.max_connections == 0 {
            return Err(config_err("max_connections", "must be greater than 0"));
        }

        if self.connection_timeout_secs == 0 {
            return Err(config_err(
                "connection_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.max_input_size == 0 {
            return Err(config_err("max_input_size", "must be greater than 0"));
        }

        if self.parser == ParserKind::Grok && self.grok_patterns.is_empty() {
            return Err(config_err(
                "grok_patterns",
                "at least one pattern is required for the grok parser",
            ));
        }

        if self.tmp_dir.as_os_str().is_empty() {
            return Err(config_err("tmp_dir", "must not be empty"));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 파이프라인 설정 빌더
///
/// 테스트와 라이브러리 사용자가 필요한 필드만 바꿔 설정을 만들 때 씁니다.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 바인드 주소를 설정합니다.
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// 수신 프로토콜을 설정합니다.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// TCP 프레이밍을 설정합니다.
    pub fn framing(mut self, framing: TcpFraming) -> Self {
        self.config.framing = framing;
        self
    }

    /// 파서 종류를 설정합니다.
    pub fn parser(mut self, parser: ParserKind) -> Self {
        self.config.parser = parser;
        self
    }

    /// grok 패턴 목록을 설정합니다.
    pub fn grok_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.grok_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// 사용자 정의 grok 패턴을 추가합니다.
    pub fn custom_pattern(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.config
            .custom_patterns
            .insert(name.into(), definition.into());
        self
    }

    /// 메타데이터 병합 여부를 설정합니다.
    pub fn keep_syslog(mut self, keep: bool) -> Self {
        self.config.keep_syslog = keep;
        self
    }

    /// 병합 시 본문 필드 유지 여부를 설정합니다.
    pub fn keep_message(mut self, keep: bool) -> Self {
        self.config.keep_message = keep;
        self
    }

    /// 회전 주기(초)를 설정합니다.
    pub fn schedule_secs(mut self, secs: u64) -> Self {
        self.config.schedule_secs = secs;
        self
    }

    /// 배치 파일 디렉토리를 설정합니다.
    pub fn tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tmp_dir = dir.into();
        self
    }

    /// 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 종료 정책을 설정합니다.
    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    /// 싱크 실패 정책을 설정합니다.
    pub fn sink_failure_policy(mut self, policy: SinkFailurePolicy) -> Self {
        self.config.sink_failure_policy = policy;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = SluiceConfig::default();
        core.listener.ip = "127.0.0.1".to_owned();
        core.listener.port = 5140;
        core.listener.protocol = Protocol::Both;
        core.parser.kind = ParserKind::Kv;
        core.parser.keep_syslog = true;
        core.batch.schedule_secs = 10;
        core.batch.tmp_dir = "/var/tmp/sluice".to_owned();

        let config = PipelineConfig::from_core(&core);
        assert_eq!(config.bind_addr, "127.0.0.1:5140");
        assert_eq!(config.protocol, Protocol::Both);
        assert_eq!(config.parser, ParserKind::Kv);
        assert!(config.keep_syslog);
        assert_eq!(config.schedule(), Duration::from_secs(10));
        assert_eq!(config.tmp_dir, PathBuf::from("/var/tmp/sluice"));
    }

    #[test]
    fn validate_rejects_zero_schedule() {
        let config = PipelineConfig {
            schedule_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LogPipelineError::Config { ref field, .. }) if field == "schedule_secs"
        ));
    }

    #[test]
    fn validate_rejects_grok_without_patterns() {
        let config = PipelineConfig {
            parser: ParserKind::Grok,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = PipelineConfigBuilder::new()
            .parser(ParserKind::Grok)
            .grok_patterns(["%{WORD:w}"])
            .custom_pattern("APPID", "[a-z]+")
            .schedule_secs(5)
            .channel_capacity(16)
            .shutdown_policy(ShutdownPolicy::Flush)
            .build()
            .unwrap();
        assert_eq!(config.grok_patterns, vec!["%{WORD:w}"]);
        assert_eq!(config.custom_patterns.len(), 1);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.shutdown_policy, ShutdownPolicy::Flush);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = PipelineConfigBuilder::new().channel_capacity(0).build();
        assert!(result.is_err());
    }
}
