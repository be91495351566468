//! 파이프라인 오케스트레이션 -- 수집, 소비자 루프, 종료 조정을 묶습니다.
//!
//! [`LogPipeline`]은 core의 [`Pipeline`] trait을 구현하여
//! `sluice-daemon`에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! IngestionSource -> mpsc<Envelope> -> consumer (RotationEngine) -> OutputSink
//!        |                                   |
//!   InFlightGuard 획득 ------------------ 처리 후 해제
//! ```
//!
//! # 종료 순서
//! 1. 수집 소스 정지 (리스너와 연결 태스크 join)
//! 2. 처리 중 레코드가 0이 될 때까지 대기
//! 3. 채널이 닫히면 소비자 태스크가 회전 엔진을 반환
//! 4. 종료 정책 적용 (discard / flush)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sluice_core::error::{PipelineError, SluiceError};
use sluice_core::pipeline::{HealthStatus, OutputSink, Pipeline};
use sluice_core::types::ShutdownPolicy;

use crate::batch::{EngineStats, RecordProcessor, RotationEngine};
use crate::collector::{Envelope, IngestionSource, RecordSender};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::inflight::InFlightTracker;
use crate::sink::StdoutSink;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 로그 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use sluice_log_pipeline::{LogPipeline, LogPipelineBuilder};
///
/// let mut pipeline = LogPipelineBuilder::new()
///     .config(config)
///     .sink(sink)
///     .build()?;
///
/// pipeline.start().await?;
/// // ...
/// pipeline.stop().await?;
/// ```
pub struct LogPipeline {
    config: PipelineConfig,
    state: PipelineState,
    sink: Arc<dyn OutputSink>,
    /// 시작 전에 미리 컴파일한 파서 (grok 에러를 build 단계에서 드러냄)
    processor: Option<RecordProcessor>,
    tracker: InFlightTracker,
    source: Option<IngestionSource>,
    consumer: Option<JoinHandle<RotationEngine>>,
    tcp_addr: Option<SocketAddr>,
    udp_addr: Option<SocketAddr>,
    last_stats: Option<EngineStats>,
}

impl std::fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPipeline")
            .field("state", &self.state_name())
            .field("tcp_addr", &self.tcp_addr)
            .field("udp_addr", &self.udp_addr)
            .finish_non_exhaustive()
    }
}

impl LogPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// TCP 리스너 주소 (실행 중, TCP 활성 시)
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp_addr
    }

    /// UDP 소켓 주소 (실행 중, UDP 활성 시)
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.udp_addr
    }

    /// 수신했지만 아직 처리되지 않은 레코드 수
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    /// 마지막 정지 시점의 처리 통계
    pub fn last_stats(&self) -> Option<EngineStats> {
        self.last_stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn start_inner(&mut self) -> Result<(), LogPipelineError> {
        let processor = match self.processor.take() {
            Some(processor) => processor,
            None => RecordProcessor::from_config(&self.config)?,
        };

        // 배치 디렉토리와 첫 파일은 리스너보다 먼저 준비
        let engine = RotationEngine::new(&self.config, processor, Arc::clone(&self.sink)).await?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let sender = RecordSender::new(tx, self.tracker.clone());
        let source = match IngestionSource::bind(&self.config, sender).await {
            Ok(source) => source,
            Err(e) => {
                if let Err(cleanup) = engine.finalize(ShutdownPolicy::Discard).await {
                    debug!(error = %cleanup, "failed to clean up batch file after bind error");
                }
                return Err(e);
            }
        };

        self.tcp_addr = source.tcp_addr();
        self.udp_addr = source.udp_addr();
        self.source = Some(source);
        self.consumer = Some(tokio::spawn(consume(rx, engine)));
        Ok(())
    }

    async fn stop_inner(&mut self) -> Result<(), LogPipelineError> {
        // 1. 새 레코드 수신 중단
        if let Some(source) = self.source.take() {
            source.stop().await;
        }

        // 2. 처리 중 레코드 소진
        let pending = self.tracker.in_flight();
        if pending > 0 {
            info!(in_flight = pending, "draining in-flight records");
        }
        self.tracker.wait_idle().await;

        // 3. 송신측이 모두 drop되어 소비자 루프가 끝나고 엔진을 반환
        let Some(consumer) = self.consumer.take() else {
            return Ok(());
        };
        let engine = consumer
            .await
            .map_err(|e| LogPipelineError::Shutdown(format!("consumer task failed: {e}")))?;

        // 4. 종료 정책
        let stats = engine
            .finalize(self.config.shutdown_policy)
            .await
            .map_err(|e| LogPipelineError::Shutdown(e.to_string()))?;

        info!(
            written = stats.written,
            dropped = stats.dropped,
            rotations = stats.rotations,
            policy = ?self.config.shutdown_policy,
            "batch finalized"
        );
        self.last_stats = Some(stats);
        Ok(())
    }
}

/// 소비자 루프 -- 채널이 닫힐 때까지 레코드를 순서대로 처리합니다.
async fn consume(mut rx: mpsc::Receiver<Envelope>, mut engine: RotationEngine) -> RotationEngine {
    while let Some(Envelope { record, guard }) = rx.recv().await {
        engine.handle(&record).await;
        drop(guard);
    }
    debug!("record channel closed, consumer exiting");
    engine
}

impl Pipeline for LogPipeline {
    async fn start(&mut self) -> Result<(), SluiceError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            bind_addr = %self.config.bind_addr,
            protocol = %self.config.protocol,
            parser = %self.config.parser,
            "starting log pipeline"
        );

        self.start_inner().await?;

        self.state = PipelineState::Running;
        info!("log pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SluiceError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping log pipeline");
        let result = self.stop_inner().await;

        self.state = PipelineState::Stopped;
        self.tcp_addr = None;
        self.udp_addr = None;

        match result {
            Ok(()) => {
                info!("log pipeline stopped");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "log pipeline stopped with errors");
                Err(e.into())
            }
        }
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.consumer.as_ref().is_none_or(JoinHandle::is_finished) {
                    return HealthStatus::Unhealthy("consumer task exited".to_owned());
                }
                let in_flight = self.tracker.in_flight();
                if in_flight >= self.config.channel_capacity {
                    HealthStatus::Degraded(format!(
                        "record channel full ({in_flight} in flight)"
                    ))
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 로그 파이프라인 빌더
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    sink: Option<Arc<dyn OutputSink>>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            sink: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 출력 싱크를 지정합니다. 지정하지 않으면 표준 출력 싱크를 씁니다.
    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 설정을 검증하고 파서를 컴파일하여 파이프라인을 만듭니다.
    ///
    /// 잘못된 설정과 grok 패턴 에러는 여기서 반환되며, 이때는 어떤 소켓도 열리지 않습니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        self.config.validate()?;
        let processor = RecordProcessor::from_config(&self.config)?;

        Ok(LogPipeline {
            state: PipelineState::Initialized,
            sink: self.sink.unwrap_or_else(|| Arc::new(StdoutSink::new())),
            processor: Some(processor),
            tracker: InFlightTracker::new(),
            source: None,
            consumer: None,
            tcp_addr: None,
            udp_addr: None,
            last_stats: None,
            config: self.config,
        })
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use crate::sink::testing::RecordingSink;
    use sluice_core::types::{ParserKind, Protocol};
    use std::time::Duration;

    fn config(tmp: &std::path::Path) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .bind_addr("127.0.0.1:0")
            .protocol(Protocol::Both)
            .parser(ParserKind::Kv)
            .tmp_dir(tmp)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_creates_pipeline() {
        let pipeline = LogPipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert!(pipeline.last_stats().is_none());
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(LogPipelineBuilder::new().config(config).build().is_err());
    }

    #[test]
    fn builder_with_bad_grok_pattern_fails() {
        let config = PipelineConfig {
            parser: ParserKind::Grok,
            grok_patterns: vec!["%{NOT_A_PATTERN:x}".to_owned()],
            ..Default::default()
        };
        let err = LogPipelineBuilder::new().config(config).build().unwrap_err();
        let err: SluiceError = err.into();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn pipeline_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut pipeline = LogPipelineBuilder::new()
            .config(config(tmp.path()))
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        assert!(pipeline.health_check().await.is_unhealthy());
        assert!(pipeline.stop().await.is_err());

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state_name(), "running");
        assert!(pipeline.tcp_addr().is_some());
        assert!(pipeline.udp_addr().is_some());
        assert!(pipeline.health_check().await.is_healthy());
        assert!(pipeline.start().await.is_err());

        tokio::time::timeout(Duration::from_secs(5), pipeline.stop())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.health_check().await.is_unhealthy());
        assert_eq!(pipeline.last_stats(), Some(EngineStats::default()));
    }

    #[tokio::test]
    async fn restart_after_stop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut pipeline = LogPipelineBuilder::new()
            .config(config(tmp.path()))
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        pipeline.start().await.unwrap();
        pipeline.stop().await.unwrap();
        pipeline.start().await.unwrap();
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bind_failure_leaves_no_batch_file() {
        let tmp = tempfile::tempdir().unwrap();
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = config(tmp.path());
        config.bind_addr = occupied.local_addr().unwrap().to_string();
        config.protocol = Protocol::Tcp;

        let mut pipeline = LogPipelineBuilder::new()
            .config(config)
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        let err = pipeline.start().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(pipeline.state_name(), "initialized");

        let mut entries = tokio::fs::read_dir(tmp.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
