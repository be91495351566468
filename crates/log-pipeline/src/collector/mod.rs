//! 수집 소스 -- TCP/UDP로 syslog 메시지를 받아 레코드 채널로 보냅니다.
//!
//! # 수집 소스
//! - [`SyslogUdpCollector`]: UDP 데이터그램 하나가 메시지 하나
//! - [`SyslogTcpCollector`]: newline 또는 octet-counting 프레이밍
//!
//! # 아키텍처
//! 각 리스너와 TCP 연결은 자체 tokio 태스크에서 실행되며, [`decoder::decode`]로
//! 만든 [`RawRecord`]를 [`RecordSender`]를 통해 하나의 공유 채널에 넣습니다.
//! 레코드는 채널에 들어가기 전에 처리 중으로 등록되고, 등록 가드는 레코드와 함께
//! 소비자에게 전달됩니다.
//!
//! ```text
//! UDP socket ──┐
//! TCP conn 1 ──┼── RecordSender ──> mpsc<Envelope> ──> consumer
//! TCP conn N ──┘
//! ```

pub mod decoder;
pub mod syslog_tcp;
pub mod syslog_udp;

pub use syslog_tcp::SyslogTcpCollector;
pub use syslog_udp::SyslogUdpCollector;

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sluice_core::metrics as m;
use sluice_core::types::RawRecord;

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::inflight::{InFlightGuard, InFlightTracker};

/// 채널을 지나는 레코드와 처리 중 가드
#[derive(Debug)]
pub struct Envelope {
    /// 디코딩된 레코드
    pub record: RawRecord,
    /// 소비자가 처리를 끝내면 drop
    pub guard: InFlightGuard,
}

/// 레코드 송신기
///
/// 모든 리스너 태스크가 복제해서 사용합니다.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<Envelope>,
    tracker: InFlightTracker,
}

impl RecordSender {
    pub fn new(tx: mpsc::Sender<Envelope>, tracker: InFlightTracker) -> Self {
        Self { tx, tracker }
    }

    /// 레코드를 처리 중으로 등록하고 채널에 넣습니다.
    ///
    /// 채널이 가득 차면 공간이 생길 때까지 기다립니다. 수신측이 닫혔으면
    /// [`LogPipelineError::Channel`]을 반환하며 등록은 즉시 해제됩니다.
    pub async fn send(
        &self,
        record: RawRecord,
        protocol: &'static str,
    ) -> Result<(), LogPipelineError> {
        let guard = self.tracker.acquire();
        self.tx
            .send(Envelope { record, guard })
            .await
            .map_err(|_| LogPipelineError::Channel("record channel closed".to_owned()))?;
        metrics::counter!(m::RECORDS_RECEIVED_TOTAL, m::LABEL_PROTOCOL => protocol).increment(1);
        Ok(())
    }
}

/// 수집 소스 -- 설정된 프로토콜의 리스너 묶음
///
/// [`IngestionSource::bind`]는 모든 소켓을 먼저 바인드한 뒤에만 태스크를 띄우므로,
/// 바인드 실패 시 아무 것도 실행되지 않은 상태로 에러를 반환합니다.
pub struct IngestionSource {
    tcp_addr: Option<SocketAddr>,
    udp_addr: Option<SocketAddr>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl IngestionSource {
    /// 리스너를 바인드하고 수신을 시작합니다.
    pub async fn bind(
        config: &PipelineConfig,
        sender: RecordSender,
    ) -> Result<Self, LogPipelineError> {
        let cancel = CancellationToken::new();

        let tcp = if config.protocol.includes_tcp() {
            Some(SyslogTcpCollector::bind(config, sender.clone(), cancel.child_token()).await?)
        } else {
            None
        };
        let udp = if config.protocol.includes_udp() {
            Some(SyslogUdpCollector::bind(config, sender, cancel.child_token()).await?)
        } else {
            None
        };

        let tcp_addr = tcp.as_ref().map(SyslogTcpCollector::local_addr);
        let udp_addr = udp.as_ref().map(SyslogUdpCollector::local_addr);

        let mut tasks = JoinSet::new();
        if let Some(collector) = tcp {
            tasks.spawn(collector.run());
        }
        if let Some(collector) = udp {
            tasks.spawn(collector.run());
        }

        info!(
            protocol = %config.protocol,
            tcp = ?tcp_addr,
            udp = ?udp_addr,
            "ingestion source started"
        );

        Ok(Self {
            tcp_addr,
            udp_addr,
            cancel,
            tasks,
        })
    }

    /// TCP 리스너 주소 (포트 0으로 바인드한 경우 실제 포트)
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp_addr
    }

    /// UDP 소켓 주소
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.udp_addr
    }

    /// 리스너를 닫고 모든 수신 태스크가 끝날 때까지 기다립니다.
    ///
    /// 반환 후에는 새 레코드가 채널에 들어가지 않습니다.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                debug!(error = %e, "listener task ended abnormally");
            }
        }
        info!("ingestion source stopped");
    }
}

impl std::fmt::Debug for IngestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionSource")
            .field("tcp_addr", &self.tcp_addr)
            .field("udp_addr", &self.udp_addr)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Drop for IngestionSource {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
