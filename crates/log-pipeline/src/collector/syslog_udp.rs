//! UDP Syslog 수집기
//!
//! 데이터그램 하나를 메시지 하나로 취급합니다. `max_message_size`보다 큰
//! 데이터그램은 잘린 채로 디코딩됩니다.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::RecordSender;
use super::decoder;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;

const PROTOCOL: &str = "udp";

/// UDP Syslog 수집기
pub struct SyslogUdpCollector {
    socket: UdpSocket,
    local_addr: SocketAddr,
    max_message_size: usize,
    sender: RecordSender,
    cancel: CancellationToken,
}

impl SyslogUdpCollector {
    /// 소켓을 바인드합니다. 실패는 [`LogPipelineError::Listen`]입니다.
    pub async fn bind(
        config: &PipelineConfig,
        sender: RecordSender,
        cancel: CancellationToken,
    ) -> Result<Self, LogPipelineError> {
        let listen_err = |reason: String| LogPipelineError::Listen {
            addr: format!("udp://{}", config.bind_addr),
            reason,
        };

        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|e| listen_err(e.to_string()))?;
        let local_addr = socket.local_addr().map_err(|e| listen_err(e.to_string()))?;

        info!(addr = %local_addr, "UDP syslog collector listening");

        Ok(Self {
            socket,
            local_addr,
            max_message_size: config.max_message_size,
            sender,
            cancel,
        })
    }

    /// 실제 바인드된 주소
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 취소될 때까지 데이터그램을 수신합니다.
    pub async fn run(self) {
        let mut buf = vec![0u8; self.max_message_size];

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(addr = %self.local_addr, "UDP syslog collector received shutdown signal");
                    break;
                }
                result = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match result {
                        Ok(received) => received,
                        Err(e) => {
                            warn!(error = %e, "UDP receive error");
                            continue;
                        }
                    };
                    if len == 0 {
                        continue;
                    }

                    let record = decoder::decode(&buf[..len], &peer.to_string());
                    if let Err(e) = self.sender.send(record, PROTOCOL).await {
                        debug!(error = %e, "record channel closed, stopping UDP collector");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Envelope;
    use crate::config::PipelineConfigBuilder;
    use crate::inflight::InFlightTracker;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn start() -> (SocketAddr, mpsc::Receiver<Envelope>, CancellationToken, tokio::task::JoinHandle<()>) {
        let config = PipelineConfigBuilder::new()
            .bind_addr("127.0.0.1:0")
            .build()
            .unwrap();
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let collector = SyslogUdpCollector::bind(
            &config,
            RecordSender::new(tx, InFlightTracker::new()),
            cancel.clone(),
        )
        .await
        .unwrap();
        let addr = collector.local_addr();
        let handle = tokio::spawn(collector.run());
        (addr, rx, cancel, handle)
    }

    #[tokio::test]
    async fn receives_datagram() {
        let (addr, mut rx, cancel, handle) = start().await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(b"<34>Jan 15 12:00:00 web-01 sshd[42]: Failed password\n", addr)
            .await
            .unwrap();

        let envelope = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let record = envelope.record;
        assert_eq!(record.body().unwrap(), "Failed password");
        assert_eq!(record.get("hostname").unwrap(), "web-01");
        assert_eq!(
            record.get("client").unwrap(),
            &client.local_addr().unwrap().to_string()
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let (_addr, _rx, cancel, handle) = start().await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
