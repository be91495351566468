//! TCP Syslog 수집기
//!
//! 연결마다 별도 태스크에서 프레임을 읽습니다.
//!
//! # 프레이밍
//! - newline: `\n`으로 끝나는 한 줄이 메시지 하나 (`\r\n` 허용)
//! - octet-counting (RFC 6587): `MSG-LEN SP SYSLOG-MSG`
//!
//! `max_message_size`를 넘는 프레임, 잘못된 길이 접두사, 유휴 타임아웃은
//! 해당 연결만 닫습니다.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sluice_core::types::TcpFraming;

use super::RecordSender;
use super::decoder;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;

const PROTOCOL: &str = "tcp";

/// octet-counting 길이 접두사 최대 길이 (앞쪽 공백 포함)
const MAX_LENGTH_PREFIX: u64 = 16;

/// 연결 처리에 필요한 설정
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    framing: TcpFraming,
    max_message_size: usize,
    idle_timeout: Duration,
}

/// TCP Syslog 수집기
pub struct SyslogTcpCollector {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_connections: usize,
    settings: ConnectionSettings,
    sender: RecordSender,
    cancel: CancellationToken,
}

impl SyslogTcpCollector {
    /// 리스너를 바인드합니다. 실패는 [`LogPipelineError::Listen`]입니다.
    pub async fn bind(
        config: &PipelineConfig,
        sender: RecordSender,
        cancel: CancellationToken,
    ) -> Result<Self, LogPipelineError> {
        let listen_err = |reason: String| LogPipelineError::Listen {
            addr: format!("tcp://{}", config.bind_addr),
            reason,
        };

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| listen_err(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| listen_err(e.to_string()))?;

        info!(addr = %local_addr, framing = ?config.framing, "TCP syslog collector listening");

        Ok(Self {
            listener,
            local_addr,
            max_connections: config.max_connections,
            settings: ConnectionSettings {
                framing: config.framing,
                max_message_size: config.max_message_size,
                idle_timeout: config.connection_timeout(),
            },
            sender,
            cancel,
        })
    }

    /// 실제 바인드된 주소
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 취소될 때까지 연결을 수락합니다.
    ///
    /// 취소되면 수락을 멈추고, 열린 연결 태스크가 모두 끝날 때까지 기다립니다.
    pub async fn run(self) {
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(addr = %self.local_addr, "TCP syslog collector received shutdown signal");
                    break;
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "TCP accept error");
                            continue;
                        }
                    };

                    let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                        warn!(
                            peer = %peer,
                            max_connections = self.max_connections,
                            "max connections reached, rejecting connection"
                        );
                        continue;
                    };

                    debug!(peer = %peer, "accepted connection");
                    let sender = self.sender.clone();
                    let cancel = self.cancel.clone();
                    let settings = self.settings;
                    connections.spawn(async move {
                        handle_connection(stream, peer, sender, settings, cancel).await;
                        drop(permit);
                    });
                }
            }
        }

        drop(self.listener);
        while connections.join_next().await.is_some() {}
        debug!(addr = %self.local_addr, "all TCP connections closed");
    }
}

/// 단일 TCP 연결을 처리합니다.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    sender: RecordSender,
    settings: ConnectionSettings,
    cancel: CancellationToken,
) {
    let client = peer.to_string();
    let mut reader = BufReader::new(stream);
    let mut frame = Vec::new();

    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = timeout(
                settings.idle_timeout,
                read_frame(&mut reader, settings.framing, settings.max_message_size, &mut frame),
            ) => read,
        };

        match read {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                debug!(peer = %peer, "connection closed by peer");
                break;
            }
            Ok(Err(e)) => {
                warn!(peer = %peer, error = %e, "closing connection");
                break;
            }
            Err(_) => {
                debug!(peer = %peer, timeout = ?settings.idle_timeout, "idle connection timed out");
                break;
            }
        }

        if frame.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let record = decoder::decode(&frame, &client);
        if let Err(e) = sender.send(record, PROTOCOL).await {
            debug!(peer = %peer, error = %e, "record channel closed, dropping connection");
            break;
        }
    }
}

/// 프레임 하나를 `buf`에 읽습니다. 스트림이 끝났으면 `false`.
async fn read_frame<R>(
    reader: &mut R,
    framing: TcpFraming,
    max_message_size: usize,
    buf: &mut Vec<u8>,
) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    match framing {
        TcpFraming::Newline => {
            let limit = max_message_size as u64 + 1;
            let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            if n == 0 {
                return Ok(false);
            }
            if buf.last() != Some(&b'\n') && buf.len() > max_message_size {
                return Err(oversized(buf.len(), max_message_size));
            }
            Ok(true)
        }
        TcpFraming::OctetCounting => {
            let mut prefix = Vec::with_capacity(8);
            let n = (&mut *reader)
                .take(MAX_LENGTH_PREFIX)
                .read_until(b' ', &mut prefix)
                .await?;
            if n == 0 || prefix.iter().all(u8::is_ascii_whitespace) {
                return Ok(false);
            }

            let len = parse_length_prefix(&prefix)?;
            if len > max_message_size {
                return Err(oversized(len, max_message_size));
            }

            buf.resize(len, 0);
            reader.read_exact(buf).await?;
            Ok(true)
        }
    }
}

/// `"  123 "` 형태의 길이 접두사를 해석합니다.
fn parse_length_prefix(prefix: &[u8]) -> io::Result<usize> {
    let invalid = || {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "invalid octet-counting prefix '{}'",
                String::from_utf8_lossy(prefix).trim()
            ),
        )
    };

    if prefix.last() != Some(&b' ') {
        return Err(invalid());
    }
    std::str::from_utf8(prefix)
        .ok()
        .map(str::trim)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(invalid)
}

fn oversized(len: usize, max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("frame exceeds max message size ({len} bytes, max: {max})"),
    )
}
