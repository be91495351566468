//! 처리 중 레코드 추적
//!
//! 수집 소스가 레코드를 받아들일 때 [`InFlightTracker::acquire`]로 가드를 만들고,
//! 가드는 레코드와 함께 채널을 지나 소비자가 처리를 끝낼 때(기록 또는 드롭) 해제됩니다.
//! 종료 시 [`InFlightTracker::wait_idle`]은 카운트가 0이 될 때까지 기다립니다.
//!
//! 카운트는 `tokio::sync::watch` 채널에 보관하므로, 증가와 대기 사이의
//! 경쟁 없이 "0이 되는 순간"을 관찰할 수 있습니다.

use std::time::Duration;

use tokio::sync::watch;

use sluice_core::metrics as m;

/// 대기 중 진행 상황을 로그로 남기는 간격
const IDLE_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// 처리 중 레코드 수 추적기
///
/// `Clone`은 같은 카운터를 공유합니다.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    count: watch::Sender<usize>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// 레코드 하나를 처리 중으로 등록합니다.
    pub fn acquire(&self) -> InFlightGuard {
        self.count.send_modify(|n| *n += 1);
        metrics::gauge!(m::IN_FLIGHT_RECORDS).increment(1.0);
        InFlightGuard {
            count: self.count.clone(),
        }
    }

    /// 현재 처리 중인 레코드 수
    pub fn in_flight(&self) -> usize {
        *self.count.borrow()
    }

    /// 처리 중인 레코드가 없을 때까지 기다립니다.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        loop {
            // 송신자는 self가 보유하므로 wait_for는 에러를 반환하지 않음
            let idle = tokio::time::timeout(IDLE_LOG_INTERVAL, rx.wait_for(|n| *n == 0))
                .await
                .is_ok();
            if idle {
                return;
            }
            tracing::debug!(in_flight = self.in_flight(), "waiting for in-flight records");
        }
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// 처리 중 레코드 하나에 대한 가드
///
/// drop 시 카운트를 감소시킵니다.
#[derive(Debug)]
pub struct InFlightGuard {
    count: watch::Sender<usize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
        metrics::gauge!(m::IN_FLIGHT_RECORDS).decrement(1.0);
    }
}
