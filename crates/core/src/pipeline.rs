//! 파이프라인 trait -- 생명주기와 출력 싱크 확장 포인트 정의
//!
//! - [`Pipeline`]: start/stop/health_check 생명주기
//! - [`OutputSink`]: 완성된 배치 파일을 영속화하는 싱크

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::{SinkError, SluiceError};

/// `dyn` 호환 trait에서 사용하는 박싱된 future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 파이프라인 상태 점검 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 주의 필요
    Degraded(String),
    /// 동작하지 않음
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 시작/정지 생명주기를 가진 파이프라인
///
/// 데몬은 이 trait으로만 파이프라인을 다룹니다.
pub trait Pipeline: Send {
    /// 파이프라인을 시작합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), SluiceError>> + Send;

    /// 파이프라인을 정지합니다. 진행 중인 레코드를 모두 처리한 뒤 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), SluiceError>> + Send;

    /// 현재 상태를 점검합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 완성된 배치 파일을 받아 영속화하는 싱크
///
/// 회전 엔진은 `deliver`가 반환된 뒤 정책에 따라 파일을 삭제하므로,
/// 구현체는 반환 전에 파일 내용을 모두 소비해야 합니다.
/// 실패는 로그로만 남고 재시도하지 않습니다.
pub trait OutputSink: Send + Sync {
    /// 싱크 이름 (로그용)
    fn name(&self) -> &str;

    /// 배치 파일을 전달합니다.
    ///
    /// `timestamp`는 회전 주기 시작 시각 (RFC 3339 UTC, 초 단위).
    fn deliver<'a>(
        &'a self,
        path: &'a Path,
        timestamp: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>>;
}
