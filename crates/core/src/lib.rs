//! sluice 공통 크레이트 -- 타입, 에러, 설정, 파이프라인 trait, 메트릭 이름
//!
//! `sluice-log-pipeline`과 `sluice-daemon`이 공유하는 정의를 모아 둡니다.
//!
//! # 모듈 구성
//!
//! - [`types`]: `RawRecord`, `ParserKind`, `Protocol` 등 도메인 타입
//! - [`error`]: 최상위 에러 [`SluiceError`]와 도메인별 에러
//! - [`config`]: `sluice.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`pipeline`]: [`Pipeline`], [`OutputSink`] trait
//! - [`metrics`]: Prometheus 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, ParseError, PipelineError, SinkError, SluiceError};

// 설정
pub use config::SluiceConfig;

// 파이프라인 trait
pub use pipeline::{BoxFuture, HealthStatus, OutputSink, Pipeline};

// 도메인 타입
pub use types::{
    OutputKind, ParserKind, Protocol, RawRecord, ShutdownPolicy, SinkFailurePolicy, TcpFraming,
};
