//! # sluice-log-pipeline
//!
//! syslog 메시지를 수신하여 구조화된 JSON으로 변환하고, 시간 단위 배치 파일로
//! 모아 출력 싱크에 넘기는 파이프라인입니다.
//!
//! # 모듈 구성
//!
//! - [`collector`]: syslog TCP/UDP 리스너와 RFC 3164/5424 디코더
//! - [`parser`]: grok, json, kv, cef, raw 본문 파서와 디스패치
//! - [`merge`]: syslog 메타데이터 병합
//! - [`batch`]: 배치 파일과 회전 엔진
//! - [`sink`]: 파일/표준 출력 싱크
//! - [`inflight`]: 처리 중 레코드 추적
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정 평탄화)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! TCP/UDP -> decoder -> mpsc -> ParserDispatch -> MetadataMerger -> RotationEngine -> OutputSink
//!                                 |                                      |
//!                        grok/json/kv/cef/raw                   <tmp_dir>/sluice-<uuid>.jsonl
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod inflight;
pub mod merge;
pub mod pipeline;
pub mod sink;

pub mod collector;
pub mod parser;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{ParsedEvent, ParserDispatch, RecordParser};

// 병합
pub use merge::MetadataMerger;

// 배치
pub use batch::{BatchFile, EngineStats, RecordProcessor, RotationEngine};

// 수집기
pub use collector::{Envelope, IngestionSource, RecordSender};

// 싱크
pub use sink::{FileSink, StdoutSink};
