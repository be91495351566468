//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sluice_`
//! - 접미어: `_total` (counter), 없음 (gauge/histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sluice_core::metrics::RECORDS_RECEIVED_TOTAL).increment(1);
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 드롭 사유 레이블 키 (missing_body, parse, merge, write)
pub const LABEL_REASON: &str = "reason";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 수신 프로토콜 레이블 키 (tcp, udp)
pub const LABEL_PROTOCOL: &str = "protocol";

// ─── 레코드 메트릭 ──────────────────────────────────────────────────

/// 수집 소스가 채널에 넣은 레코드 수 (counter, label: protocol)
pub const RECORDS_RECEIVED_TOTAL: &str = "sluice_records_received_total";

/// 배치 파일에 기록된 레코드 수 (counter)
pub const RECORDS_WRITTEN_TOTAL: &str = "sluice_records_written_total";

/// 드롭된 레코드 수 (counter, label: reason)
pub const RECORDS_DROPPED_TOTAL: &str = "sluice_records_dropped_total";

/// 수신했지만 아직 처리되지 않은 레코드 수 (gauge)
pub const IN_FLIGHT_RECORDS: &str = "sluice_in_flight_records";

// ─── 배치 메트릭 ────────────────────────────────────────────────────

/// 싱크에 전달한 배치 수 (counter, label: result)
pub const BATCHES_DELIVERED_TOTAL: &str = "sluice_batches_delivered_total";

/// 전달된 배치의 레코드 수 (histogram)
pub const BATCH_RECORDS: &str = "sluice_batch_records";

// ─── 데몬 메트릭 ────────────────────────────────────────────────────

/// 데몬 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "sluice_daemon_uptime_seconds";

/// 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "sluice_daemon_build_info";

/// 파이프라인 상태 (gauge, 1=healthy 0.5=degraded 0=unhealthy)
pub const PIPELINE_HEALTH: &str = "sluice_pipeline_health";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다. recorder가 없어도 패닉하지 않습니다.
pub fn describe_all() {
    describe_counter!(
        RECORDS_RECEIVED_TOTAL,
        "Total number of syslog records accepted by the listeners"
    );
    describe_counter!(
        RECORDS_WRITTEN_TOTAL,
        "Total number of records appended to batch files"
    );
    describe_counter!(
        RECORDS_DROPPED_TOTAL,
        "Total number of records dropped before reaching a batch file"
    );
    describe_gauge!(
        IN_FLIGHT_RECORDS,
        "Number of records received but not yet processed by the consumer"
    );
    describe_counter!(
        BATCHES_DELIVERED_TOTAL,
        "Total number of batch files handed to the output sink"
    );
    describe_histogram!(
        BATCH_RECORDS,
        "Number of records in each delivered batch file"
    );
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Seconds since the daemon started");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information, always 1, labelled with the crate version"
    );
    describe_gauge!(
        PIPELINE_HEALTH,
        "Pipeline health: 1 healthy, 0.5 degraded, 0 unhealthy"
    );
}
