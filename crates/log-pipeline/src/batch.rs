//! 배치 회전 엔진
//!
//! 소비자 루프가 단독으로 소유하며, 레코드마다 다음을 순서대로 수행합니다.
//!
//! 1. 주기 시작 후 `interval`을 초과했고 현재 배치에 레코드가 있으면 회전
//!    (닫기 → 싱크 전달 → 새 배치 파일 → 싱크 실패 정책 적용)
//! 2. 파서 디스패치와 메타데이터 병합
//! 3. 결과를 한 줄짜리 JSON으로 현재 배치 파일에 추가
//!
//! 2-3 단계의 실패는 warn 로그와 드롭 카운터만 남기고 다음 레코드로 넘어갑니다.
//! 회전은 레코드 도착 시에만 일어나며 별도 타이머는 없습니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sluice_core::metrics as m;
use sluice_core::pipeline::OutputSink;
use sluice_core::types::{RawRecord, ShutdownPolicy, SinkFailurePolicy};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::merge::MetadataMerger;
use crate::parser::ParserDispatch;

/// 회전 주기 시작 시각을 싱크에 넘기는 형식 (`2024-01-15T12:00:00Z`)
pub fn cycle_timestamp(started_at: DateTime<Utc>) -> String {
    started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 한 회전 주기의 배치 파일
///
/// 줄 단위 JSON을 버퍼링하여 추가합니다.
#[derive(Debug)]
pub struct BatchFile {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl BatchFile {
    /// `dir` 아래에 새 배치 파일을 만듭니다.
    pub async fn create(dir: &Path, started: Instant) -> Result<Self, LogPipelineError> {
        let path = dir.join(format!("sluice-{}.jsonl", Uuid::new_v4()));
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| LogPipelineError::BatchFile {
                path: path.display().to_string(),
                source,
            })?;

        debug!(path = %path.display(), "batch file created");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            count: 0,
            started,
            started_at: Utc::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 이번 주기에 기록된 레코드 수
    pub fn count(&self) -> usize {
        self.count
    }

    /// 주기 시작 시각 (UTC)
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 주기 시작 후 경과 시간
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// JSON 한 줄을 추가합니다. `line`에는 줄바꿈이 없어야 합니다.
    pub async fn append(&mut self, line: &[u8]) -> Result<(), LogPipelineError> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line);
        buf.push(b'\n');
        self.writer
            .write_all(&buf)
            .await
            .map_err(|source| LogPipelineError::BatchFile {
                path: self.path.display().to_string(),
                source,
            })?;
        self.count += 1;
        Ok(())
    }

    /// 버퍼를 비우고 파일을 닫은 뒤 경로를 반환합니다.
    pub async fn close(mut self) -> Result<PathBuf, LogPipelineError> {
        let result = async {
            self.writer.flush().await?;
            self.writer.shutdown().await
        }
        .await;

        match result {
            Ok(()) => Ok(self.path),
            Err(source) => Err(LogPipelineError::BatchFile {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}

/// 레코드 하나를 배치 파일에 쓸 한 줄로 변환합니다.
#[derive(Debug)]
pub struct RecordProcessor {
    dispatch: ParserDispatch,
    merger: MetadataMerger,
}

impl RecordProcessor {
    pub fn new(dispatch: ParserDispatch, merger: MetadataMerger) -> Self {
        Self { dispatch, merger }
    }

    /// 설정에서 파서와 병합기를 만듭니다. grok 패턴 에러는 여기서 반환됩니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        Ok(Self::new(
            ParserDispatch::from_config(config)?,
            MetadataMerger::from_config(config),
        ))
    }

    /// 파싱 → 병합 → 압축 직렬화
    pub fn process(&self, record: &RawRecord) -> Result<Vec<u8>, LogPipelineError> {
        let event = self.dispatch.dispatch(record)?;
        let merged = self.merger.merge(event, record)?;
        Ok(serde_json::to_vec(&merged)?)
    }

    pub fn parser_name(&self) -> &str {
        self.dispatch.format_name()
    }
}

/// 누적 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// 배치 파일에 기록된 레코드 수
    pub written: u64,
    /// 드롭된 레코드 수
    pub dropped: u64,
    /// 회전 횟수
    pub rotations: u64,
    /// 싱크 전달 실패 횟수
    pub delivery_failures: u64,
}

/// 배치 회전 엔진
pub struct RotationEngine {
    dir: PathBuf,
    interval: Duration,
    current: Option<BatchFile>,
    processor: RecordProcessor,
    sink: Arc<dyn OutputSink>,
    sink_failure_policy: SinkFailurePolicy,
    stats: EngineStats,
}

impl RotationEngine {
    /// 배치 디렉토리를 준비하고 첫 배치 파일을 엽니다.
    pub async fn new(
        config: &PipelineConfig,
        processor: RecordProcessor,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, LogPipelineError> {
        tokio::fs::create_dir_all(&config.tmp_dir)
            .await
            .map_err(|source| LogPipelineError::BatchFile {
                path: config.tmp_dir.display().to_string(),
                source,
            })?;

        let current = BatchFile::create(&config.tmp_dir, Instant::now()).await?;

        info!(
            tmp_dir = %config.tmp_dir.display(),
            interval_secs = config.schedule_secs,
            parser = processor.parser_name(),
            sink = sink.name(),
            "rotation engine ready"
        );

        Ok(Self {
            dir: config.tmp_dir.clone(),
            interval: config.schedule(),
            current: Some(current),
            processor,
            sink,
            sink_failure_policy: config.sink_failure_policy,
            stats: EngineStats::default(),
        })
    }

    /// 레코드 하나를 처리합니다.
    pub async fn handle(&mut self, record: &RawRecord) {
        self.handle_at(record, Instant::now()).await;
    }

    /// `now` 시점에 도착한 레코드를 처리합니다.
    pub async fn handle_at(&mut self, record: &RawRecord, now: Instant) {
        if self.should_rotate(now) {
            self.rotate(now).await;
        }

        match self.write(record, now).await {
            Ok(()) => {
                self.stats.written += 1;
                metrics::counter!(m::RECORDS_WRITTEN_TOTAL).increment(1);
            }
            Err(e) => {
                self.stats.dropped += 1;
                metrics::counter!(m::RECORDS_DROPPED_TOTAL, m::LABEL_REASON => e.drop_reason())
                    .increment(1);
                warn!(
                    error = %e,
                    parser = self.processor.parser_name(),
                    client = record.get("client").and_then(|v| v.as_str()).unwrap_or_default(),
                    "dropping record"
                );
            }
        }
    }

    /// 회전 조건: 레코드가 있고 경과 시간이 주기를 초과
    pub fn should_rotate(&self, now: Instant) -> bool {
        self.current
            .as_ref()
            .is_some_and(|file| file.count() > 0 && file.elapsed(now) > self.interval)
    }

    async fn write(&mut self, record: &RawRecord, now: Instant) -> Result<(), LogPipelineError> {
        let line = self.processor.process(record)?;

        let mut file = match self.current.take() {
            Some(file) => file,
            None => BatchFile::create(&self.dir, now).await?,
        };
        let result = file.append(&line).await;
        self.current = Some(file);
        result
    }

    async fn rotate(&mut self, now: Instant) {
        let Some(file) = self.current.take() else {
            return;
        };
        let count = file.count();
        let timestamp = cycle_timestamp(file.started_at());
        let path = file.path().to_path_buf();

        let delivered = match file.close().await {
            Ok(path) => self.deliver(&path, &timestamp, count).await,
            Err(e) => {
                error!(error = %e, "failed to close batch file, skipping delivery");
                false
            }
        };

        self.stats.rotations += 1;
        info!(records = count, timestamp = %timestamp, delivered, "batch rotated");

        match BatchFile::create(&self.dir, now).await {
            Ok(next) => self.current = Some(next),
            Err(e) => error!(error = %e, "failed to open next batch file"),
        }

        if let Err(e) = self.release(&path, delivered).await {
            warn!(error = %e, "failed to remove batch file");
        }
    }

    /// 싱크에 배치를 전달하고 성공 여부를 반환합니다.
    async fn deliver(&mut self, path: &Path, timestamp: &str, count: usize) -> bool {
        match self.sink.deliver(path, timestamp).await {
            Ok(()) => {
                metrics::counter!(m::BATCHES_DELIVERED_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                metrics::histogram!(m::BATCH_RECORDS).record(count as f64);
                debug!(sink = self.sink.name(), path = %path.display(), records = count, "batch delivered");
                true
            }
            Err(e) => {
                self.stats.delivery_failures += 1;
                metrics::counter!(m::BATCHES_DELIVERED_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                error!(
                    sink = self.sink.name(),
                    path = %path.display(),
                    error = %e,
                    "batch delivery failed"
                );
                false
            }
        }
    }

    /// 싱크 실패 정책에 따라 전달이 끝난 배치 파일을 정리합니다.
    async fn release(&self, path: &Path, delivered: bool) -> Result<(), LogPipelineError> {
        if !delivered && self.sink_failure_policy == SinkFailurePolicy::Retain {
            warn!(path = %path.display(), "undelivered batch retained on disk");
            return Ok(());
        }
        remove_batch(path).await
    }

    /// 종료 정책을 적용하고 현재 배치 파일을 정리합니다.
    ///
    /// `Flush`는 레코드가 하나 이상 있을 때만 싱크를 호출합니다.
    pub async fn finalize(mut self, policy: ShutdownPolicy) -> Result<EngineStats, LogPipelineError> {
        let Some(file) = self.current.take() else {
            return Ok(self.stats);
        };
        let count = file.count();
        let timestamp = cycle_timestamp(file.started_at());
        let path = file.path().to_path_buf();

        if let Err(e) = file.close().await {
            // 닫기 실패해도 파일은 지움
            discard_batch(&path).await;
            return Err(e);
        }

        match policy {
            ShutdownPolicy::Flush if count > 0 => {
                let delivered = self.deliver(&path, &timestamp, count).await;
                info!(records = count, delivered, "final batch flushed");
                self.release(&path, delivered).await?;
            }
            _ => {
                if count > 0 {
                    info!(records = count, "discarding partial batch");
                }
                remove_batch(&path).await?;
            }
        }

        Ok(self.stats)
    }

    /// 현재 배치 파일 경로
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(BatchFile::path)
    }

    /// 현재 배치의 레코드 수
    pub fn current_count(&self) -> usize {
        self.current.as_ref().map_or(0, BatchFile::count)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

impl std::fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationEngine")
            .field("dir", &self.dir)
            .field("interval", &self.interval)
            .field("current", &self.current_path())
            .field("sink", &self.sink.name())
            .field("stats", &self.stats)
            .finish()
    }
}

async fn remove_batch(path: &Path) -> Result<(), LogPipelineError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LogPipelineError::BatchFile {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// 배치 파일을 지우고, 실패하면 경고만 남깁니다. 삭제 여부를 반환합니다.
async fn discard_batch(path: &Path) -> bool {
    match remove_batch(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to remove batch file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use crate::sink::testing::{FailingSink, RecordingSink};
    use serde_json::{Value, json};
    use sluice_core::types::ParserKind;

    const INTERVAL: Duration = Duration::from_secs(5);

    async fn engine_with(
        tmp: &Path,
        parser: ParserKind,
        sink: Arc<dyn OutputSink>,
        policy: SinkFailurePolicy,
    ) -> RotationEngine {
        let config = PipelineConfigBuilder::new()
            .parser(parser)
            .schedule_secs(INTERVAL.as_secs())
            .tmp_dir(tmp.join("batches"))
            .sink_failure_policy(policy)
            .build()
            .unwrap();
        let processor = RecordProcessor::from_config(&config).unwrap();
        RotationEngine::new(&config, processor, sink).await.unwrap()
    }

    fn kv(body: &str) -> RawRecord {
        RawRecord::new().with("hostname", "h").with("content", body)
    }

    #[test]
    fn cycle_timestamp_format() {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T12:00:00.123+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(cycle_timestamp(ts), "2024-01-15T12:00:00Z");
    }

    #[tokio::test]
    async fn creates_tmp_dir_and_first_file() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = engine_with(
            tmp.path(),
            ParserKind::Kv,
            Arc::new(RecordingSink::default()),
            SinkFailurePolicy::Discard,
        )
        .await;
        let path = engine.current_path().unwrap();
        assert!(path.starts_with(tmp.path().join("batches")));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("sluice-"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn appends_compact_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Json, sink.clone(), SinkFailurePolicy::Discard).await;

        let start = Instant::now();
        engine
            .handle_at(&kv("{\n  \"a\": 1,\n  \"b\": \"x\\ny\"\n}"), start)
            .await;
        assert_eq!(engine.current_count(), 1);

        // 회전을 일으켜 내용 확인
        engine.handle_at(&kv("{}"), start + INTERVAL * 2).await;
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].lines(), vec![r#"{"a":1,"b":"x\ny"}"#]);
    }

    #[tokio::test]
    async fn failed_records_are_dropped_without_counting() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = engine_with(
            tmp.path(),
            ParserKind::Kv,
            Arc::new(RecordingSink::default()),
            SinkFailurePolicy::Discard,
        )
        .await;
        let now = Instant::now();

        engine.handle_at(&kv("no pairs here"), now).await;
        engine.handle_at(&RawRecord::new().with("hostname", "h"), now).await;
        engine.handle_at(&kv("a=1"), now).await;

        assert_eq!(engine.current_count(), 1);
        assert_eq!(
            engine.stats(),
            EngineStats {
                written: 1,
                dropped: 2,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn never_rotates_empty_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        let start = Instant::now();

        // 주기가 지났지만 기록된 레코드가 없음
        assert!(!engine.should_rotate(start + INTERVAL * 10));
        engine.handle_at(&kv("garbage"), start + INTERVAL * 10).await;
        engine.handle_at(&kv("still garbage"), start + INTERVAL * 20).await;

        assert!(sink.delivered().is_empty());
        assert_eq!(engine.stats().rotations, 0);
    }

    #[tokio::test]
    async fn rotation_fires_only_after_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        let start = Instant::now();

        engine.handle_at(&kv("n=1"), start).await;
        // 정확히 interval 시점: 초과가 아니므로 회전 없음
        let boundary = engine.current.as_ref().unwrap().started + INTERVAL;
        engine.handle_at(&kv("n=2"), boundary).await;
        assert!(sink.delivered().is_empty());

        let first_path = engine.current_path().unwrap().to_path_buf();
        engine
            .handle_at(&kv("n=3"), boundary + Duration::from_millis(1))
            .await;

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].path, first_path);
        assert_eq!(delivered[0].lines(), vec![r#"{"n":"1"}"#, r#"{"n":"2"}"#]);
        assert!(!first_path.exists(), "handed-off file is removed");

        // 세 번째 레코드는 새 배치에 들어감
        assert_eq!(engine.current_count(), 1);
        assert_ne!(engine.current_path().unwrap(), first_path);
    }

    #[tokio::test]
    async fn delivered_timestamp_is_cycle_start() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        let expected = cycle_timestamp(engine.current.as_ref().unwrap().started_at());
        let start = Instant::now();

        engine.handle_at(&kv("a=1"), start).await;
        engine.handle_at(&kv("a=2"), start + INTERVAL * 2).await;

        assert_eq!(sink.delivered()[0].timestamp, expected);
    }

    #[tokio::test]
    async fn sink_failure_discard_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(FailingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        let start = Instant::now();

        engine.handle_at(&kv("a=1"), start).await;
        let first = engine.current_path().unwrap().to_path_buf();
        engine.handle_at(&kv("a=2"), start + INTERVAL * 2).await;

        assert_eq!(sink.attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(!first.exists());
        assert_eq!(engine.stats().delivery_failures, 1);
        // 실패해도 다음 회전은 막히지 않음
        engine.handle_at(&kv("a=3"), start + INTERVAL * 4).await;
        assert_eq!(sink.attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sink_failure_retain_keeps_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = engine_with(
            tmp.path(),
            ParserKind::Kv,
            Arc::new(FailingSink::default()),
            SinkFailurePolicy::Retain,
        )
        .await;
        let start = Instant::now();

        engine.handle_at(&kv("a=1"), start).await;
        let first = engine.current_path().unwrap().to_path_buf();
        engine.handle_at(&kv("a=2"), start + INTERVAL * 2).await;

        assert!(first.exists());
        let kept = tokio::fs::read_to_string(&first).await.unwrap();
        assert_eq!(kept, "{\"a\":\"1\"}\n");
    }

    #[tokio::test]
    async fn retain_policy_still_removes_delivered_files() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Retain).await;
        let start = Instant::now();

        engine.handle_at(&kv("a=1"), start).await;
        let first = engine.current_path().unwrap().to_path_buf();
        engine.handle_at(&kv("a=2"), start + INTERVAL * 2).await;

        assert_eq!(sink.delivered().len(), 1);
        assert!(!first.exists());
    }

    #[tokio::test]
    async fn finalize_discard_skips_sink_and_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        engine.handle(&kv("a=1")).await;
        let path = engine.current_path().unwrap().to_path_buf();

        let stats = engine.finalize(ShutdownPolicy::Discard).await.unwrap();
        assert_eq!(stats.written, 1);
        assert!(sink.delivered().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn finalize_flush_delivers_once() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        engine.handle(&kv("a=1")).await;
        engine.handle(&kv("a=2")).await;
        let path = engine.current_path().unwrap().to_path_buf();

        engine.finalize(ShutdownPolicy::Flush).await.unwrap();
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].lines().len(), 2);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn finalize_flush_with_empty_batch_skips_sink() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(tmp.path(), ParserKind::Kv, sink.clone(), SinkFailurePolicy::Discard).await;
        let path = engine.current_path().unwrap().to_path_buf();

        engine.finalize(ShutdownPolicy::Flush).await.unwrap();
        assert!(sink.delivered().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn merged_output_respects_keep_message() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let config = PipelineConfigBuilder::new()
            .parser(ParserKind::Kv)
            .keep_syslog(true)
            .schedule_secs(1)
            .tmp_dir(tmp.path())
            .build()
            .unwrap();
        let mut engine = RotationEngine::new(
            &config,
            RecordProcessor::from_config(&config).unwrap(),
            sink.clone(),
        )
        .await
        .unwrap();

        engine
            .handle(&kv("user=alice").with("message", "dup"))
            .await;
        engine.finalize(ShutdownPolicy::Flush).await.unwrap();

        let line: Value = serde_json::from_str(sink.delivered()[0].lines()[0]).unwrap();
        assert_eq!(line, json!({"user": "alice", "hostname": "h"}));
    }

    #[tokio::test]
    async fn discard_batch_reports_failed_removal() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("sluice-x.jsonl");
        std::fs::write(&file, "{}\n").unwrap();

        assert!(discard_batch(&file).await);
        assert!(!file.exists());
        // 이미 없는 파일은 성공으로 취급
        assert!(discard_batch(&file).await);

        // 디렉토리는 remove_file로 지울 수 없음
        let dir = tmp.path().join("not-a-file");
        std::fs::create_dir(&dir).unwrap();
        assert!(!discard_batch(&dir).await);
        assert!(dir.exists());
    }
}
