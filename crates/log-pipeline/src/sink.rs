//! 출력 싱크 -- 완성된 배치 파일을 영속화합니다.
//!
//! - [`FileSink`]: `<dir>/<prefix>-<timestamp>-<n>.jsonl`로 복사
//! - [`StdoutSink`]: 배치 내용을 표준 출력으로 기록
//!
//! 두 싱크 모두 `deliver`가 반환되기 전에 원본 파일 읽기를 끝냅니다.
//! 원본 삭제는 회전 엔진의 몫입니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;

use sluice_core::config::OutputConfig;
use sluice_core::error::SinkError;
use sluice_core::pipeline::{BoxFuture, OutputSink};
use sluice_core::types::OutputKind;

/// 설정에 맞는 싱크를 생성합니다.
pub fn from_config(config: &OutputConfig) -> Arc<dyn OutputSink> {
    match config.kind {
        OutputKind::File => Arc::new(FileSink::new(&config.dir, &config.prefix)),
        OutputKind::Stdout => Arc::new(StdoutSink::new()),
    }
}

/// 디렉토리 싱크
///
/// 같은 타임스탬프로 여러 번 전달되어도 덮어쓰지 않도록 순번을 붙입니다.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
    seq: AtomicU64,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// 대상 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 전달할 파일의 대상 경로를 만듭니다. 파일 이름에 쓸 수 없는 `:`는 `-`로 바꿉니다.
    fn destination(&self, timestamp: &str) -> PathBuf {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let stamp = timestamp.replace(':', "-");
        self.dir.join(format!("{}-{stamp}-{n}.jsonl", self.prefix))
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn deliver<'a>(
        &'a self,
        path: &'a Path,
        timestamp: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| SinkError::Delivery {
                    path: self.dir.display().to_string(),
                    reason: format!("cannot create output directory: {e}"),
                })?;

            let dest = self.destination(timestamp);
            let bytes = tokio::fs::copy(path, &dest)
                .await
                .map_err(|e| SinkError::Delivery {
                    path: path.display().to_string(),
                    reason: format!("copy to '{}' failed: {e}", dest.display()),
                })?;

            tracing::debug!(dest = %dest.display(), bytes, "batch copied");
            Ok(())
        })
    }
}

/// 표준 출력 싱크
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn deliver<'a>(
        &'a self,
        path: &'a Path,
        _timestamp: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let mut file = tokio::fs::File::open(path).await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut file, &mut stdout).await?;
            stdout.flush().await?;
            Ok(())
        })
    }
}
