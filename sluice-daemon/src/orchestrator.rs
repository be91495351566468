//! Daemon orchestration -- assembly, lifecycle, and shutdown.
//!
//! The [`Orchestrator`] owns the validated configuration and the log
//! pipeline. It installs the metrics recorder, builds the output sink,
//! writes the PID file, starts the pipeline and runs the main loop until
//! a shutdown signal arrives.
//!
//! # Shutdown Order
//!
//! 1. Listeners stop accepting and are joined
//! 2. In-flight records drain into the current batch
//! 3. The shutdown policy is applied to the partial batch
//! 4. The PID file is removed

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;

use sluice_core::config::SluiceConfig;
use sluice_core::pipeline::{HealthStatus, Pipeline};
use sluice_log_pipeline::{LogPipeline, LogPipelineBuilder, PipelineConfig, sink};

use crate::metrics_server;

/// Seconds between health checks in the main loop.
const HEALTH_CHECK_INTERVAL_SECS: u64 = 10;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: SluiceConfig,
    pipeline: LogPipeline,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// Applies `SLUICE_*` environment overrides on top of the file.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = SluiceConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Grok patterns are compiled here, so a bad pattern fails before any
    /// listener opens.
    pub fn build_from_config(config: SluiceConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            record_build_info();
        }

        let sink = sink::from_config(&config.output);
        tracing::info!(sink = sink.name(), "output sink configured");

        let pipeline = LogPipelineBuilder::new()
            .config(PipelineConfig::from_core(&config))
            .sink(sink)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {}", e))?;

        Ok(Self {
            config,
            pipeline,
            start_time: Instant::now(),
        })
    }

    /// Start the pipeline and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start the pipeline and block until `shutdown` resolves.
    ///
    /// `shutdown` yields the name of the trigger for logging.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let pid_file = self.pid_file();
        if let Some(path) = &pid_file {
            write_pid_file(path)?;
        }

        if let Err(e) = self.pipeline.start().await {
            tracing::error!(error = %e, "log pipeline failed to start");
            if let Some(path) = &pid_file {
                remove_pid_file(path);
            }
            return Err(anyhow::anyhow!("failed to start log pipeline: {}", e));
        }

        tracing::info!(
            tcp = ?self.pipeline.tcp_addr(),
            udp = ?self.pipeline.udp_addr(),
            parser = %self.config.parser.kind,
            schedule_secs = self.config.batch.schedule_secs,
            "sluice running"
        );

        let signal = self.main_loop(shutdown).await;
        let result = match signal {
            Ok(name) => {
                tracing::info!(signal = name, "shutdown signal received");
                self.shutdown().await
            }
            Err(e) => {
                tracing::error!(error = %e, "signal handling failed, shutting down");
                let _ = self.shutdown().await;
                Err(e)
            }
        };

        if let Some(path) = &pid_file {
            remove_pid_file(path);
        }
        result
    }

    async fn main_loop<F>(&self, shutdown: F) -> Result<&'static str>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let mut interval = tokio::time::interval(Duration::from_secs(HEALTH_CHECK_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                signal = &mut shutdown => return signal,
                _ = interval.tick() => self.report_health().await,
            }
        }
    }

    /// Log the pipeline health and refresh the daemon gauges.
    async fn report_health(&self) {
        let status = self.health().await;
        match &status {
            HealthStatus::Healthy => tracing::debug!("pipeline healthy"),
            HealthStatus::Degraded(reason) => tracing::warn!(reason = %reason, "pipeline degraded"),
            HealthStatus::Unhealthy(reason) => {
                tracing::error!(reason = %reason, "pipeline unhealthy");
            }
        }

        if self.config.metrics.enabled {
            use sluice_core::metrics as m;
            let value = match status {
                HealthStatus::Healthy => 1.0,
                HealthStatus::Degraded(_) => 0.5,
                HealthStatus::Unhealthy(_) => 0.0,
            };
            metrics::gauge!(m::PIPELINE_HEALTH).set(value);
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(self.uptime().as_secs() as f64);
        }
    }

    /// Stop the pipeline, draining in-flight records.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping log pipeline");
        self.pipeline
            .stop()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop log pipeline: {}", e))?;

        if let Some(stats) = self.pipeline.last_stats() {
            tracing::info!(
                written = stats.written,
                dropped = stats.dropped,
                rotations = stats.rotations,
                delivery_failures = stats.delivery_failures,
                uptime_secs = self.uptime().as_secs(),
                "sluice stopped"
            );
        }
        Ok(())
    }

    /// Current pipeline health.
    pub async fn health(&self) -> HealthStatus {
        self.pipeline.health_check().await
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn config(&self) -> &SluiceConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &LogPipeline {
        &self.pipeline
    }

    fn pid_file(&self) -> Option<PathBuf> {
        let path = &self.config.general.pid_file;
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
///
/// # Errors
///
/// Returns an error if the PID file cannot be written.
pub fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_string());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file (possible symlink attack)",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

/// Record the build-info gauge (always 1, labelled with the version).
fn record_build_info() {
    use sluice_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}
