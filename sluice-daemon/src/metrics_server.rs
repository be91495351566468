//! Prometheus scrape endpoint.
//!
//! `metrics-exporter-prometheus` serves the recorder over its own HTTP
//! listener; every `metrics::counter!`/`gauge!` in the pipeline lands there
//! once [`install_metrics_recorder`] has run.

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use sluice_core::config::MetricsConfig;

/// Resolve the listener address from the metrics configuration.
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Install the process-wide recorder and start serving `/metrics`.
///
/// Fails on an unparsable address, a bind error, or when a recorder is
/// already installed.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_addr(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    sluice_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(())
}
