use anyhow::Result;
use clap::Parser;

use sluice_core::config::SluiceConfig;
use sluice_daemon::cli::DaemonCli;
use sluice_daemon::logging;
use sluice_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file -> SLUICE_* environment -> command line
    let mut config = match &cli.config {
        Some(path) => SluiceConfig::from_file(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => SluiceConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);

    if cli.validate {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "sluice starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("sluice shut down");
    Ok(())
}
