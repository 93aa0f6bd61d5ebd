use anyhow::Context;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use rubrik_exporter::prelude::*;
use rubrik_exporter::config::load_exporter_config;
use rubrik_exporter::{VERSION, collector, server, util::logging};

/// Prometheus exporter for Rubrik CDM clusters
#[derive(Parser, Debug)]
#[command(name = "rubrik-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "RUBRIK_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Scrape endpoint port (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides configuration)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_exporter_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.listen_port = port;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init(config.log_level);
    info!("Starting rubrik-exporter {} against {}", VERSION, config.node_ip);

    match run(&config).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_startup_fatal() => {
            error!("Startup failed: {}", e);
            Err(e).context("Startup failed")
        }
        Err(e) => {
            error!("Exporter stopped: {}", e);
            Err(e.into())
        }
    }
}

async fn run(config: &ExporterConfig) -> Result<()> {
    let client: Arc<dyn ApiClient> = Arc::new(CdmClient::new(config)?);
    let identity = ClusterIdentity::resolve(client.as_ref()).await?;

    let registry = Arc::new(MetricRegistry::with_all_families()?);
    let ctx = CollectContext::new(client, identity, registry.clone()).with_timeout(config.request_timeout_secs);

    let scheduler = Scheduler::new().with_collectors(collector::all(&config.intervals));
    info!("Scheduling {} collectors", scheduler.len());
    let _tasks = scheduler.start(ctx).await;

    server::serve(registry, config.listen_port).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_path_from_environment() {
        unsafe { std::env::set_var("RUBRIK_EXPORTER_CONFIG", "/etc/rubrik/exporter.toml") };
        let cli = Cli::try_parse_from(["rubrik-exporter", "--port", "9100"]);
        unsafe { std::env::remove_var("RUBRIK_EXPORTER_CONFIG") };

        let cli = cli.unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/rubrik/exporter.toml")));
        assert_eq!(cli.port, Some(9100));
        assert!(cli.log_level.is_none());
    }
}
