use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use listd::{FileConfig, HubServer};

/// Playlist hub for a line-protocol playout service
#[derive(Debug, Parser)]
#[command(name = "listd", version, about)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file = FileConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    init_logging(&file.log.level)?;

    let config = file.to_hub_config()?;
    let server = HubServer::new(config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

/// `RUST_LOG` wins over the config file
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level {:?}", level))?,
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
