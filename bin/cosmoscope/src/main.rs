#![allow(missing_docs)]

use std::time::Duration;

use clap::Parser;
use config::Opts;
use dotenvy::dotenv;
use syncer::{SyncOutcome, Syncer};
use tracing::{error, info, warn};
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    if let Ok(custom_env_file) = std::env::var("ENV_FILE") {
        dotenvy::from_filename(custom_env_file)?;
    } else {
        dotenv().ok();
    }

    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(chain_id = %opts.chain.chain_id, "Cosmoscope starting...");

    let poll_interval = Duration::from_secs(opts.sync.poll_interval_secs);
    let syncer = Syncer::new(opts).await?;

    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match syncer.run_sync().await {
                    Ok(SyncOutcome::SyncedTo(height)) => info!(height, "synced to tip"),
                    Ok(SyncOutcome::UpToDate) => info!("already at tip"),
                    Ok(SyncOutcome::AlreadySyncing) => warn!("previous sync still running"),
                    Ok(SyncOutcome::Stopped { last_height }) => {
                        warn!(last_height, "sync stopped early, will retry");
                    }
                    Err(e) => error!(err = %e, "sync run failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
