pub mod cli;
pub mod clients;
pub mod config;
pub mod library;
pub mod models;
pub mod parser;
pub mod services;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands};
use clients::{RssFeedClient, SabnzbdClient, TvDbClient, http_client};
pub use config::Config;
use config::LogFormat;
use services::{Scheduler, SyncJob};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Check { json: false }) {
        Commands::Check { json } => cli::cmd_check(&config, json).await,

        Commands::Daemon => run_daemon(config).await,

        Commands::Parse { title, site } => cli::cmd_parse(&config, &title.join(" "), site.as_deref()),

        Commands::Queue => cli::cmd_queue(&config).await,

        Commands::Init => {
            if Config::create_default_if_missing(cli.config.as_deref())? {
                println!("✓ Created default config file");
                println!("  Edit it to add your shows, feeds and TV directories.");
            } else {
                println!("Config file already exists, leaving it untouched.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout is reserved for command output
    match config.general.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Wires the HTTP collaborators into a sync job.
pub fn build_sync_job(config: &Config) -> anyhow::Result<SyncJob> {
    let client = http_client()?;

    let feeds = Arc::new(RssFeedClient::new(client.clone()));
    let queue = Arc::new(SabnzbdClient::new(client.clone(), config.sabnzbd.clone()));
    let metadata = Arc::new(TvDbClient::new(client, config.tvdb.clone()));

    Ok(SyncJob::new(config, feeds, queue, metadata))
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "sabwatch v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    config.validate().context("Invalid configuration")?;

    let job = Arc::new(build_sync_job(&config)?);
    let scheduler = Arc::new(Scheduler::new(job, config.scheduler.clone()));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    if scheduler.is_running().await {
        scheduler.stop().await;
    }
    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
