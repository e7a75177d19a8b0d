//! skyfusion: real-time OSINT fusion engine for military aviation.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skyfusion_core::aggregator::RegionOfInterest;

mod aggregator_io;
mod config;
mod db;
mod errors;
mod notification;
mod ratelimit;
mod scheduler;
mod sources;
mod web;

use aggregator_io::Aggregator;
use config::{FileDefaults, ServerConfig};
use db::Store;
use ratelimit::TokenBucket;
use scheduler::Scheduler;
use sources::military::MilitaryFeedClient;
use sources::opensky::OpenSkyClient;

#[derive(Parser)]
#[command(name = "skyfusion", version, about = "Real-time OSINT fusion engine for military aviation")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the aggregator scheduler and the web API together.
    Serve,
    /// Apply idempotent schema DDL and exit.
    Migrate,
    /// Run a single aggregator tick and print the merged count.
    TickOnce,
    /// Print store-wide counters and exit.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let cli = Cli::parse();
    let defaults = FileDefaults::load(cli.config.config_file.as_ref());

    let store = Arc::new(Store::connect(&cli.config.database_url).await?);

    match cli.command {
        Commands::Migrate => {
            store.migrate().await;
            tracing::info!("schema migration complete");
        }
        Commands::Stats => {
            let stats = store.stats().await;
            println!("aircraft:          {}", stats.aircraft);
            println!("positions (24h):   {}", stats.positions_24h);
            println!("active formations: {}", stats.active_formations);
            println!("active warnings:   {}", stats.active_warnings);
            println!("alerts:            {}", stats.alerts);
        }
        Commands::TickOnce => {
            let aggregator = build_aggregator(&cli.config, &defaults, store.clone());
            let merged = aggregator.tick().await?;
            println!("merged {merged} aircraft records");
        }
        Commands::Serve => {
            let aggregator = Arc::new(build_aggregator(&cli.config, &defaults, store.clone()));
            let cancel = tokio_util::sync::CancellationToken::new();
            let scheduler = Scheduler { aggregator, store: store.clone(), intervals: defaults.clone(), cancel: cancel.clone() };
            let handles = scheduler.spawn_all();

            let web_store = store.clone();
            let host = cli.config.host.clone();
            let port = cli.config.port;
            let web_handle = tokio::spawn(async move {
                if let Err(e) = web::serve(web_store, &host, port).await {
                    tracing::error!(error = %e, "web server exited");
                }
            });

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown signal received");
            cancel.cancel();
            for handle in handles {
                let _ = handle.await;
            }
            web_handle.abort();
        }
    }

    Ok(())
}

fn build_aggregator(cfg: &ServerConfig, defaults: &FileDefaults, store: Arc<Store>) -> Aggregator {
    let military = cfg.military_feed_url.clone().map(|url| MilitaryFeedClient::new(url, cfg.military_feed_token.clone()));
    let opensky = cfg.opensky_url.clone().map(|url| OpenSkyClient::new(url, cfg.opensky_user.clone(), cfg.opensky_pass.clone()));

    let (min_lat, min_lon, max_lat, max_lon) = defaults.region_bbox;
    Aggregator {
        store,
        military,
        opensky,
        military_bucket: TokenBucket::new(60.0, 1.0),
        opensky_bucket: TokenBucket::new(60.0, 1.0),
        region: RegionOfInterest { min_lat, min_lon, max_lat, max_lon },
    }
}
