//! ShardKV Controller Binary
//!
//! Starts the shard controller service.

use std::sync::Arc;

use clap::Parser;
use shardkv::network::Server;
use shardkv::{Config, ShardController};
use tracing_subscriber::{fmt, EnvFilter};

/// ShardKV Controller
#[derive(Parser, Debug)]
#[command(name = "shardkv-controller")]
#[command(about = "Shard controller for the ShardKV key-value store")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7300")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("ShardKV Controller v{}", shardkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    let controller = Arc::new(ShardController::new());

    let server = match Server::bind(config, controller) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind controller: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Controller error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Controller stopped");
}
