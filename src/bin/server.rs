//! ShardKV Server Binary
//!
//! Starts one storage server. Optionally registers itself with the shard
//! controller at startup; it still owns no shards until an operator issues
//! a Move.

use std::sync::Arc;

use clap::Parser;
use shardkv::network::Server;
use shardkv::{Config, ConcurrentStore, ShardKvClient};
use tracing_subscriber::{fmt, EnvFilter};

/// ShardKV Storage Server
#[derive(Parser, Debug)]
#[command(name = "shardkv-server")]
#[command(about = "Storage server for the ShardKV key-value store")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7400")]
    listen: String,

    /// Shard controller address to Join at startup (optional)
    #[arg(short, long)]
    controller: Option<String>,

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

    tracing::info!("ShardKV Server v{}", shardkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    let store = Arc::new(ConcurrentStore::new());

    let server = match Server::bind(config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind server: {}", e);
            std::process::exit(1);
        }
    };

    // Register with the controller under the address clients will use
    if let Some(controller_addr) = &args.controller {
        let server_id = match server.local_addr() {
            Ok(addr) => addr.to_string(),
            Err(e) => {
                tracing::error!("Failed to resolve local address: {}", e);
                std::process::exit(1);
            }
        };
        match ShardKvClient::connect(controller_addr) {
            Ok(mut client) => {
                if client.join(&server_id) {
                    tracing::info!("Joined controller {} as {}", controller_addr, server_id);
                } else {
                    tracing::warn!(
                        "Controller {} rejected Join for {}",
                        controller_addr,
                        server_id
                    );
                }
            }
            Err(e) => {
                tracing::error!("Failed to reach controller {}: {}", controller_addr, e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
