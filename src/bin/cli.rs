//! ShardKV CLI Client
//!
//! Command-line interface for data operations (routed through the shard
//! controller) and administrative operations (Join/Leave/Move/Query).

use clap::{Parser, Subcommand};
use shardkv::{Shard, ShardKvClient};

/// ShardKV CLI
#[derive(Parser, Debug)]
#[command(name = "shardkv-cli")]
#[command(about = "CLI for the ShardKV key-value store")]
struct Args {
    /// Shard controller address
    #[arg(short, long, default_value = "127.0.0.1:7300")]
    controller: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Put a key-value pair
    Put {
        /// The key to put
        key: String,

        /// The value to put
        value: String,
    },

    /// Append to a value (insert if absent)
    Append {
        /// The key to append to
        key: String,

        /// The value to append
        value: String,
    },

    /// Delete a key, printing its old value
    Del {
        /// The key to delete
        key: String,
    },

    /// Get several keys atomically
    MultiGet {
        /// The keys to get
        keys: Vec<String>,
    },

    /// Put several key-value pairs (alternating key value key value ...)
    MultiPut {
        /// Alternating keys and values
        pairs: Vec<String>,
    },

    /// Show the current shard placement
    Query,

    /// Register a storage server with the controller
    Join {
        /// The server address to register
        server: String,
    },

    /// Unregister a storage server
    Leave {
        /// The server address to unregister
        server: String,
    },

    /// Move shard ranges to a server (shards as granularity:lower:upper)
    Move {
        /// The destination server address
        server: String,

        /// Shards to move, e.g. 4:0:8
        shards: Vec<Shard>,
    },
}

fn main() {
    let args = Args::parse();

    let mut client = match ShardKvClient::connect(&args.controller) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to connect to controller {}: {}", args.controller, e);
            std::process::exit(1);
        }
    };

    let ok = run(&mut client, args.command);
    if !ok {
        std::process::exit(1);
    }
}

fn run(client: &mut ShardKvClient, command: Commands) -> bool {
    match command {
        Commands::Get { key } => match client.get(&key) {
            Some(value) => {
                println!("{value}");
                true
            }
            None => {
                eprintln!("(not found)");
                false
            }
        },
        Commands::Put { key, value } => client.put(&key, &value),
        Commands::Append { key, value } => client.append(&key, &value),
        Commands::Del { key } => match client.delete(&key) {
            Some(value) => {
                println!("{value}");
                true
            }
            None => {
                eprintln!("(not found)");
                false
            }
        },
        Commands::MultiGet { keys } => match client.multi_get(&keys) {
            Some(values) => {
                for (key, value) in keys.iter().zip(values) {
                    println!("{key} = {value}");
                }
                true
            }
            None => {
                eprintln!("(failed)");
                false
            }
        },
        Commands::MultiPut { pairs } => {
            if pairs.len() % 2 != 0 {
                eprintln!("expected alternating key value pairs");
                return false;
            }
            let keys: Vec<String> = pairs.iter().step_by(2).cloned().collect();
            let values: Vec<String> = pairs.iter().skip(1).step_by(2).cloned().collect();
            client.multi_put(&keys, &values)
        }
        Commands::Query => match client.query() {
            Some(placement) => {
                for (server, shards) in placement.iter() {
                    let ranges: Vec<String> = shards.iter().map(|s| s.to_string()).collect();
                    println!("{server}: {}", ranges.join(" "));
                }
                true
            }
            None => {
                eprintln!("(query failed)");
                false
            }
        },
        Commands::Join { server } => client.join(&server),
        Commands::Leave { server } => client.leave(&server),
        Commands::Move { server, shards } => client.move_shards(&server, &shards),
    }
}
