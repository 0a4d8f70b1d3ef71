//! # ShardKV
//!
//! A sharded key-value store with:
//! - A shard controller owning the authoritative key-range placement
//! - Storage servers with per-bucket reader/writer locking
//! - A routing client that resolves keys to servers and fans out
//!   multi-key requests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐   Query/Join/Leave/Move   ┌──────────────────┐
//! │  ShardKvClient   │──────────────────────────▶│ Shard Controller │
//! │  (routing)       │◀──────────────────────────│  (placement)     │
//! └────────┬─────────┘      placement snapshot   └──────────────────┘
//!          │
//!          │ Get/Put/Append/Delete/MultiGet/MultiPut
//!          ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │  Storage Server  │      │  Storage Server  │
//! │ (bucketed store) │ ...  │ (bucketed store) │
//! └──────────────────┘      └──────────────────┘
//! ```
//!
//! Each storage server owns a disjoint slice of the key space. The
//! controller is a single authoritative instance (no replication); the
//! store keeps no durable state; multi-key atomicity holds only within one
//! server's lock scope.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod controller;
pub mod network;
pub mod protocol;
pub mod shard;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::{KvClient, ShardKvClient};
pub use config::Config;
pub use controller::ShardController;
pub use error::{Result, ShardKvError};
pub use shard::{overlap, OverlapStatus, Shard, ShardPlacement};
pub use store::{ConcurrentStore, BUCKET_COUNT};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ShardKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
