//! Error types for ShardKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ShardKvError
pub type Result<T> = std::result::Result<T, ShardKvError>;

/// Unified error type for ShardKV operations
#[derive(Debug, Error)]
pub enum ShardKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed: {0}")]
    Request(String),

    // -------------------------------------------------------------------------
    // Controller Errors
    // -------------------------------------------------------------------------
    #[error("Server already registered: {0}")]
    ServerAlreadyJoined(String),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Shard granularity mismatch: owned shard at {owned}, moved shard at {moved}")]
    GranularityMismatch { owned: u8, moved: u8 },

    #[error("Invalid shard: {0}")]
    InvalidShard(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Length mismatch: {keys} keys but {values} values")]
    LengthMismatch { keys: usize, values: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
