//! Request and response definitions
//!
//! Closed sum types over every operation the storage servers and the shard
//! controller understand.

use serde::{Deserialize, Serialize};

use crate::shard::{Shard, ShardPlacement};

/// A request from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    // -------------------------------------------------------------------------
    // Store-facing
    // -------------------------------------------------------------------------
    /// Get a value by key
    Get { key: String },

    /// Put a key-value pair
    Put { key: String, value: String },

    /// Append to a value (insert if absent)
    Append { key: String, value: String },

    /// Delete a key, returning its old value
    Delete { key: String },

    /// Get several keys atomically (all-or-nothing)
    MultiGet { keys: Vec<String> },

    /// Put several key-value pairs atomically
    MultiPut {
        keys: Vec<String>,
        values: Vec<String>,
    },

    // -------------------------------------------------------------------------
    // Controller-facing
    // -------------------------------------------------------------------------
    /// Snapshot the current shard placement
    Query,

    /// Register a storage server
    Join { server: String },

    /// Unregister a storage server
    Leave { server: String },

    /// Reassign shard ranges to a server
    Move { server: String, shards: Vec<Shard> },
}

impl Request {
    /// Short name of the request kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Get { .. } => "Get",
            Request::Put { .. } => "Put",
            Request::Append { .. } => "Append",
            Request::Delete { .. } => "Delete",
            Request::MultiGet { .. } => "MultiGet",
            Request::MultiPut { .. } => "MultiPut",
            Request::Query => "Query",
            Request::Join { .. } => "Join",
            Request::Leave { .. } => "Leave",
            Request::Move { .. } => "Move",
        }
    }
}

/// A response to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Value for a Get
    Get { value: String },

    /// Acknowledges a Put
    Put,

    /// Acknowledges an Append
    Append,

    /// Old value removed by a Delete
    Delete { value: String },

    /// Values for a MultiGet, in request key order
    MultiGet { values: Vec<String> },

    /// Acknowledges a MultiPut
    MultiPut,

    /// Placement snapshot for a Query
    Query { placement: ShardPlacement },

    /// Acknowledges a Join
    Join,

    /// Acknowledges a Leave
    Leave,

    /// Acknowledges a Move
    Move,

    /// Key (or one of several keys) was absent
    NotFound,

    /// The operation failed; message describes why
    Error { message: String },
}

impl Response {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}
