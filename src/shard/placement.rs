//! Shard placement table
//!
//! The authoritative mapping from server identifier to the shards it owns.
//! A `BTreeMap` keeps iteration order deterministic, which matters for two
//! observable behaviors: which server absorbs a leaving server's shards, and
//! which owner wins when ranges accidentally overlap during lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Shard;

/// Mapping from server identifier to the ordered list of shards it owns.
///
/// Intended invariant (not actively enforced): for a fixed granularity, the
/// union of all servers' shards covers the key space and no two servers'
/// shards overlap. The controller's Join/Leave/Move maintain this as long as
/// move requests partition cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardPlacement {
    servers: BTreeMap<String, Vec<Shard>>,
}

impl ShardPlacement {
    /// Create an empty placement with no servers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `server` is registered.
    pub fn contains_server(&self, server: &str) -> bool {
        self.servers.contains_key(server)
    }

    /// Register a server with an empty shard list.
    ///
    /// Returns `false` if the server is already present.
    pub fn add_server(&mut self, server: &str) -> bool {
        if self.servers.contains_key(server) {
            return false;
        }
        self.servers.insert(server.to_string(), Vec::new());
        true
    }

    /// Remove a server, returning the shards it owned.
    pub fn remove_server(&mut self, server: &str) -> Option<Vec<Shard>> {
        self.servers.remove(server)
    }

    /// The first registered server in map order, if any.
    pub fn first_server(&self) -> Option<&str> {
        self.servers.keys().next().map(String::as_str)
    }

    /// Append a shard to a server's list. The server must be registered.
    pub fn push_shard(&mut self, server: &str, shard: Shard) {
        if let Some(shards) = self.servers.get_mut(server) {
            shards.push(shard);
        }
    }

    /// Append several shards to a server's list. The server must be registered.
    pub fn push_shards(&mut self, server: &str, shards: impl IntoIterator<Item = Shard>) {
        if let Some(owned) = self.servers.get_mut(server) {
            owned.extend(shards);
        }
    }

    /// The shards currently owned by `server`.
    pub fn shards(&self, server: &str) -> Option<&[Shard]> {
        self.servers.get(server).map(Vec::as_slice)
    }

    /// Iterate over `(server, shards)` entries in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Shard])> {
        self.servers
            .iter()
            .map(|(server, shards)| (server.as_str(), shards.as_slice()))
    }

    /// Iterate mutably over each server's shard list, in map order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<Shard>)> {
        self.servers
            .iter_mut()
            .map(|(server, shards)| (server.as_str(), shards))
    }

    /// Resolve the server responsible for `key`.
    ///
    /// Returns the first server (in map order) owning a shard whose range
    /// contains the key's coordinate at that shard's granularity, or `None`
    /// if no shard covers the key.
    pub fn get_server(&self, key: &str) -> Option<&str> {
        for (server, shards) in &self.servers {
            if shards.iter().any(|shard| shard.contains_key(key)) {
                return Some(server.as_str());
            }
        }
        None
    }

    /// Number of registered servers.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Whether no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
