//! Routing client
//!
//! Resolves keys to owning servers through the shard controller, then
//! forwards operations to per-server [`KvClient`]s. The placement is
//! re-queried on every call, so each operation pays one controller round
//! trip and never acts on a stale snapshot it cached itself.
//!
//! Outcomes are optional/boolean shaped: a missing key, a key with no
//! owner, and an unreachable server all collapse to the same negative
//! result. Retry policy, if any, belongs to the caller.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::network::Connection;
use crate::protocol::{Request, Response};
use crate::shard::{Shard, ShardPlacement};

use super::KvClient;

/// Client that routes operations through the shard controller's placement.
pub struct ShardKvClient {
    controller: Connection,
}

impl ShardKvClient {
    /// Connect to the shard controller.
    pub fn connect(controller_addr: &str) -> Result<Self> {
        Ok(Self {
            controller: Connection::connect(controller_addr)?,
        })
    }

    // =========================================================================
    // Single-key operations
    // =========================================================================

    /// Get the value for `key` from its owning server.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let placement = self.query()?;
        let server = placement.get_server(key)?;
        let mut kv = KvClient::connect(server).ok()?;
        kv.get(key).ok()?
    }

    /// Put `key` on its owning server. Returns `false` on any failure.
    pub fn put(&mut self, key: &str, value: &str) -> bool {
        self.with_owner(key, |kv| kv.put(key, value)).is_some()
    }

    /// Append to `key` on its owning server. Returns `false` on any failure.
    pub fn append(&mut self, key: &str, value: &str) -> bool {
        self.with_owner(key, |kv| kv.append(key, value)).is_some()
    }

    /// Delete `key` on its owning server, returning the old value.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        let placement = self.query()?;
        let server = placement.get_server(key)?;
        let mut kv = KvClient::connect(server).ok()?;
        kv.delete(key).ok()?
    }

    // =========================================================================
    // Multi-key operations (fan-out)
    // =========================================================================

    /// Get several keys, fanning out one MultiGet per owning server.
    ///
    /// Values come back in input key order regardless of how keys were
    /// grouped. Fails entirely if any key has no owner or any server's
    /// MultiGet fails.
    pub fn multi_get(&mut self, keys: &[String]) -> Option<Vec<String>> {
        let placement = self.query()?;
        let groups = group_by_server(&placement, keys)?;

        let mut values = vec![String::new(); keys.len()];
        for (server, (indices, group_keys)) in &groups {
            let mut kv = KvClient::connect(server).ok()?;
            let group_values = kv.multi_get(group_keys).ok()??;
            // Scatter back into the output using the remembered indices
            for (&slot, value) in indices.iter().zip(group_values) {
                values[slot] = value;
            }
        }
        Some(values)
    }

    /// Put several key-value pairs, fanning out one MultiPut per owning
    /// server.
    ///
    /// Returns `false` if any key has no owner or any server's MultiPut
    /// fails. Writes already applied on other servers are NOT rolled back.
    pub fn multi_put(&mut self, keys: &[String], values: &[String]) -> bool {
        if keys.len() != values.len() {
            return false;
        }
        let Some(placement) = self.query() else {
            return false;
        };
        let Some(groups) = group_by_server(&placement, keys) else {
            return false;
        };

        for (server, (indices, group_keys)) in &groups {
            let group_values: Vec<String> =
                indices.iter().map(|&slot| values[slot].clone()).collect();
            let Ok(mut kv) = KvClient::connect(server) else {
                return false;
            };
            if kv.multi_put(group_keys, &group_values).is_err() {
                return false;
            }
        }
        true
    }

    // =========================================================================
    // Controller operations
    // =========================================================================

    /// Fetch the current shard placement from the controller.
    pub fn query(&mut self) -> Option<ShardPlacement> {
        let response = self.controller.round_trip(&Request::Query).ok()?;
        match response {
            Response::Query { placement } => Some(placement),
            _ => None,
        }
    }

    /// Register a storage server with the controller.
    pub fn join(&mut self, server: &str) -> bool {
        let request = Request::Join {
            server: server.to_string(),
        };
        matches!(self.controller.round_trip(&request), Ok(Response::Join))
    }

    /// Unregister a storage server.
    pub fn leave(&mut self, server: &str) -> bool {
        let request = Request::Leave {
            server: server.to_string(),
        };
        matches!(self.controller.round_trip(&request), Ok(Response::Leave))
    }

    /// Reassign shard ranges to a server.
    pub fn move_shards(&mut self, server: &str, shards: &[Shard]) -> bool {
        let request = Request::Move {
            server: server.to_string(),
            shards: shards.to_vec(),
        };
        matches!(self.controller.round_trip(&request), Ok(Response::Move))
    }

    /// Resolve `key`'s owner and run `op` against it.
    fn with_owner<T>(&mut self, key: &str, op: impl FnOnce(&mut KvClient) -> Result<T>) -> Option<T> {
        let placement = self.query()?;
        let server = placement.get_server(key)?;
        let mut kv = KvClient::connect(server).ok()?;
        op(&mut kv).ok()
    }
}

/// Partition keys by owning server, remembering each key's original index.
///
/// Returns `None` if any key has no owner.
fn group_by_server<'a>(
    placement: &'a ShardPlacement,
    keys: &[String],
) -> Option<BTreeMap<&'a str, (Vec<usize>, Vec<String>)>> {
    let mut groups: BTreeMap<&str, (Vec<usize>, Vec<String>)> = BTreeMap::new();
    for (index, key) in keys.iter().enumerate() {
        let server = placement.get_server(key)?;
        let (indices, group_keys) = groups.entry(server).or_default();
        indices.push(index);
        group_keys.push(key.clone());
    }
    Some(groups)
}
