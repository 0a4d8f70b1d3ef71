//! Concurrent Store Engine
//!
//! A hash-bucketed map from key to value with per-bucket reader/writer
//! locks. Single-key operations lock exactly one bucket; multi-key
//! operations lock the deduplicated set of touched buckets, always in
//! ascending bucket-index order. That fixed global order is the invariant
//! preventing deadlock between concurrent multi-key operations and must hold
//! on every multi-bucket path.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, ShardKvError};
use crate::network::Handler;
use crate::protocol::{Request, Response};

/// Number of buckets in the store; fixed at construction, never changes.
pub const BUCKET_COUNT: usize = 16;

type Bucket = HashMap<String, String>;

/// Hash-bucketed concurrent key-value store.
pub struct ConcurrentStore {
    buckets: Vec<RwLock<Bucket>>,
}

impl ConcurrentStore {
    /// Create an empty store with `BUCKET_COUNT` buckets.
    pub fn new() -> Self {
        let buckets = (0..BUCKET_COUNT).map(|_| RwLock::new(Bucket::new())).collect();
        Self { buckets }
    }

    /// The bucket index for a key: stable for the store's lifetime.
    pub fn bucket(&self, key: &str) -> usize {
        crc32fast::hash(key.as_bytes()) as usize % BUCKET_COUNT
    }

    /// Read the value for `key`, if present. Shared-locks one bucket.
    pub fn get(&self, key: &str) -> Option<String> {
        let bucket = self.buckets[self.bucket(key)].read();
        bucket.get(key).cloned()
    }

    /// Insert or overwrite `key`. Exclusive-locks one bucket.
    pub fn put(&self, key: &str, value: &str) {
        let mut bucket = self.buckets[self.bucket(key)].write();
        bucket.insert(key.to_string(), value.to_string());
    }

    /// Append `value` to the existing value for `key`, or insert it if the
    /// key is absent.
    ///
    /// One atomic read-modify-write under the bucket's exclusive lock; never
    /// decomposable into a separate Get and Put from the caller's view.
    pub fn append(&self, key: &str, value: &str) {
        let mut bucket = self.buckets[self.bucket(key)].write();
        match bucket.get_mut(key) {
            Some(existing) => existing.push_str(value),
            None => {
                bucket.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Remove `key`, returning the old value if it was present.
    pub fn delete(&self, key: &str) -> Option<String> {
        let mut bucket = self.buckets[self.bucket(key)].write();
        bucket.remove(key)
    }

    /// Read several keys atomically.
    ///
    /// Shared-locks the deduplicated set of touched buckets in ascending
    /// index order, then reads every key. If ANY key is absent the whole
    /// call returns `None` with no partial results. The read is atomic with
    /// respect to writers across all touched buckets for its duration.
    pub fn multi_get(&self, keys: &[String]) -> Option<Vec<String>> {
        let guards = self.read_guards(keys);

        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            match guards[&self.bucket(key)].get(key) {
                Some(value) => values.push(value.clone()),
                None => return None,
            }
        }
        Some(values)
    }

    /// Write several key-value pairs atomically.
    ///
    /// Fails before taking any lock if the input lengths differ. Otherwise
    /// exclusive-locks the deduplicated bucket set in ascending index order
    /// and writes every pair unconditionally.
    pub fn multi_put(&self, keys: &[String], values: &[String]) -> Result<()> {
        if keys.len() != values.len() {
            return Err(ShardKvError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut guards = self.write_guards(keys);
        for (key, value) in keys.iter().zip(values) {
            let bucket = self.bucket(key);
            guards
                .get_mut(&bucket)
                .expect("guard exists for every touched bucket")
                .insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Snapshot every key in the store.
    ///
    /// Shared-locks all buckets in index order; blocks all writers for the
    /// duration of the scan.
    pub fn all_keys(&self) -> Vec<String> {
        let guards: Vec<RwLockReadGuard<'_, Bucket>> =
            self.buckets.iter().map(|bucket| bucket.read()).collect();

        let mut keys = Vec::new();
        for guard in &guards {
            keys.extend(guard.keys().cloned());
        }
        keys
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.read().len()).sum()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.read().is_empty())
    }

    /// Shared-lock the deduplicated bucket set for `keys`, ascending.
    ///
    /// A `BTreeSet` of indices drives acquisition so the global ascending
    /// order holds regardless of key order.
    fn read_guards(&self, keys: &[String]) -> BTreeMap<usize, RwLockReadGuard<'_, Bucket>> {
        let indices: BTreeSet<usize> = keys.iter().map(|key| self.bucket(key)).collect();
        indices
            .into_iter()
            .map(|index| (index, self.buckets[index].read()))
            .collect()
    }

    /// Exclusive-lock the deduplicated bucket set for `keys`, ascending.
    fn write_guards(&self, keys: &[String]) -> BTreeMap<usize, RwLockWriteGuard<'_, Bucket>> {
        let indices: BTreeSet<usize> = keys.iter().map(|key| self.bucket(key)).collect();
        indices
            .into_iter()
            .map(|index| (index, self.buckets[index].write()))
            .collect()
    }
}

impl Default for ConcurrentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ConcurrentStore {
    /// Dispatch a decoded request against the store.
    ///
    /// Controller-facing requests reaching a storage server are answered
    /// with an error response rather than dropped.
    fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        match request {
            Request::Get { key } => match self.get(&key) {
                Some(value) => Response::Get { value },
                None => Response::NotFound,
            },
            Request::Put { key, value } => {
                self.put(&key, &value);
                Response::Put
            }
            Request::Append { key, value } => {
                self.append(&key, &value);
                Response::Append
            }
            Request::Delete { key } => match self.delete(&key) {
                Some(value) => Response::Delete { value },
                None => Response::NotFound,
            },
            Request::MultiGet { keys } => match self.multi_get(&keys) {
                Some(values) => Response::MultiGet { values },
                None => Response::NotFound,
            },
            Request::MultiPut { keys, values } => match self.multi_put(&keys, &values) {
                Ok(()) => Response::MultiPut,
                Err(e) => Response::error(format!("Failed to process MultiPut request: {e}")),
            },
            Request::Query | Request::Join { .. } | Request::Leave { .. } | Request::Move { .. } => {
                Response::error(format!(
                    "{kind} is not a storage request; send it to the shardcontroller"
                ))
            }
        }
    }
}
