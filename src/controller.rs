//! Shard Controller
//!
//! The single authoritative owner of the shard placement. All four
//! operations (Query/Join/Leave/Move) serialize through one mutex so every
//! caller observes a consistent placement.
//!
//! ## Known non-atomicity
//! `move_shards` validates granularity per owned shard while it trims. A
//! mismatch discovered partway through aborts the call, but trimming already
//! applied to earlier servers stays applied. This matches the original
//! contract; callers must treat Move as non-transactional.

use parking_lot::Mutex;

use crate::error::{Result, ShardKvError};
use crate::network::Handler;
use crate::protocol::{Request, Response};
use crate::shard::{overlap, OverlapStatus, Shard, ShardPlacement};

/// The controller service: owns the placement behind one exclusive lock.
pub struct ShardController {
    placement: Mutex<ShardPlacement>,
}

impl ShardController {
    /// Create a controller with an empty placement.
    pub fn new() -> Self {
        Self {
            placement: Mutex::new(ShardPlacement::new()),
        }
    }

    /// Snapshot the current placement. Never fails.
    pub fn query(&self) -> ShardPlacement {
        self.placement.lock().clone()
    }

    /// Register a server with an empty shard list.
    ///
    /// The server receives shards only through subsequent Move operations.
    pub fn join(&self, server: &str) -> Result<()> {
        let mut placement = self.placement.lock();
        if !placement.add_server(server) {
            return Err(ShardKvError::ServerAlreadyJoined(server.to_string()));
        }
        tracing::info!(server, "added server to shardcontroller configuration");
        Ok(())
    }

    /// Remove a server from the placement.
    ///
    /// If other servers remain, all of the leaving server's shards are
    /// reassigned in full to the first remaining server in map order (no
    /// load balancing). If it was the only server, its shards are dropped
    /// and their key ranges become unrouteable.
    pub fn leave(&self, server: &str) -> Result<()> {
        let mut placement = self.placement.lock();
        let orphaned = placement
            .remove_server(server)
            .ok_or_else(|| ShardKvError::UnknownServer(server.to_string()))?;

        if let Some(heir) = placement.first_server().map(str::to_string) {
            placement.push_shards(&heir, orphaned);
            tracing::info!(server, heir = heir.as_str(), "removed server, shards reassigned");
        } else {
            tracing::info!(server, "removed last server, its shards are dropped");
        }
        Ok(())
    }

    /// Reassign ownership of the given shard ranges to `destination`.
    ///
    /// For each moved shard, every server's owned shards are trimmed down to
    /// the portions outside the moved range; then the moved shards are
    /// appended to the destination's list. Later shards in the same request
    /// see the placement already trimmed for earlier ones.
    pub fn move_shards(&self, destination: &str, shards: &[Shard]) -> Result<()> {
        let mut placement = self.placement.lock();
        if !placement.contains_server(destination) {
            return Err(ShardKvError::UnknownServer(destination.to_string()));
        }
        // Shards decoded off the wire bypass Shard::new, so their bounds are
        // not yet trusted. Reject before any trimming happens.
        for moved in shards {
            moved.validate()?;
        }

        for moved in shards {
            for (_, owned) in placement.iter_mut() {
                let mut kept = Vec::with_capacity(owned.len());
                for shard in owned.iter() {
                    if shard.granularity != moved.granularity {
                        // Abort the whole request. Servers already trimmed in
                        // this loop keep their trimmed lists (see module docs).
                        tracing::error!(
                            owned = shard.granularity,
                            moved = moved.granularity,
                            "moving differing shard granularities is not supported"
                        );
                        return Err(ShardKvError::GranularityMismatch {
                            owned: shard.granularity,
                            moved: moved.granularity,
                        });
                    }

                    match overlap(shard, moved) {
                        OverlapStatus::NoOverlap => {
                            // Keep the entire shard
                            kept.push(*shard);
                        }
                        OverlapStatus::OverlapStart => {
                            // Moved range covers the low end: keep the part
                            // above moved.upper
                            kept.push(shard.split(moved.upper, true).1);
                        }
                        OverlapStatus::OverlapEnd => {
                            // Moved range covers the high end: keep the part
                            // below moved.lower
                            kept.push(shard.split(moved.lower, false).0);
                        }
                        OverlapStatus::CompletelyContains => {
                            // Moved range is strictly inside: keep both
                            // remainders
                            kept.push(shard.split(moved.lower, false).0);
                            kept.push(shard.split(moved.upper, true).1);
                        }
                        OverlapStatus::CompletelyContained => {
                            // The owned shard is subsumed entirely: drop it
                        }
                    }
                }
                *owned = kept;
            }
        }

        for moved in shards {
            placement.push_shard(destination, *moved);
            tracing::info!(destination, shard = %moved, "moved shard");
        }
        Ok(())
    }
}

impl Default for ShardController {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ShardController {
    /// Dispatch a decoded request against the controller.
    ///
    /// Administrative failures come back as [`Response::Error`] with the
    /// underlying reason; store-facing requests reaching the controller are
    /// answered with an error response rather than dropped.
    fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        match request {
            Request::Query => Response::Query {
                placement: self.query(),
            },
            Request::Join { server } => match self.join(&server) {
                Ok(()) => Response::Join,
                Err(e) => Response::error(format!("Failed to process Join request: {e}")),
            },
            Request::Leave { server } => match self.leave(&server) {
                Ok(()) => Response::Leave,
                Err(e) => Response::error(format!("Failed to process Leave request: {e}")),
            },
            Request::Move { server, shards } => match self.move_shards(&server, &shards) {
                Ok(()) => Response::Move,
                Err(e) => Response::error(format!("Failed to process Move request: {e}")),
            },
            Request::Get { .. }
            | Request::Put { .. }
            | Request::Append { .. }
            | Request::Delete { .. }
            | Request::MultiGet { .. }
            | Request::MultiPut { .. } => Response::error(format!(
                "{kind} is not a shardcontroller request; send it to a storage server"
            )),
        }
    }
}
