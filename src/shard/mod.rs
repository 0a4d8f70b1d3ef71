//! Shard Module
//!
//! Key-range sharding primitives and the server-to-shards placement map.
//!
//! ## Responsibilities
//! - Represent a contiguous half-open key range at a fixed granularity
//! - Classify how two shards' ranges relate (overlap algebra)
//! - Split a shard at an interior boundary point
//! - Map keys to owning servers through a placement table
//!
//! ## Coordinate Scheme
//! A granularity `g` defines the coordinate space `[0, 2^g)`. A key maps to
//! a coordinate by taking the top `g` bits of its CRC32 hash. The hash must
//! be identical across controller, servers, and clients, which is why a
//! process-seeded hasher is not an option here.

mod placement;
mod range;

pub use placement::ShardPlacement;
pub use range::{overlap, OverlapStatus, Shard, MAX_GRANULARITY};
