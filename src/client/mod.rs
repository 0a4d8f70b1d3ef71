//! Client Module
//!
//! Two layers of client:
//! - [`KvClient`]: talks to one storage server over the store-facing
//!   protocol; transport and protocol failures surface as errors.
//! - [`ShardKvClient`]: the routing client. Resolves keys to owning servers
//!   through the shard controller and fans multi-key requests out per
//!   server. Every failure along the way (no owner, unreachable server,
//!   server-side error) collapses to the same negative outcome; callers get
//!   no distinction and no automatic retry.

mod kv;
mod router;

pub use kv::KvClient;
pub use router::ShardKvClient;
