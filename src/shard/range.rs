//! Shard range algebra
//!
//! Pure functions over half-open key ranges. These are the primitives the
//! controller's Move operation composes, so their boundary behavior is
//! load-bearing: ranges are `[lower, upper)`, and two shards are only
//! comparable when their granularities match.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShardKvError;

/// Highest supported granularity (full 32-bit CRC coordinate space).
pub const MAX_GRANULARITY: u8 = 32;

/// A contiguous half-open key range `[lower, upper)` at a fixed granularity.
///
/// Granularity `g` means coordinates live in `[0, 2^g)`; a key's coordinate
/// is the top `g` bits of its CRC32 hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Number of hash bits defining the coordinate space
    pub granularity: u8,

    /// Inclusive lower bound
    pub lower: u64,

    /// Exclusive upper bound
    pub upper: u64,
}

/// How shard B's range relates to shard A's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapStatus {
    /// The ranges share no coordinates
    NoOverlap,

    /// B covers A's low end but not its high end
    OverlapStart,

    /// B covers A's high end but not its low end
    OverlapEnd,

    /// B is strictly inside A (both of B's boundaries interior to A)
    CompletelyContains,

    /// A is entirely inside B (B subsumes A, boundaries may touch)
    CompletelyContained,
}

impl Shard {
    /// Create a shard over `[lower, upper)` at the given granularity.
    ///
    /// Precondition: `1 <= granularity <= 32`, `lower < upper`, and
    /// `upper <= 2^granularity`.
    pub fn new(granularity: u8, lower: u64, upper: u64) -> Self {
        assert!(
            (1..=MAX_GRANULARITY).contains(&granularity),
            "granularity must be in 1..=32, got {granularity}"
        );
        assert!(lower < upper, "shard range must be non-empty: [{lower}, {upper})");
        assert!(
            upper <= coordinate_space(granularity),
            "upper bound {upper} exceeds coordinate space at granularity {granularity}"
        );
        Self {
            granularity,
            lower,
            upper,
        }
    }

    /// The shard covering the entire coordinate space at `granularity`.
    pub fn full(granularity: u8) -> Self {
        Self::new(granularity, 0, coordinate_space(granularity))
    }

    /// Check the range invariants on a shard that was not built through
    /// [`Shard::new`].
    ///
    /// The fields are public and the type decodes off the wire, so both
    /// paths bypass the constructor's asserts. Anything accepting shards
    /// from outside the process must validate them before storing or
    /// routing against them.
    pub fn validate(&self) -> Result<(), ShardKvError> {
        if !(1..=MAX_GRANULARITY).contains(&self.granularity) {
            return Err(ShardKvError::InvalidShard(format!(
                "granularity must be in 1..=32, got {}",
                self.granularity
            )));
        }
        if self.lower >= self.upper || self.upper > coordinate_space(self.granularity) {
            return Err(ShardKvError::InvalidShard(format!(
                "invalid range [{}, {}) at granularity {}",
                self.lower, self.upper, self.granularity
            )));
        }
        Ok(())
    }

    /// Map a key to its coordinate at the given granularity.
    ///
    /// Stable across processes: top `granularity` bits of the key's CRC32.
    pub fn coordinate(key: &str, granularity: u8) -> u64 {
        let hash = crc32fast::hash(key.as_bytes()) as u64;
        hash >> (MAX_GRANULARITY - granularity)
    }

    /// Whether this shard's range contains the key's coordinate.
    pub fn contains_key(&self, key: &str) -> bool {
        let coord = Self::coordinate(key, self.granularity);
        self.lower <= coord && coord < self.upper
    }

    /// Divide this shard at `point` into two adjacent shards that partition
    /// the original exactly: `([lower, point), [point, upper))`.
    ///
    /// `keep_upper` signals which half the caller intends to retain; both
    /// halves are always returned. Precondition: `point` is strictly inside
    /// the range.
    pub fn split(&self, point: u64, _keep_upper: bool) -> (Shard, Shard) {
        assert!(
            self.lower < point && point < self.upper,
            "split point {point} not strictly inside [{}, {})",
            self.lower,
            self.upper
        );
        (
            Shard::new(self.granularity, self.lower, point),
            Shard::new(self.granularity, point, self.upper),
        )
    }
}

/// Classify how shard `b`'s range relates to shard `a`'s range.
///
/// Purely a function of the four boundary values; the caller is responsible
/// for checking that the granularities match.
pub fn overlap(a: &Shard, b: &Shard) -> OverlapStatus {
    if b.upper <= a.lower || b.lower >= a.upper {
        OverlapStatus::NoOverlap
    } else if b.lower <= a.lower && a.upper <= b.upper {
        OverlapStatus::CompletelyContained
    } else if a.lower < b.lower && b.upper < a.upper {
        OverlapStatus::CompletelyContains
    } else if b.lower <= a.lower {
        // b.upper < a.upper here, so b covers a's low end only
        OverlapStatus::OverlapStart
    } else {
        // a.lower < b.lower < a.upper <= b.upper
        OverlapStatus::OverlapEnd
    }
}

/// Size of the coordinate space at a granularity: `2^g`.
fn coordinate_space(granularity: u8) -> u64 {
    1u64 << granularity
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})@{}", self.lower, self.upper, self.granularity)
    }
}

impl FromStr for Shard {
    type Err = ShardKvError;

    /// Parse a shard from `granularity:lower:upper`, e.g. `4:0:16`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(ShardKvError::Config(format!(
                "expected granularity:lower:upper, got '{s}'"
            )));
        }

        let granularity: u8 = parts[0]
            .parse()
            .map_err(|_| ShardKvError::Config(format!("invalid granularity '{}'", parts[0])))?;
        let lower: u64 = parts[1]
            .parse()
            .map_err(|_| ShardKvError::Config(format!("invalid lower bound '{}'", parts[1])))?;
        let upper: u64 = parts[2]
            .parse()
            .map_err(|_| ShardKvError::Config(format!("invalid upper bound '{}'", parts[2])))?;

        let shard = Shard {
            granularity,
            lower,
            upper,
        };
        shard.validate()?;
        Ok(shard)
    }
}
