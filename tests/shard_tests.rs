//! Shard Algebra Tests
//!
//! Tests for overlap classification, splitting, and key coordinates.

use shardkv::{overlap, OverlapStatus, Shard};

// =============================================================================
// Overlap Classification Tests
// =============================================================================

#[test]
fn test_no_overlap_disjoint() {
    let a = Shard::new(4, 0, 4);
    let b = Shard::new(4, 8, 12);
    assert_eq!(overlap(&a, &b), OverlapStatus::NoOverlap);
    assert_eq!(overlap(&b, &a), OverlapStatus::NoOverlap);
}

#[test]
fn test_no_overlap_touching_boundaries() {
    // Half-open ranges: [0,4) and [4,8) share no coordinates
    let a = Shard::new(4, 0, 4);
    let b = Shard::new(4, 4, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::NoOverlap);
    assert_eq!(overlap(&b, &a), OverlapStatus::NoOverlap);
}

#[test]
fn test_overlap_start() {
    // b covers a's low end
    let a = Shard::new(4, 4, 12);
    let b = Shard::new(4, 2, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::OverlapStart);
}

#[test]
fn test_overlap_end() {
    // b covers a's high end
    let a = Shard::new(4, 4, 12);
    let b = Shard::new(4, 8, 14);
    assert_eq!(overlap(&a, &b), OverlapStatus::OverlapEnd);
}

#[test]
fn test_overlap_start_end_symmetry() {
    // Swapping A and B flips OverlapStart and OverlapEnd
    let a = Shard::new(4, 4, 12);
    let b = Shard::new(4, 2, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::OverlapStart);
    assert_eq!(overlap(&b, &a), OverlapStatus::OverlapEnd);
}

#[test]
fn test_completely_contains() {
    // b strictly inside a
    let a = Shard::new(4, 0, 16);
    let b = Shard::new(4, 4, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::CompletelyContains);
}

#[test]
fn test_completely_contained() {
    // a entirely inside b
    let a = Shard::new(4, 4, 8);
    let b = Shard::new(4, 0, 16);
    assert_eq!(overlap(&a, &b), OverlapStatus::CompletelyContained);
}

#[test]
fn test_contains_contained_symmetry() {
    let a = Shard::new(4, 0, 16);
    let b = Shard::new(4, 4, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::CompletelyContains);
    assert_eq!(overlap(&b, &a), OverlapStatus::CompletelyContained);
}

#[test]
fn test_equal_ranges_are_contained() {
    // An exact match counts as contained (the shard is subsumed)
    let a = Shard::new(4, 4, 8);
    let b = Shard::new(4, 4, 8);
    assert_eq!(overlap(&a, &b), OverlapStatus::CompletelyContained);
}

#[test]
fn test_shared_lower_boundary_is_contained() {
    // b covers a from its lower boundary through its upper: subsumed
    let a = Shard::new(4, 4, 8);
    let b = Shard::new(4, 4, 12);
    assert_eq!(overlap(&a, &b), OverlapStatus::CompletelyContained);
}

// =============================================================================
// Split Tests
// =============================================================================

#[test]
fn test_split_partitions_exactly() {
    let shard = Shard::new(4, 2, 14);
    let (lower_part, upper_part) = shard.split(6, true);

    assert_eq!(lower_part, Shard::new(4, 2, 6));
    assert_eq!(upper_part, Shard::new(4, 6, 14));

    // Halves are adjacent and preserve the original boundaries
    assert_eq!(lower_part.upper, upper_part.lower);
    assert_eq!(lower_part.lower, shard.lower);
    assert_eq!(upper_part.upper, shard.upper);
}

#[test]
fn test_split_preserves_granularity() {
    let shard = Shard::new(8, 0, 256);
    let (lower_part, upper_part) = shard.split(100, false);
    assert_eq!(lower_part.granularity, 8);
    assert_eq!(upper_part.granularity, 8);
}

#[test]
fn test_split_every_interior_point() {
    let shard = Shard::new(4, 3, 9);
    for point in 4..9 {
        let (lower_part, upper_part) = shard.split(point, true);
        assert_eq!(lower_part.upper, point);
        assert_eq!(upper_part.lower, point);
        assert_eq!(lower_part.lower, 3);
        assert_eq!(upper_part.upper, 9);
    }
}

#[test]
#[should_panic]
fn test_split_at_lower_boundary_panics() {
    let shard = Shard::new(4, 2, 14);
    shard.split(2, true);
}

// =============================================================================
// Coordinate Tests
// =============================================================================

#[test]
fn test_coordinate_is_stable() {
    let c1 = Shard::coordinate("some-key", 16);
    let c2 = Shard::coordinate("some-key", 16);
    assert_eq!(c1, c2);
}

#[test]
fn test_coordinate_within_space() {
    for key in ["a", "b", "hello", "shard-kv", ""] {
        let coord = Shard::coordinate(key, 4);
        assert!(coord < 16, "coordinate {coord} out of range for granularity 4");
    }
}

#[test]
fn test_full_shard_contains_every_key() {
    let full = Shard::full(8);
    for key in ["a", "b", "hello", "shard-kv", "another key"] {
        assert!(full.contains_key(key));
    }
}

#[test]
fn test_contains_key_respects_bounds() {
    let key = "pinned-key";
    let coord = Shard::coordinate(key, 32);

    let covering = Shard::new(32, coord, coord + 1);
    assert!(covering.contains_key(key));

    if coord > 0 {
        let below = Shard::new(32, 0, coord);
        assert!(!below.contains_key(key));
    }
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validate_rejects_fieldwise_invalid_shards() {
    // Public fields and wire decoding both bypass Shard::new
    let bogus = Shard {
        granularity: 40,
        lower: 0,
        upper: 10,
    };
    assert!(bogus.validate().is_err());

    assert!(Shard { granularity: 0, lower: 0, upper: 1 }.validate().is_err());
    assert!(Shard { granularity: 4, lower: 8, upper: 8 }.validate().is_err());
    assert!(Shard { granularity: 4, lower: 12, upper: 4 }.validate().is_err());
    assert!(Shard { granularity: 4, lower: 0, upper: 17 }.validate().is_err());

    assert!(Shard { granularity: 4, lower: 0, upper: 16 }.validate().is_ok());
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_shard() {
    let shard: Shard = "4:0:16".parse().unwrap();
    assert_eq!(shard, Shard::new(4, 0, 16));
}

#[test]
fn test_parse_shard_rejects_bad_input() {
    assert!("".parse::<Shard>().is_err());
    assert!("4:0".parse::<Shard>().is_err());
    assert!("4:8:8".parse::<Shard>().is_err()); // empty range
    assert!("4:8:4".parse::<Shard>().is_err()); // inverted range
    assert!("4:0:17".parse::<Shard>().is_err()); // beyond coordinate space
    assert!("0:0:1".parse::<Shard>().is_err()); // granularity zero
    assert!("33:0:1".parse::<Shard>().is_err()); // granularity too large
    assert!("x:0:1".parse::<Shard>().is_err());
}

#[test]
fn test_display_round_trips_through_parse() {
    let shard = Shard::new(6, 5, 40);
    let parsed: Shard = format!(
        "{}:{}:{}",
        shard.granularity, shard.lower, shard.upper
    )
    .parse()
    .unwrap();
    assert_eq!(parsed, shard);
    assert_eq!(shard.to_string(), "[5, 40)@6");
}
