//! Shard Controller Tests
//!
//! Tests for Join/Leave/Move/Query against the placement, including every
//! overlap case Move can hit and the documented non-atomic abort.

use shardkv::{Shard, ShardController, ShardKvError};

/// Controller with `servers` joined and the full range at `granularity`
/// moved onto the first one.
fn controller_with(servers: &[&str], granularity: u8) -> ShardController {
    let controller = ShardController::new();
    for server in servers {
        controller.join(server).unwrap();
    }
    controller
        .move_shards(servers[0], &[Shard::full(granularity)])
        .unwrap();
    controller
}

fn owned(controller: &ShardController, server: &str) -> Vec<Shard> {
    controller
        .query()
        .shards(server)
        .expect("server registered")
        .to_vec()
}

// =============================================================================
// Join / Leave Tests
// =============================================================================

#[test]
fn test_join_registers_empty_server() {
    let controller = ShardController::new();
    controller.join("a").unwrap();

    let placement = controller.query();
    assert!(placement.contains_server("a"));
    assert_eq!(placement.shards("a"), Some(&[][..]));
}

#[test]
fn test_duplicate_join_fails() {
    let controller = ShardController::new();
    controller.join("a").unwrap();

    let err = controller.join("a").unwrap_err();
    assert!(matches!(err, ShardKvError::ServerAlreadyJoined(_)));

    // Placement unchanged
    assert_eq!(controller.query().server_count(), 1);
}

#[test]
fn test_leave_unknown_server_fails() {
    let controller = ShardController::new();
    let err = controller.leave("ghost").unwrap_err();
    assert!(matches!(err, ShardKvError::UnknownServer(_)));
}

#[test]
fn test_leave_reassigns_shards_to_first_remaining() {
    let controller = ShardController::new();
    controller.join("a").unwrap();
    controller.join("b").unwrap();
    controller.move_shards("b", &[Shard::full(4)]).unwrap();

    controller.leave("b").unwrap();

    let placement = controller.query();
    assert!(!placement.contains_server("b"));
    assert_eq!(placement.shards("a"), Some(&[Shard::full(4)][..]));
}

#[test]
fn test_leave_last_server_drops_shards() {
    let controller = controller_with(&["a"], 4);
    controller.leave("a").unwrap();

    let placement = controller.query();
    assert!(placement.is_empty());
    assert_eq!(placement.get_server("any-key"), None);
}

// =============================================================================
// Move Tests (one per overlap case)
// =============================================================================

#[test]
fn test_move_to_unknown_server_fails() {
    let controller = controller_with(&["a"], 4);
    let err = controller
        .move_shards("ghost", &[Shard::new(4, 0, 4)])
        .unwrap_err();
    assert!(matches!(err, ShardKvError::UnknownServer(_)));
    // Nothing was trimmed
    assert_eq!(owned(&controller, "a"), vec![Shard::full(4)]);
}

#[test]
fn test_move_no_overlap_keeps_shard() {
    let controller = ShardController::new();
    controller.join("a").unwrap();
    controller.join("b").unwrap();
    controller.move_shards("a", &[Shard::new(4, 0, 4)]).unwrap();

    controller.move_shards("b", &[Shard::new(4, 8, 12)]).unwrap();

    assert_eq!(owned(&controller, "a"), vec![Shard::new(4, 0, 4)]);
    assert_eq!(owned(&controller, "b"), vec![Shard::new(4, 8, 12)]);
}

#[test]
fn test_move_overlap_start_trims_low_end() {
    let controller = controller_with(&["a", "b"], 4);

    controller.move_shards("b", &[Shard::new(4, 0, 4)]).unwrap();

    assert_eq!(owned(&controller, "a"), vec![Shard::new(4, 4, 16)]);
    assert_eq!(owned(&controller, "b"), vec![Shard::new(4, 0, 4)]);
}

#[test]
fn test_move_overlap_end_trims_high_end() {
    let controller = controller_with(&["a", "b"], 4);

    controller.move_shards("b", &[Shard::new(4, 12, 16)]).unwrap();

    assert_eq!(owned(&controller, "a"), vec![Shard::new(4, 0, 12)]);
    assert_eq!(owned(&controller, "b"), vec![Shard::new(4, 12, 16)]);
}

#[test]
fn test_move_contained_range_splits_owner_in_two() {
    let controller = controller_with(&["a", "b"], 4);

    controller.move_shards("b", &[Shard::new(4, 6, 8)]).unwrap();

    assert_eq!(
        owned(&controller, "a"),
        vec![Shard::new(4, 0, 6), Shard::new(4, 8, 16)]
    );
    assert_eq!(owned(&controller, "b"), vec![Shard::new(4, 6, 8)]);
}

#[test]
fn test_move_exact_match_drops_owner_shard() {
    let controller = ShardController::new();
    controller.join("a").unwrap();
    controller.join("b").unwrap();
    controller.move_shards("a", &[Shard::new(4, 4, 8)]).unwrap();

    // Exact match: COMPLETELY_CONTAINED case, a keeps nothing of it
    controller.move_shards("b", &[Shard::new(4, 4, 8)]).unwrap();

    assert_eq!(owned(&controller, "a"), Vec::<Shard>::new());
    assert_eq!(owned(&controller, "b"), vec![Shard::new(4, 4, 8)]);
}

#[test]
fn test_move_later_shards_see_earlier_trimming() {
    let controller = controller_with(&["a", "b"], 4);

    // Both shards in one request; the second trims the already-trimmed list
    controller
        .move_shards("b", &[Shard::new(4, 0, 4), Shard::new(4, 8, 12)])
        .unwrap();

    assert_eq!(
        owned(&controller, "a"),
        vec![Shard::new(4, 4, 8), Shard::new(4, 12, 16)]
    );
    assert_eq!(
        owned(&controller, "b"),
        vec![Shard::new(4, 0, 4), Shard::new(4, 8, 12)]
    );
}

#[test]
fn test_move_rejects_shard_with_invalid_bounds() {
    let controller = ShardController::new();
    controller.join("a").unwrap();

    // Shards decoded off the wire bypass Shard::new, so Move must not trust
    // the bounds. With no owned shards there is no granularity comparison
    // to catch this either.
    let bogus = Shard {
        granularity: 40,
        lower: 0,
        upper: 10,
    };
    let err = controller.move_shards("a", &[bogus]).unwrap_err();
    assert!(matches!(err, ShardKvError::InvalidShard(_)));

    let empty = Shard {
        granularity: 4,
        lower: 8,
        upper: 8,
    };
    assert!(controller.move_shards("a", &[empty]).is_err());

    // Nothing was stored; routing must not panic on the placement
    let placement = controller.query();
    assert_eq!(placement.shards("a"), Some(&[][..]));
    assert_eq!(placement.get_server("some-key"), None);
}

#[test]
fn test_move_granularity_mismatch_aborts_with_partial_trim() {
    let controller = controller_with(&["a", "b"], 4);

    // First shard trims a; second aborts on granularity mismatch
    let err = controller
        .move_shards("b", &[Shard::new(4, 0, 4), Shard::new(8, 0, 2)])
        .unwrap_err();
    assert!(matches!(err, ShardKvError::GranularityMismatch { owned: 4, moved: 8 }));

    // Trimming from the first shard stays applied, but nothing was appended
    // to the destination: the range [0,4) is now unrouteable.
    assert_eq!(owned(&controller, "a"), vec![Shard::new(4, 4, 16)]);
    assert_eq!(owned(&controller, "b"), Vec::<Shard>::new());
}

// =============================================================================
// Placement Invariants
// =============================================================================

#[test]
fn test_every_coordinate_owned_by_exactly_one_server() {
    let controller = controller_with(&["a", "b", "c"], 4);
    controller.move_shards("b", &[Shard::new(4, 2, 6)]).unwrap();
    controller.move_shards("c", &[Shard::new(4, 4, 12)]).unwrap();
    controller.move_shards("b", &[Shard::new(4, 10, 11)]).unwrap();

    let placement = controller.query();
    for coord in 0..16u64 {
        let owners: Vec<&str> = placement
            .iter()
            .filter(|(_, shards)| {
                shards
                    .iter()
                    .any(|s| s.lower <= coord && coord < s.upper)
            })
            .map(|(server, _)| server)
            .collect();
        assert_eq!(owners.len(), 1, "coordinate {coord} owned by {owners:?}");
    }
}

#[test]
fn test_query_returns_snapshot_not_live_view() {
    let controller = controller_with(&["a"], 4);
    let before = controller.query();

    controller.join("b").unwrap();
    controller.move_shards("b", &[Shard::new(4, 0, 8)]).unwrap();

    // The earlier snapshot is unaffected by later mutations
    assert_eq!(before.server_count(), 1);
    assert_eq!(before.shards("a"), Some(&[Shard::full(4)][..]));
}

#[test]
fn test_get_server_resolves_owner() {
    let controller = controller_with(&["s1", "s2"], 32);

    let key = "routed-key";
    let coord = Shard::coordinate(key, 32);
    controller
        .move_shards("s2", &[Shard::new(32, coord, coord + 1)])
        .unwrap();

    let placement = controller.query();
    assert_eq!(placement.get_server(key), Some("s2"));
    assert_eq!(placement.get_server("unmoved-key"), Some("s1"));
}
