mod common;

use common::{Call, Harness};
use wall_core::tiles::BulkOp;
use wall_core::WallError;
use wall_proto::protocol::TileStatus;
use wall_proto::VideoId;

fn vid(s: &str) -> VideoId {
    VideoId::parse(s).unwrap()
}

#[test]
fn load_all_six_times_before_sdk_is_ready_then_drains_in_order() {
    let mut h = Harness::new();
    for _ in 0..6 {
        assert!(h.wall.load_all().is_empty());
    }
    assert!(!h.wall.is_sdk_ready());
    assert_eq!(h.wall.pending_jobs(), 6);
    assert!((0..6).all(|t| h.wall.status(t) == TileStatus::Queued));
    assert_eq!(h.sdk.calls(), vec![Call::RequestLoad]);

    assert!(h.sdk.finish_loading());
    h.pump();

    assert!(h.wall.is_sdk_ready());
    assert_eq!(h.wall.pending_jobs(), 0);
    assert_eq!(h.sdk.constructed_tiles(), vec![0, 1, 2, 3, 4, 5]);
    assert!(h
        .sdk
        .calls()
        .iter()
        .all(|c| !matches!(c, Call::Construct { muted: false, .. })));
    assert!((0..6).all(|t| h.wall.status(t) == TileStatus::Constructing));
}

#[test]
fn deferred_jobs_keep_arrival_order_not_tile_order() {
    let mut h = Harness::new();
    for tile in [4, 1, 5] {
        h.wall.load_tile(tile).unwrap();
    }
    assert!(h.sdk.constructed_tiles().is_empty());
    h.sdk.finish_loading();
    h.pump();
    assert_eq!(h.sdk.constructed_tiles(), vec![4, 1, 5]);

    // The gate never closes again and the queue stays empty.
    h.wall.load_tile(0).unwrap();
    assert_eq!(h.wall.pending_jobs(), 0);
    assert_eq!(h.sdk.constructed_tiles(), vec![4, 1, 5, 0]);
}

#[test]
fn ready_sdk_bypasses_the_queue() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.wall.create_or_load(5, vid("en2DcyDUYB4")).unwrap();
    assert_eq!(h.wall.pending_jobs(), 0);
    assert_eq!(
        h.sdk.calls_for(5),
        vec![Call::Construct {
            tile: 5,
            video: "en2DcyDUYB4".into(),
            muted: true
        }]
    );
}

#[test]
fn repeated_loaded_signal_constructs_nothing_twice() {
    let mut h = Harness::new();
    h.wall.load_tile(0).unwrap();
    h.sdk.finish_loading();
    h.pump();
    assert!(!h.wall.handle_signal(wall_core::SdkSignal::Loaded));
    assert_eq!(h.sdk.constructed_tiles(), vec![0]);
}

#[test]
fn ready_player_is_muted_then_played() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.ready_tile(2);
    assert_eq!(h.wall.status(2), TileStatus::Ready);
    assert_eq!(
        h.sdk.calls_for(2),
        vec![
            Call::Construct {
                tile: 2,
                video: "CDrm8RhonZU".into(),
                muted: true
            },
            Call::Mute(2),
            Call::Play(2),
        ]
    );
}

#[test]
fn reload_destroys_before_constructing() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.ready_tile(3);
    h.sdk.clear_calls();

    h.wall.reload(3).unwrap();
    assert_eq!(
        h.sdk.calls_for(3),
        vec![
            Call::Destroy(3),
            Call::Construct {
                tile: 3,
                video: "4UkssSAYNIA".into(),
                muted: true
            },
        ]
    );
    assert_eq!(h.wall.status(3), TileStatus::Constructing);
}

#[test]
fn reload_of_empty_tile_just_constructs() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.wall.reload(1).unwrap();
    assert_eq!(h.sdk.constructed_tiles(), vec![1]);
    assert!(!h.sdk.calls().contains(&Call::Destroy(1)));
}

#[test]
fn stale_ready_signal_from_destroyed_player_is_ignored() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.wall.load_tile(0).unwrap();
    h.wall.reload(0).unwrap();

    // Oldest callback belongs to the destroyed instance.
    h.sdk.fire_ready(0);
    h.pump();
    assert_eq!(h.wall.status(0), TileStatus::Constructing);

    h.sdk.fire_ready(0);
    h.pump();
    assert_eq!(h.wall.status(0), TileStatus::Ready);
}

#[test]
fn unparseable_tile_is_reported_and_others_still_load() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.wall.set_source(4, "not a url or id".into()).unwrap();

    let errors = h.wall.load_all();
    assert_eq!(errors, vec![WallError::Unparseable { tile: 4 }]);
    assert_eq!(h.sdk.constructed_tiles(), vec![0, 1, 2, 3, 5]);
    assert_eq!(h.wall.status(4), TileStatus::Empty);
}

#[test]
fn reload_with_bad_source_leaves_tile_empty() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.ready_tile(1);
    h.wall.set_source(1, "".into()).unwrap();

    assert_eq!(h.wall.reload(1), Err(WallError::Unparseable { tile: 1 }));
    assert!(h.sdk.calls().contains(&Call::Destroy(1)));
    assert_eq!(h.wall.status(1), TileStatus::Empty);
}

#[test]
fn out_of_range_tiles_are_rejected() {
    let mut h = Harness::new();
    assert_eq!(h.wall.load_tile(6), Err(WallError::NoSuchTile(6)));
    assert_eq!(h.wall.reload(9), Err(WallError::NoSuchTile(9)));
    assert_eq!(h.wall.set_active(6), Err(WallError::NoSuchTile(6)));
    assert_eq!(
        h.wall.set_source(6, "x".into()),
        Err(WallError::NoSuchTile(6))
    );
    assert!(h.sdk.calls().is_empty());
}

#[test]
fn failed_construction_leaves_tile_empty() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.sdk.refuse_tile(2);
    h.wall.load_tile(2).unwrap();
    assert_eq!(h.wall.status(2), TileStatus::Empty);
    assert!(h.wall.snapshot().tiles[2].video_id.is_none());
}

#[test]
fn bulk_ops_cover_constructed_players_and_survive_failures() {
    let mut h = Harness::new();
    h.ready_sdk();
    h.ready_tile(0);
    h.ready_tile(1);
    h.wall.load_tile(2).unwrap();
    h.sdk.fail_tile(1);
    h.sdk.clear_calls();

    h.wall.bulk(BulkOp::Pause);
    assert_eq!(
        h.sdk.calls(),
        vec![Call::Pause(0), Call::Pause(1), Call::Pause(2)]
    );

    h.sdk.clear_calls();
    h.wall.bulk(BulkOp::PlayMuted);
    assert_eq!(
        h.sdk.calls(),
        vec![
            Call::Mute(0),
            Call::Play(0),
            Call::Mute(1),
            Call::Play(1),
            Call::Mute(2),
            Call::Play(2),
        ]
    );
}

#[test]
fn teardown_destroys_every_player_and_clears_the_queue() {
    let mut h = Harness::new();
    h.wall.load_tile(5).unwrap();
    h.sdk.finish_loading();
    h.pump();
    h.ready_tile(0);
    h.wall.load_tile(3).unwrap();
    h.sdk.clear_calls();

    h.wall.teardown_all();
    let mut destroyed: Vec<Call> = h.sdk.calls();
    destroyed.sort_by_key(|c| format!("{c:?}"));
    assert_eq!(
        destroyed,
        vec![Call::Destroy(0), Call::Destroy(3), Call::Destroy(5)]
    );
    assert!((0..6).all(|t| h.wall.status(t) == TileStatus::Empty));
}

#[test]
fn snapshot_reflects_queue_and_players() {
    let mut h = Harness::new();
    h.wall.load_tile(1).unwrap();
    let state = h.wall.snapshot();
    assert!(!state.sdk_ready);
    assert_eq!(state.pending_jobs, 1);
    assert_eq!(state.tiles.len(), 6);
    assert_eq!(state.tiles[1].status, TileStatus::Queued);
    assert_eq!(state.tiles[1].source, "https://www.youtube.com/watch?v=dAfq7g3JQI8");

    h.sdk.finish_loading();
    h.pump();
    h.sdk.fire_ready(1);
    h.pump();
    let state = h.wall.snapshot();
    assert!(state.sdk_ready);
    assert_eq!(state.tiles[1].status, TileStatus::Ready);
    assert_eq!(state.tiles[1].video_id.as_deref(), Some("dAfq7g3JQI8"));
    assert_eq!(state.tiles[0].status, TileStatus::Empty);
}
