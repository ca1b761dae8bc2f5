mod common;

use std::time::Duration;

use common::{Call, FakeSdk};
use tokio::sync::{broadcast, mpsc};
use wall_core::{BroadcastMessage, SharedState, WallCore, WallEvent};
use wall_proto::config::Config;
use wall_proto::protocol::{Command, TileStatus, WallState};
use wall_proto::store::MemoryStore;

async fn wait_for(shared: &SharedState, pred: impl Fn(&WallState) -> bool) -> WallState {
    for _ in 0..400 {
        let state = shared.get_state().await;
        if pred(&state) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("state never matched: {:?}", shared.get_state().await);
}

fn start(
    sdk: &FakeSdk,
) -> (
    mpsc::Sender<WallEvent>,
    broadcast::Receiver<BroadcastMessage>,
    SharedState,
    tokio::task::JoinHandle<anyhow::Result<()>>,
) {
    let (broadcast_tx, broadcast_rx) = broadcast::channel(1024);
    let (event_tx, event_rx) = mpsc::channel(64);
    let core = WallCore::new(
        sdk.clone(),
        &Config::default(),
        Box::new(MemoryStore::new()),
        broadcast_tx,
    );
    let shared = core.shared_state();
    let handle = tokio::spawn(core.run(event_rx));
    (event_tx, broadcast_rx, shared, handle)
}

#[tokio::test]
async fn commands_flow_through_the_core() {
    let sdk = FakeSdk::eager();
    let (event_tx, mut broadcast_rx, shared, handle) = start(&sdk);

    event_tx
        .send(WallEvent::ClientCommand(Command::LoadAll))
        .await
        .unwrap();
    let state = wait_for(&shared, |s| {
        s.sdk_ready && s.tiles.iter().all(|t| t.status == TileStatus::Ready)
    })
    .await;
    assert_eq!(state.pending_jobs, 0);
    assert_eq!(state.tiles[4].video_id.as_deref(), Some("-dMtaC5QaUk"));

    event_tx
        .send(WallEvent::ClientCommand(Command::Focus { tile: 4 }))
        .await
        .unwrap();
    let state = wait_for(&shared, |s| s.active == Some(4)).await;
    assert!(state.rev > 1);
    assert!(sdk.calls().contains(&Call::Unmute(4)));

    event_tx
        .send(WallEvent::ClientCommand(Command::SetSource {
            tile: 0,
            reference: "nope".into(),
        }))
        .await
        .unwrap();
    event_tx
        .send(WallEvent::ClientCommand(Command::Load { tile: 0 }))
        .await
        .unwrap();

    let notice = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(BroadcastMessage::Notice {
                tile: Some(tile),
                message,
            }) = broadcast_rx.recv().await
            {
                return (tile, message);
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(notice.0, 0);
    assert!(notice.1.contains("tile 1"));

    event_tx.send(WallEvent::Shutdown).await.unwrap();
    handle.await.unwrap().unwrap();

    for tile in 0..6 {
        assert!(sdk.calls().contains(&Call::Destroy(tile)), "tile {tile}");
    }
    let state = shared.get_state().await;
    assert!(state.tiles.iter().all(|t| t.status == TileStatus::Empty));
    assert_eq!(state.tiles[0].source, "nope");
}

#[tokio::test]
async fn closing_the_event_channel_stops_the_core() {
    let sdk = FakeSdk::eager();
    let (event_tx, _broadcast_rx, shared, handle) = start(&sdk);
    event_tx
        .send(WallEvent::ClientCommand(Command::Load { tile: 2 }))
        .await
        .unwrap();
    wait_for(&shared, |s| s.tiles[2].status == TileStatus::Ready).await;

    drop(event_tx);
    handle.await.unwrap().unwrap();
    assert!(sdk.calls().contains(&Call::Destroy(2)));
}

#[tokio::test]
async fn sdk_ready_notice_is_broadcast() {
    let sdk = FakeSdk::eager();
    let (event_tx, mut broadcast_rx, _shared, handle) = start(&sdk);

    let message = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(BroadcastMessage::Notice { tile: None, message }) = broadcast_rx.recv().await {
                return message;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(message, "player SDK ready");

    event_tx.send(WallEvent::Shutdown).await.unwrap();
    handle.await.unwrap().unwrap();
}
