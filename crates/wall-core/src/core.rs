/// WallCore: single-owner event loop for the tile wall.
///
/// All tasks that need to change the wall (TUI, HTTP API) send `WallEvent`
/// messages to this loop.  WallCore owns the `TileWall` exclusively; SDK
/// notifications raised from player callbacks come back in on a second
/// channel, so every state change happens on this one task.
///
/// After each event WallCore publishes a fresh `WallState` snapshot into the
/// shared state and broadcasts `BroadcastMessage::StateUpdated`.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};
use wall_proto::config::Config;
use wall_proto::protocol::{Command, WallState, TILE_COUNT};
use wall_proto::sources::SourceBridge;
use wall_proto::store::KeyValueStore;

use crate::error::WallError;
use crate::sdk::{MountTarget, PlayerSdk};
use crate::tiles::BulkOp;
use crate::wall::{SdkSignal, TileWall};

/// All inputs into the WallCore loop.
#[derive(Debug)]
pub enum WallEvent {
    /// A command from the TUI or HTTP API.
    ClientCommand(Command),
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The wall state changed; receivers should read it from `SharedState`.
    StateUpdated,
    /// Something the user should see.  `tile` is set for per-tile failures.
    Notice {
        tile: Option<usize>,
        message: String,
    },
}

/// Latest published wall state, readable from any task.
#[derive(Clone, Default)]
pub struct SharedState {
    state: Arc<RwLock<WallState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_state(&self) -> WallState {
        self.state.read().await.clone()
    }

    /// Replace the published state, bumping `rev`.
    async fn publish(&self, mut next: WallState) -> u64 {
        let mut state = self.state.write().await;
        next.rev = state.rev + 1;
        *state = next;
        state.rev
    }
}

pub struct WallCore<S: PlayerSdk> {
    wall: TileWall<S>,
    shared: SharedState,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    signal_rx: mpsc::UnboundedReceiver<SdkSignal>,
}

impl<S: PlayerSdk> WallCore<S> {
    pub fn new(
        sdk: S,
        config: &Config,
        store: Box<dyn KeyValueStore>,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let mounts = MountTarget::grid(
            TILE_COUNT,
            config.wall.columns,
            config.mpv.screen_width,
            config.mpv.screen_height,
        );
        let wall = TileWall::new(
            sdk,
            config.player.clone(),
            mounts,
            SourceBridge::new(store),
            &config.wall.tile_defaults(),
            signal_tx,
        );
        Self {
            wall,
            shared: SharedState::new(),
            broadcast_tx,
            signal_rx,
        }
    }

    /// Handle to the published state (for the TUI and HTTP server).
    pub fn shared_state(&self) -> SharedState {
        self.shared.clone()
    }

    /// Run the core event loop.  Returns after a `Shutdown` event or once the
    /// event channel closes, having destroyed every player.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<WallEvent>) -> anyhow::Result<()> {
        info!("WallCore: starting event loop");

        let notice_tx = self.broadcast_tx.clone();
        self.wall.on_sdk_ready(move || {
            let _ = notice_tx.send(BroadcastMessage::Notice {
                tile: None,
                message: "player SDK ready".to_string(),
            });
        });
        self.wall.start();
        self.publish().await;

        loop {
            tokio::select! {
                evt = event_rx.recv() => match evt {
                    None => {
                        info!("WallCore: event channel closed, shutting down");
                        break;
                    }
                    Some(WallEvent::Shutdown) => {
                        info!("WallCore: shutdown requested");
                        break;
                    }
                    Some(WallEvent::ClientCommand(cmd)) => {
                        debug!("WallCore: command {:?}", cmd);
                        for e in self.handle_command(cmd) {
                            self.notify(e);
                        }
                        self.publish().await;
                    }
                },
                Some(signal) = self.signal_rx.recv() => {
                    debug!("WallCore: SDK signal {:?}", signal);
                    if self.wall.handle_signal(signal) {
                        self.publish().await;
                    }
                }
            }
        }

        self.wall.teardown_all();
        self.publish().await;
        Ok(())
    }

    fn handle_command(&mut self, cmd: Command) -> Vec<WallError> {
        let result = match cmd {
            Command::Load { tile } => self.wall.load_tile(tile).map(|_| ()),
            Command::Reload { tile } => self.wall.reload(tile),
            Command::LoadAll => return self.wall.load_all(),
            Command::SetSource { tile, reference } => self.wall.set_source(tile, reference),
            Command::Focus { tile } => self.wall.set_active(tile),
            Command::MuteAll => {
                self.wall.bulk(BulkOp::Mute);
                Ok(())
            }
            Command::PauseAll => {
                self.wall.bulk(BulkOp::Pause);
                Ok(())
            }
            Command::PlayAllMuted => {
                self.wall.bulk(BulkOp::PlayMuted);
                Ok(())
            }
            Command::GetState => Ok(()),
        };
        result.err().into_iter().collect()
    }

    fn notify(&self, e: WallError) {
        warn!("{}", e);
        let _ = self.broadcast_tx.send(BroadcastMessage::Notice {
            tile: Some(e.tile()),
            message: e.to_string(),
        });
    }

    async fn publish(&mut self) {
        let rev = self.shared.publish(self.wall.snapshot()).await;
        debug!("WallCore: published rev {}", rev);
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
    }
}
