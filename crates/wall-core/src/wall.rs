//! `TileWall`: the controller tying the gate, queue, arena, audio focus and
//! source list together.
//!
//! Everything here is synchronous and single-owner.  Asynchronous SDK
//! notifications arrive as [`SdkSignal`]s on the channel handed to `new`;
//! the owner feeds them back through [`TileWall::handle_signal`].

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wall_proto::protocol::{TileSnapshot, TileStatus, WallState};
use wall_proto::sources::SourceBridge;
use wall_proto::{normalize, VideoId};

use crate::error::WallError;
use crate::focus::AudioFocus;
use crate::gate::{DeferredQueue, PendingJob, ReadinessGate};
use crate::sdk::{MountTarget, PlayerConfig, PlayerSdk, ReadyCallback};
use crate::tiles::{BulkOp, TileArena};

/// Notifications raised by the SDK from outside the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkSignal {
    /// The SDK finished loading.
    Loaded,
    /// A constructed player can take commands.
    PlayerReady { tile: usize, generation: u64 },
}

pub struct TileWall<S: PlayerSdk> {
    sdk: S,
    player_config: PlayerConfig,
    gate: ReadinessGate,
    queue: DeferredQueue,
    arena: TileArena<S::Instance>,
    focus: AudioFocus,
    sources: Vec<String>,
    bridge: SourceBridge,
    signals: mpsc::UnboundedSender<SdkSignal>,
}

impl<S: PlayerSdk> TileWall<S> {
    /// One tile per mount.  The source list comes from the bridge, falling
    /// back to `defaults`.
    pub fn new(
        sdk: S,
        player_config: PlayerConfig,
        mounts: Vec<MountTarget>,
        bridge: SourceBridge,
        defaults: &[String],
        signals: mpsc::UnboundedSender<SdkSignal>,
    ) -> Self {
        let mut sources = bridge.load(defaults);
        sources.resize(mounts.len(), String::new());
        Self {
            sdk,
            player_config,
            gate: ReadinessGate::new(),
            queue: DeferredQueue::new(),
            arena: TileArena::new(mounts),
            focus: AudioFocus::new(),
            sources,
            bridge,
            signals,
        }
    }

    /// Begin loading the SDK.  Safe to call more than once.
    pub fn start(&mut self) {
        if self.gate.is_ready() {
            return;
        }
        if self.sdk.is_loaded() {
            self.handle_signal(SdkSignal::Loaded);
            return;
        }
        let tx = self.signals.clone();
        self.gate.ensure_loading(
            &mut self.sdk,
            ReadyCallback::new(move || {
                let _ = tx.send(SdkSignal::Loaded);
            }),
        );
    }

    pub fn is_sdk_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Run `callback` once the SDK is ready (immediately if it already is).
    pub fn on_sdk_ready(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.gate.on_ready(callback);
    }

    pub fn active(&self) -> Option<usize> {
        self.focus.active()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    pub fn status(&self, tile: usize) -> TileStatus {
        if self.queue.contains(tile) {
            TileStatus::Queued
        } else {
            self.arena.status(tile)
        }
    }

    fn check_tile(&self, tile: usize) -> Result<(), WallError> {
        if tile < self.arena.len() {
            Ok(())
        } else {
            Err(WallError::NoSuchTile(tile))
        }
    }

    /// Construct a player for `video` on `tile`, or queue the request until
    /// the SDK is ready.
    pub fn create_or_load(&mut self, tile: usize, video: VideoId) -> Result<(), WallError> {
        self.check_tile(tile)?;
        if !self.gate.is_ready() {
            self.queue.push(PendingJob { tile, video });
            self.start();
            return Ok(());
        }
        self.construct(tile, video, false);
        Ok(())
    }

    fn construct(&mut self, tile: usize, video: VideoId, restore_focus: bool) {
        let Some(vacant) = self.arena.vacate(tile) else {
            return;
        };
        let generation = vacant.generation();
        let tx = self.signals.clone();
        let on_ready = ReadyCallback::new(move || {
            let _ = tx.send(SdkSignal::PlayerReady { tile, generation });
        });
        info!("tile {}: constructing player for {}", tile + 1, video);
        match self
            .sdk
            .construct(vacant.mount(), &video, &self.player_config, on_ready)
        {
            Ok(player) => vacant.occupy(player, video, restore_focus),
            Err(e) => warn!("tile {}: player construction failed: {:#}", tile + 1, e),
        }
    }

    /// Normalize the tile's current source and load it.
    pub fn load_tile(&mut self, tile: usize) -> Result<VideoId, WallError> {
        let video = self.normalized_source(tile)?;
        self.create_or_load(tile, video.clone())?;
        Ok(video)
    }

    /// Load every tile.  A tile that fails to normalize is reported and the
    /// others still load.
    pub fn load_all(&mut self) -> Vec<WallError> {
        (0..self.arena.len())
            .filter_map(|tile| self.load_tile(tile).err())
            .collect()
    }

    /// Destroy the tile's player and load its current source again.  A tile
    /// that held audio focus gets it back once the new player is ready.
    pub fn reload(&mut self, tile: usize) -> Result<(), WallError> {
        self.check_tile(tile)?;
        let had_focus = self.focus.active() == Some(tile);
        self.arena.destroy(tile);
        let video = self.normalized_source(tile)?;
        if self.gate.is_ready() {
            self.construct(tile, video, had_focus);
        } else {
            self.create_or_load(tile, video)?;
        }
        Ok(())
    }

    pub fn set_active(&mut self, tile: usize) -> Result<(), WallError> {
        self.check_tile(tile)?;
        self.focus.set_active(tile, &mut self.arena);
        Ok(())
    }

    pub fn bulk(&mut self, op: BulkOp) {
        self.arena.bulk(op);
    }

    /// Replace a tile's raw source reference and persist the list.  The
    /// reference is stored verbatim; nothing is loaded.
    pub fn set_source(&mut self, tile: usize, reference: String) -> Result<(), WallError> {
        self.check_tile(tile)?;
        self.sources[tile] = reference;
        if let Err(e) = self.bridge.save(&self.sources) {
            warn!("failed to persist sources: {:#}", e);
        }
        Ok(())
    }

    /// Feed back an SDK notification.  Returns whether anything changed.
    pub fn handle_signal(&mut self, signal: SdkSignal) -> bool {
        match signal {
            SdkSignal::Loaded => {
                if !self.gate.mark_ready() {
                    return false;
                }
                let jobs = self.queue.drain();
                info!("draining {} deferred job(s)", jobs.len());
                for job in jobs {
                    self.construct(job.tile, job.video, false);
                }
                true
            }
            SdkSignal::PlayerReady { tile, generation } => {
                let Some(restore_focus) = self.arena.mark_ready(tile, generation) else {
                    return false;
                };
                if restore_focus && self.focus.active() == Some(tile) {
                    debug!("tile {}: restoring audio focus after reload", tile + 1);
                    self.focus.set_active(tile, &mut self.arena);
                }
                true
            }
        }
    }

    pub fn teardown_all(&mut self) {
        let dropped = self.queue.drain().len();
        if dropped > 0 {
            debug!("teardown: discarding {} queued job(s)", dropped);
        }
        self.arena.teardown_all();
    }

    pub fn snapshot(&self) -> WallState {
        WallState {
            rev: 0,
            sdk_ready: self.gate.is_ready(),
            active: self.focus.active(),
            pending_jobs: self.queue.len(),
            tiles: (0..self.arena.len())
                .map(|index| TileSnapshot {
                    index,
                    source: self.sources.get(index).cloned().unwrap_or_default(),
                    video_id: self.arena.video(index).map(|v| v.as_str().to_string()),
                    status: self.status(index),
                })
                .collect(),
        }
    }

    fn normalized_source(&self, tile: usize) -> Result<VideoId, WallError> {
        self.check_tile(tile)?;
        let source = self.sources.get(tile).map(String::as_str).unwrap_or("");
        normalize(source).ok_or(WallError::Unparseable { tile })
    }
}
