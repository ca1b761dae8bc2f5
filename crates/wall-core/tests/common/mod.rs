#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use wall_core::sdk::{MountTarget, PlayerConfig, PlayerInstance, PlayerSdk, ReadyCallback};
use wall_core::{SdkSignal, TileWall};
use wall_proto::protocol::TILE_COUNT;
use wall_proto::sources::SourceBridge;
use wall_proto::store::MemoryStore;
use wall_proto::VideoId;

/// Everything the fake SDK was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestLoad,
    Construct { tile: usize, video: String, muted: bool },
    Destroy(usize),
    Mute(usize),
    Unmute(usize),
    Volume(usize, u8),
    Play(usize),
    Pause(usize),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    loader: Option<ReadyCallback>,
    ready: Vec<(usize, ReadyCallback)>,
    failing_tiles: Vec<usize>,
    refused_tiles: Vec<usize>,
}

/// Scripted SDK.  Callbacks are held until the test fires them, unless
/// `eager` is set, in which case they fire as soon as they are handed over.
#[derive(Clone, Default)]
pub struct FakeSdk {
    shared: Arc<Mutex<Shared>>,
    eager: bool,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eager() -> Self {
        Self {
            eager: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().unwrap().calls.clear();
    }

    /// Instance calls for one tile, request/construct entries excluded.
    pub fn calls_for(&self, tile: usize) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| match c {
                Call::Construct { tile: t, .. } => *t == tile,
                Call::Destroy(t)
                | Call::Mute(t)
                | Call::Unmute(t)
                | Call::Volume(t, _)
                | Call::Play(t)
                | Call::Pause(t) => *t == tile,
                Call::RequestLoad => false,
            })
            .collect()
    }

    pub fn constructed_tiles(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Construct { tile, .. } => Some(tile),
                _ => None,
            })
            .collect()
    }

    /// Make every instance call on `tile` fail.
    pub fn fail_tile(&self, tile: usize) {
        self.shared.lock().unwrap().failing_tiles.push(tile);
    }

    /// Make construction on `tile` fail.
    pub fn refuse_tile(&self, tile: usize) {
        self.shared.lock().unwrap().refused_tiles.push(tile);
    }

    /// Complete the SDK load.  Returns false if no load was requested.
    pub fn finish_loading(&self) -> bool {
        let loader = self.shared.lock().unwrap().loader.take();
        match loader {
            Some(cb) => {
                cb.fire();
                true
            }
            None => false,
        }
    }

    /// Fire the oldest pending ready callback for `tile`.
    pub fn fire_ready(&self, tile: usize) -> bool {
        let cb = {
            let mut shared = self.shared.lock().unwrap();
            let pos = shared.ready.iter().position(|(t, _)| *t == tile);
            pos.map(|p| shared.ready.remove(p).1)
        };
        match cb {
            Some(cb) => {
                cb.fire();
                true
            }
            None => false,
        }
    }

    fn record(&self, call: Call) {
        self.shared.lock().unwrap().calls.push(call);
    }
}

impl PlayerSdk for FakeSdk {
    type Instance = FakePlayer;

    fn request_load(&mut self, on_loaded: ReadyCallback) {
        self.record(Call::RequestLoad);
        if self.eager {
            on_loaded.fire();
        } else {
            self.shared.lock().unwrap().loader = Some(on_loaded);
        }
    }

    fn construct(
        &mut self,
        mount: &MountTarget,
        video: &VideoId,
        config: &PlayerConfig,
        on_ready: ReadyCallback,
    ) -> anyhow::Result<FakePlayer> {
        self.record(Call::Construct {
            tile: mount.tile,
            video: video.as_str().to_string(),
            muted: config.start_muted,
        });
        if self.shared.lock().unwrap().refused_tiles.contains(&mount.tile) {
            anyhow::bail!("mount for tile {} is unavailable", mount.tile);
        }
        if self.eager {
            on_ready.fire();
        } else {
            self.shared.lock().unwrap().ready.push((mount.tile, on_ready));
        }
        Ok(FakePlayer {
            tile: mount.tile,
            sdk: self.clone(),
        })
    }
}

pub struct FakePlayer {
    tile: usize,
    sdk: FakeSdk,
}

impl FakePlayer {
    fn call(&self, call: Call) -> anyhow::Result<()> {
        self.sdk.record(call);
        if self.sdk.shared.lock().unwrap().failing_tiles.contains(&self.tile) {
            anyhow::bail!("tile {} player is in a bad state", self.tile);
        }
        Ok(())
    }
}

impl PlayerInstance for FakePlayer {
    fn mute(&mut self) -> anyhow::Result<()> {
        self.call(Call::Mute(self.tile))
    }
    fn unmute(&mut self) -> anyhow::Result<()> {
        self.call(Call::Unmute(self.tile))
    }
    fn set_volume(&mut self, volume: u8) -> anyhow::Result<()> {
        self.call(Call::Volume(self.tile, volume))
    }
    fn play(&mut self) -> anyhow::Result<()> {
        self.call(Call::Play(self.tile))
    }
    fn pause(&mut self) -> anyhow::Result<()> {
        self.call(Call::Pause(self.tile))
    }
    fn destroy(&mut self) -> anyhow::Result<()> {
        self.call(Call::Destroy(self.tile))
    }
}

pub fn default_sources() -> Vec<String> {
    wall_proto::config::WallConfig::default().tile_defaults()
}

/// A wall over the fake SDK plus the receiving end of its signal channel.
pub struct Harness {
    pub wall: TileWall<FakeSdk>,
    pub sdk: FakeSdk,
    pub signals: mpsc::UnboundedReceiver<SdkSignal>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_bridge(SourceBridge::new(Box::new(MemoryStore::new())))
    }

    pub fn with_bridge(bridge: SourceBridge) -> Self {
        let sdk = FakeSdk::new();
        let (tx, signals) = mpsc::unbounded_channel();
        let mounts = (0..TILE_COUNT).map(MountTarget::new).collect();
        let wall = TileWall::new(
            sdk.clone(),
            PlayerConfig::default(),
            mounts,
            bridge,
            &default_sources(),
            tx,
        );
        Self { wall, sdk, signals }
    }

    /// Feed every signal raised so far back into the wall.
    pub fn pump(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            self.wall.handle_signal(signal);
        }
    }

    /// Start, complete the SDK load and pump.
    pub fn ready_sdk(&mut self) {
        self.wall.start();
        self.sdk.finish_loading();
        self.pump();
    }

    /// Load `tile` and bring its player to ready.
    pub fn ready_tile(&mut self, tile: usize) {
        self.wall.load_tile(tile).unwrap();
        self.sdk.fire_ready(tile);
        self.pump();
    }
}
