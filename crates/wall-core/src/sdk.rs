//! The seam between the wall and the external player SDK.
//!
//! The SDK is treated as an untrusted service: it becomes usable at some
//! point we do not control (signalled once through `request_load`'s callback),
//! and every instance it hands out may fail any call at any time.  All calls
//! into an instance are routed through [`safe_call`].

use tracing::debug;
use wall_proto::VideoId;

pub use wall_proto::config::PlayerConfig;

/// One-shot notification.  Consumed by `fire`, so it can run at most once.
pub struct ReadyCallback(Box<dyn FnOnce() + Send>);

impl ReadyCallback {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn fire(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for ReadyCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReadyCallback")
    }
}

/// Screen rectangle for a tile's player window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Where a tile's player is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    pub tile: usize,
    pub title: String,
    pub geometry: Option<Geometry>,
}

impl MountTarget {
    pub fn new(tile: usize) -> Self {
        Self {
            tile,
            title: format!("tilewall #{}", tile + 1),
            geometry: None,
        }
    }

    /// Mount targets for `count` tiles laid out row-major on a
    /// `columns`-wide grid covering `width` x `height`.
    pub fn grid(count: usize, columns: u16, width: u32, height: u32) -> Vec<MountTarget> {
        let columns = usize::from(columns.max(1));
        let rows = count.div_ceil(columns).max(1);
        let cell_w = width / columns as u32;
        let cell_h = height / rows as u32;
        (0..count)
            .map(|tile| {
                let (row, col) = (tile / columns, tile % columns);
                MountTarget {
                    geometry: Some(Geometry {
                        x: (col as u32 * cell_w) as i32,
                        y: (row as u32 * cell_h) as i32,
                        width: cell_w,
                        height: cell_h,
                    }),
                    ..MountTarget::new(tile)
                }
            })
            .collect()
    }
}

/// Imperative control surface of one constructed player.
pub trait PlayerInstance: Send {
    fn mute(&mut self) -> anyhow::Result<()>;
    fn unmute(&mut self) -> anyhow::Result<()>;
    /// Volume in percent, 0..=100.
    fn set_volume(&mut self, volume: u8) -> anyhow::Result<()>;
    fn play(&mut self) -> anyhow::Result<()>;
    fn pause(&mut self) -> anyhow::Result<()>;
    fn destroy(&mut self) -> anyhow::Result<()>;
}

pub trait PlayerSdk: Send {
    type Instance: PlayerInstance;

    /// True when the SDK is already usable without loading.
    fn is_loaded(&self) -> bool {
        false
    }

    /// Start fetching the SDK.  `on_loaded` fires once it is usable; it may
    /// never fire if loading fails.  Called at most once per wall.
    fn request_load(&mut self, on_loaded: ReadyCallback);

    /// Build a player for `video` at `mount`.  `on_ready` fires when the
    /// instance can take commands.
    fn construct(
        &mut self,
        mount: &MountTarget,
        video: &VideoId,
        config: &PlayerConfig,
        on_ready: ReadyCallback,
    ) -> anyhow::Result<Self::Instance>;
}

/// Run one operation against an external player and discard any failure.
/// The instance's internal state is not observable from here, so a failed
/// call leaves the tile as it was.
pub fn safe_call<P, F>(tile: usize, op: &'static str, player: &mut P, f: F)
where
    P: PlayerInstance + ?Sized,
    F: FnOnce(&mut P) -> anyhow::Result<()>,
{
    if let Err(e) = f(player) {
        debug!("tile {}: {} failed, ignored: {:#}", tile + 1, op, e);
    }
}
