use serde::{Deserialize, Serialize};

/// Number of tiles on the wall.
pub const TILE_COUNT: usize = 6;

/// Requests sent from the UI or HTTP API into the wall core.
/// Tile indexes are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Normalize the tile's source reference and load it.
    Load { tile: usize },
    /// Destroy the tile's player and load its source again.
    Reload { tile: usize },
    LoadAll,
    /// Replace a tile's raw source reference (persisted, not validated).
    SetSource { tile: usize, reference: String },
    /// Give audio focus to a tile.
    Focus { tile: usize },
    MuteAll,
    PauseAll,
    PlayAllMuted,
    GetState,
}

/// Lifecycle of one tile as seen from outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileStatus {
    /// No player instance.
    #[default]
    Empty,
    /// Waiting in the deferred queue for the SDK to load.
    Queued,
    /// Player constructed, waiting for its ready signal.
    Constructing,
    /// Player ready and controllable.
    Ready,
}

impl TileStatus {
    /// Short label for tile headers.
    pub fn label(&self) -> &'static str {
        match self {
            TileStatus::Empty => "empty",
            TileStatus::Queued => "queued",
            TileStatus::Constructing => "loading",
            TileStatus::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub index: usize,
    /// Raw source reference as the user typed it.
    pub source: String,
    /// Identifier the current player was built with, if any.
    pub video_id: Option<String>,
    pub status: TileStatus,
}

/// Full state of the wall.  `rev` increases on every published change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallState {
    #[serde(default)]
    pub rev: u64,
    pub sdk_ready: bool,
    /// Tile holding audio focus.
    pub active: Option<usize>,
    pub pending_jobs: usize,
    pub tiles: Vec<TileSnapshot>,
}

impl WallState {
    pub fn tile(&self, index: usize) -> Option<&TileSnapshot> {
        self.tiles.get(index)
    }
}
