use tracing::info;

use crate::sdk::{safe_call, PlayerInstance};
use crate::tiles::TileArena;

pub const FULL_VOLUME: u8 = 100;

/// Tracks which tile may play sound.  At most one tile is unmuted at a time.
#[derive(Debug, Default)]
pub struct AudioFocus {
    active: Option<usize>,
}

impl AudioFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Record `tile` as active, then unmute it at full volume and mute every
    /// other ready tile.  Unready tiles are left alone; they start muted and
    /// the reload path re-applies focus when they become ready.
    pub fn set_active<P: PlayerInstance>(&mut self, tile: usize, arena: &mut TileArena<P>) {
        self.active = Some(tile);
        info!("audio focus -> tile {}", tile + 1);
        for (index, player) in arena.ready_players_mut() {
            if index == tile {
                safe_call(index, "unmute", player, |p| p.unmute());
                safe_call(index, "set_volume", player, |p| p.set_volume(FULL_VOLUME));
            } else {
                safe_call(index, "mute", player, |p| p.mute());
            }
        }
    }
}
