//! Tile lifecycle: a fixed arena of slots, each `Empty → Constructing → Ready`.
//!
//! A player can only be installed through a [`VacantTile`], and the only way
//! to get one is [`TileArena::vacate`], which destroys whatever the slot held.
//! So a slot never has two live instances, and a destroy always precedes the
//! next construction for the same slot.

use tracing::{debug, info};
use wall_proto::protocol::TileStatus;
use wall_proto::VideoId;

use crate::sdk::{safe_call, MountTarget, PlayerInstance};

/// Stateless operations applied to every constructed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    Mute,
    Pause,
    /// Mute, then start playback.
    PlayMuted,
}

#[derive(Debug, Default)]
pub enum TileState<P> {
    #[default]
    Empty,
    Constructing {
        player: P,
        generation: u64,
        /// Give audio focus back once this instance is ready.
        restore_focus: bool,
    },
    Ready {
        player: P,
        generation: u64,
    },
}

impl<P> TileState<P> {
    pub fn status(&self) -> TileStatus {
        match self {
            TileState::Empty => TileStatus::Empty,
            TileState::Constructing { .. } => TileStatus::Constructing,
            TileState::Ready { .. } => TileStatus::Ready,
        }
    }

    fn player_mut(&mut self) -> Option<&mut P> {
        match self {
            TileState::Empty => None,
            TileState::Constructing { player, .. } | TileState::Ready { player, .. } => {
                Some(player)
            }
        }
    }
}

#[derive(Debug)]
pub struct TileSlot<P> {
    mount: MountTarget,
    /// Identifier the current instance was built with.
    video: Option<VideoId>,
    state: TileState<P>,
}

impl<P> TileSlot<P> {
    pub fn mount(&self) -> &MountTarget {
        &self.mount
    }

    pub fn video(&self) -> Option<&VideoId> {
        self.video.as_ref()
    }

    pub fn state(&self) -> &TileState<P> {
        &self.state
    }
}

#[derive(Debug)]
pub struct TileArena<P> {
    slots: Vec<TileSlot<P>>,
    next_generation: u64,
}

impl<P: PlayerInstance> TileArena<P> {
    pub fn new(mounts: Vec<MountTarget>) -> Self {
        Self {
            slots: mounts
                .into_iter()
                .map(|mount| TileSlot {
                    mount,
                    video: None,
                    state: TileState::Empty,
                })
                .collect(),
            next_generation: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, tile: usize) -> Option<&TileSlot<P>> {
        self.slots.get(tile)
    }

    pub fn status(&self, tile: usize) -> TileStatus {
        self.slots
            .get(tile)
            .map(|s| s.state.status())
            .unwrap_or_default()
    }

    pub fn is_ready(&self, tile: usize) -> bool {
        self.status(tile) == TileStatus::Ready
    }

    pub fn video(&self, tile: usize) -> Option<&VideoId> {
        self.slots.get(tile).and_then(|s| s.video.as_ref())
    }

    /// Destroy the slot's instance, if any.  Returns whether one existed.
    pub fn destroy(&mut self, tile: usize) -> bool {
        let Some(slot) = self.slots.get_mut(tile) else {
            return false;
        };
        match std::mem::take(&mut slot.state) {
            TileState::Empty => false,
            TileState::Constructing { mut player, .. } | TileState::Ready { mut player, .. } => {
                info!("tile {}: destroying player", tile + 1);
                safe_call(tile, "destroy", &mut player, |p| p.destroy());
                slot.video = None;
                true
            }
        }
    }

    /// Clear the slot and hand out the right to construct into it.
    /// `None` when `tile` is out of range.
    pub fn vacate(&mut self, tile: usize) -> Option<VacantTile<'_, P>> {
        if tile >= self.slots.len() {
            return None;
        }
        self.destroy(tile);
        let generation = self.next_generation;
        self.next_generation += 1;
        Some(VacantTile {
            tile,
            generation,
            slot: &mut self.slots[tile],
        })
    }

    /// Apply an instance's ready signal.  Stale generations (the instance was
    /// destroyed since) are ignored and return `None`; otherwise the slot
    /// becomes Ready, is force-muted and starts playing, and the returned flag
    /// says whether audio focus should be restored to it.
    pub fn mark_ready(&mut self, tile: usize, generation: u64) -> Option<bool> {
        let slot = self.slots.get_mut(tile)?;
        let current = match &slot.state {
            TileState::Constructing { generation: g, .. } => *g,
            _ => {
                debug!("tile {}: ready signal with no pending player", tile + 1);
                return None;
            }
        };
        if current != generation {
            debug!(
                "tile {}: stale ready signal (generation {}, current {})",
                tile + 1,
                generation,
                current
            );
            return None;
        }
        let TileState::Constructing {
            mut player,
            restore_focus,
            ..
        } = std::mem::take(&mut slot.state)
        else {
            return None;
        };
        safe_call(tile, "mute", &mut player, |p| p.mute());
        safe_call(tile, "play", &mut player, |p| p.play());
        slot.state = TileState::Ready { player, generation };
        info!("tile {}: player ready", tile + 1);
        Some(restore_focus)
    }

    /// Ready players with their tile index.
    pub fn ready_players_mut(&mut self) -> impl Iterator<Item = (usize, &mut P)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| match &mut slot.state {
                TileState::Ready { player, .. } => Some((i, player)),
                _ => None,
            })
    }

    /// Apply `op` to every constructed player; absent players are skipped and
    /// one player's failure does not stop the rest.
    pub fn bulk(&mut self, op: BulkOp) {
        debug!("bulk {:?}", op);
        for (tile, slot) in self.slots.iter_mut().enumerate() {
            let Some(player) = slot.state.player_mut() else {
                continue;
            };
            match op {
                BulkOp::Mute => safe_call(tile, "mute", player, |p| p.mute()),
                BulkOp::Pause => safe_call(tile, "pause", player, |p| p.pause()),
                BulkOp::PlayMuted => {
                    safe_call(tile, "mute", player, |p| p.mute());
                    safe_call(tile, "play", player, |p| p.play());
                }
            }
        }
    }

    pub fn teardown_all(&mut self) {
        let destroyed = (0..self.slots.len()).filter(|&i| self.destroy(i)).count();
        info!("teardown: destroyed {} player(s)", destroyed);
    }
}

/// An emptied slot awaiting a new player.
pub struct VacantTile<'a, P> {
    tile: usize,
    generation: u64,
    slot: &'a mut TileSlot<P>,
}

impl<'a, P> VacantTile<'a, P> {
    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn mount(&self) -> &MountTarget {
        &self.slot.mount
    }

    /// Generation the new instance's ready signal must carry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn occupy(self, player: P, video: VideoId, restore_focus: bool) {
        self.slot.video = Some(video);
        self.slot.state = TileState::Constructing {
            player,
            generation: self.generation,
            restore_focus,
        };
    }
}
