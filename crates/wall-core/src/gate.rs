//! SDK readiness gate and the deferred action queue.
//!
//! ```text
//!   NotReady ──mark_ready()──▶ Ready      (one-way, terminal)
//! ```
//!
//! Creation requests that arrive while the gate is closed wait in the
//! `DeferredQueue` and are drained, in arrival order, by the controller on
//! the single `NotReady → Ready` transition.

use std::collections::VecDeque;

use tracing::{debug, info};
use wall_proto::VideoId;

use crate::sdk::{PlayerSdk, ReadyCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    NotReady,
    Ready,
}

#[derive(Debug, Default)]
pub struct ReadinessGate {
    state: GateState,
    load_requested: bool,
    subscribers: Vec<ReadyCallback>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == GateState::Ready
    }

    /// Ask the SDK to load unless already ready or already asked.
    /// Returns true only for the call that issued the request.
    pub fn ensure_loading<S: PlayerSdk + ?Sized>(
        &mut self,
        sdk: &mut S,
        on_loaded: ReadyCallback,
    ) -> bool {
        if self.is_ready() || self.load_requested {
            return false;
        }
        self.load_requested = true;
        info!("requesting player SDK load");
        sdk.request_load(on_loaded);
        true
    }

    /// Register a listener for the ready transition.  Listeners run in
    /// registration order; a listener added after the transition runs now.
    pub fn on_ready(&mut self, callback: impl FnOnce() + Send + 'static) {
        if self.is_ready() {
            callback();
        } else {
            self.subscribers.push(ReadyCallback::new(callback));
        }
    }

    /// Open the gate.  Returns true only on the transition itself; later
    /// calls are no-ops.
    pub fn mark_ready(&mut self) -> bool {
        if self.is_ready() {
            debug!("SDK ready signal repeated, ignoring");
            return false;
        }
        self.state = GateState::Ready;
        info!("player SDK ready");
        for subscriber in std::mem::take(&mut self.subscribers) {
            subscriber.fire();
        }
        true
    }
}

/// A creation request waiting for the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingJob {
    pub tile: usize,
    pub video: VideoId,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    jobs: VecDeque<PendingJob>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job.  A tile that is already queued keeps its place and
    /// takes the newer identifier, so each tile is queued at most once.
    /// Draining both jobs would construct and then replace the same tile,
    /// ending on the newer identifier either way.
    pub fn push(&mut self, job: PendingJob) {
        if let Some(existing) = self.jobs.iter_mut().find(|j| j.tile == job.tile) {
            debug!(
                "tile {}: queued job updated {} -> {}",
                job.tile + 1,
                existing.video,
                job.video
            );
            existing.video = job.video;
            return;
        }
        debug!("tile {}: queued {} until SDK is ready", job.tile + 1, job.video);
        self.jobs.push_back(job);
    }

    /// Remove and return every job in arrival order.
    pub fn drain(&mut self) -> Vec<PendingJob> {
        self.jobs.drain(..).collect()
    }

    pub fn contains(&self, tile: usize) -> bool {
        self.jobs.iter().any(|j| j.tile == tile)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
