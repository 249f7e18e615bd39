//! Dendro Cores left on the field by Bloom

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reactor_core::{seconds_to_frames, EntityId, Frame};

/// Seconds a core waits before bursting on its own
pub const CORE_FUSE_SECONDS: f64 = 6.0;
/// Cores alive at once; spawning past this bursts the oldest
pub const MAX_CORES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DendroCore {
    pub id: u64,
    /// Entity whose Bloom created the core
    pub owner: EntityId,
    /// Entity the core sits next to
    pub target: EntityId,
    pub spawned_frame: Frame,
}

impl DendroCore {
    pub fn expires_at(&self) -> Frame {
        self.spawned_frame + seconds_to_frames(CORE_FUSE_SECONDS)
    }
}

/// All live cores, oldest first
#[derive(Debug, Clone, Default)]
pub struct DendroField {
    cores: VecDeque<DendroCore>,
    next_id: u64,
}

impl DendroField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a core. Returns the core pushed out by the cap, if any.
    pub fn spawn(&mut self, owner: EntityId, target: EntityId, now: Frame) -> Option<DendroCore> {
        let core = DendroCore {
            id: self.next_id,
            owner,
            target,
            spawned_frame: now,
        };
        self.next_id += 1;
        self.cores.push_back(core);
        debug!("Dendro Core {} spawned near {target}", core.id);

        if self.cores.len() > MAX_CORES {
            self.cores.pop_front()
        } else {
            None
        }
    }

    /// Remove and return cores whose fuse has run out
    pub fn expire(&mut self, now: Frame) -> Vec<DendroCore> {
        let mut expired = Vec::new();
        while let Some(core) = self.cores.front() {
            if core.expires_at() > now {
                break;
            }
            if let Some(core) = self.cores.pop_front() {
                expired.push(core);
            }
        }
        expired
    }

    /// Take the oldest core near `target`
    pub fn take_near(&mut self, target: EntityId) -> Option<DendroCore> {
        let index = self.cores.iter().position(|c| c.target == target)?;
        self.cores.remove(index)
    }

    pub fn count_near(&self, target: EntityId) -> usize {
        self.cores.iter().filter(|c| c.target == target).count()
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}
