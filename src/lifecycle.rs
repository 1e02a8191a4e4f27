//! Frame-counted lifetimes for transient entities and the pending-action
//! queue used for delayed removals.

use std::time::Duration;

use log::debug;

// ── Lifetime ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifePhase {
    /// Emitting / fully alive.
    Active,
    /// Past the active threshold: still visible, no longer emitting.
    Fading,
    /// Past the max age: due for removal.
    Expired,
}

/// Age in frame ticks with two exclusive thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetime {
    age: u32,
    active_length: u32,
    max_age: u32,
}

impl Lifetime {
    pub fn new(active_length: u32, max_age: u32) -> Self {
        Lifetime {
            age: 0,
            active_length,
            max_age,
        }
    }

    /// Never fades or expires on its own; the owner decides.
    pub fn unbounded() -> Self {
        Lifetime::new(u32::MAX, u32::MAX)
    }

    pub fn tick(&mut self) -> LifePhase {
        self.age = self.age.saturating_add(1);
        self.phase()
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn phase(&self) -> LifePhase {
        if self.age > self.max_age {
            LifePhase::Expired
        } else if self.age > self.active_length {
            LifePhase::Fading
        } else {
            LifePhase::Active
        }
    }
}

// ── Deferred actions ──────────────────────────────────────────────────────────

/// Actions waiting for a simulation timestamp. Drained once per frame; an
/// action is due when `now >= due`. Dropping or clearing the queue cancels
/// everything still pending.
#[derive(Debug)]
pub struct DeferredQueue<A> {
    pending: Vec<(Duration, A)>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        DeferredQueue {
            pending: Vec::new(),
        }
    }
}

impl<A: std::fmt::Debug> DeferredQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, action: A) {
        debug!("deferred {:?} until {:.3}s", action, due.as_secs_f64());
        // keep sorted by due time, FIFO among equal times
        let at = self.pending.partition_point(|(t, _)| *t <= due);
        self.pending.insert(at, (due, action));
    }

    pub fn drain_due(&mut self, now: Duration) -> Vec<A> {
        let split = self.pending.partition_point(|(t, _)| *t <= now);
        self.pending.drain(..split).map(|(_, action)| action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything; returns how many actions were dropped.
    pub fn clear(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }
}
