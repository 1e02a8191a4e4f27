//! Raw device state → discrete per-state commands.
//!
//! A state installs an [`InputManager`] around its own [`InputMapper`] when
//! it is initialized, so every state speaks its own command vocabulary.
//! Mappers see both this frame's and last frame's snapshot: movement is
//! typically level-triggered (`is_down`), one-shot actions edge-triggered
//! (`just_pressed`). Rate limiting of weapons is the consumer's job, via
//! [`Cooldown`].

use std::collections::HashSet;
use std::time::Duration;

pub use crossterm::event::KeyCode;

use crate::Result;

// ── Device state ──────────────────────────────────────────────────────────────

/// Keys held down at the moment of polling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardSnapshot {
    held: HashSet<KeyCode>,
}

impl KeyboardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = KeyCode>) -> Self {
        KeyboardSnapshot {
            held: keys.into_iter().collect(),
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: &KeyCode) {
        self.held.remove(key);
    }

    pub fn is_down(&self, key: &KeyCode) -> bool {
        self.held.contains(key)
    }
}

/// Input device collaborator, polled once per frame.
pub trait InputDevice {
    fn current_state(&mut self) -> KeyboardSnapshot;
}

/// A fixed snapshot reports itself on every poll (scripted or replayed input).
impl InputDevice for KeyboardSnapshot {
    fn current_state(&mut self) -> KeyboardSnapshot {
        self.clone()
    }
}

/// This frame's snapshot next to the previous one.
pub struct InputFrame<'a> {
    pub current: &'a KeyboardSnapshot,
    pub previous: &'a KeyboardSnapshot,
}

impl InputFrame<'_> {
    pub fn is_down(&self, key: &KeyCode) -> bool {
        self.current.is_down(key)
    }

    pub fn any_down(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|key| self.current.is_down(key))
    }

    pub fn just_pressed(&self, key: &KeyCode) -> bool {
        self.current.is_down(key) && !self.previous.is_down(key)
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────────

pub trait InputMapper {
    type Command;

    /// Commands derived from this frame, in the order they should run.
    fn commands(&self, frame: &InputFrame<'_>) -> Vec<Self::Command>;
}

pub struct InputManager<M: InputMapper> {
    mapper: M,
    previous: KeyboardSnapshot,
}

impl<M: InputMapper> InputManager<M> {
    pub fn new(mapper: M) -> Self {
        InputManager {
            mapper,
            previous: KeyboardSnapshot::default(),
        }
    }

    /// Invoke `visitor` once per command derived from `snapshot`. A visitor
    /// error stops dispatch; the snapshot is still remembered for edge
    /// detection on the next frame.
    pub fn get_commands<F>(&mut self, snapshot: &KeyboardSnapshot, mut visitor: F) -> Result<()>
    where
        F: FnMut(M::Command) -> Result<()>,
    {
        let commands = self.mapper.commands(&InputFrame {
            current: snapshot,
            previous: &self.previous,
        });
        self.previous = snapshot.clone();
        for command in commands {
            visitor(command)?;
        }
        Ok(())
    }

    /// Poll the device once, then dispatch as [`get_commands`](Self::get_commands).
    pub fn poll_and_dispatch<F>(&mut self, device: &mut dyn InputDevice, visitor: F) -> Result<()>
    where
        F: FnMut(M::Command) -> Result<()>,
    {
        let snapshot = device.current_state();
        self.get_commands(&snapshot, visitor)
    }
}

// ── Cooldown ──────────────────────────────────────────────────────────────────

/// Minimum simulation time between two firings. A new firing is allowed
/// once strictly more than `window` has elapsed since the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cooldown {
    window: Duration,
    last_fired: Option<Duration>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Cooldown {
            window,
            last_fired: None,
        }
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) > self.window,
        }
    }

    /// Record a firing at `now` if the window has elapsed.
    pub fn try_fire(&mut self, now: Duration) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_fired = Some(now);
        true
    }

    pub fn last_fired(&self) -> Option<Duration> {
        self.last_fired
    }
}
