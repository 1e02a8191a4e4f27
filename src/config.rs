/// Runtime settings for the frame loop.
///
/// Gameplay tunables (speeds, cooldowns, explosion ages) stay with the
/// states that own them; this only covers what the host decides.

use std::time::Duration;

use crate::state::{StateKind, Viewport};

pub const DEFAULT_FPS: u32 = 60;

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// World size in simulation units, independent of the output surface.
    pub viewport: Viewport,
    /// Simulation time added per frame. Timers are frame-coupled.
    pub frame: Duration,
    /// A key counts as held if seen within this many frames (for terminals
    /// that never report key release).
    pub hold_window: u64,
    pub seed: u64,
    pub start: StateKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            viewport: Viewport::new(1280.0, 720.0),
            frame: frame_duration(DEFAULT_FPS),
            hold_window: 4,
            seed: 42,
            start: StateKind::Gameplay,
        }
    }
}

impl GameConfig {
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame = frame_duration(fps);
        self
    }

    pub fn fps(&self) -> u32 {
        (1.0 / self.frame.as_secs_f64()).round() as u32
    }
}

fn frame_duration(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}
