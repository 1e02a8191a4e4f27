//! Runtime core of a 2D arcade shooter: game-state machine, entity registry,
//! command-driven input, event notification and AABB collision.

pub mod collision;
pub mod config;
pub mod content;
pub mod dev;
pub mod entities;
pub mod error;
pub mod events;
pub mod gameplay;
pub mod input;
pub mod lifecycle;
pub mod machine;
pub mod particles;
pub mod registry;
pub mod state;

pub use error::{GameError, Result};
