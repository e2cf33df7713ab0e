//! Cadence Core
//!
//! Contains the simulation core of a 2D game loop:
//! - Entity Component System with incremental aspect caching
//! - Frame clock with slow motion and debug pause
//! - Generic timed destruction (aging)
//! - 2D math re-exports

pub mod aging;
pub mod ecs;
pub mod math;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
