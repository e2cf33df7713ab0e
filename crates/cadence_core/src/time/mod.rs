//! Frame clock
//!
//! Converts the wall-clock delta of each frame into the logic delta the
//! systems actually get. Slow motion and debug pause work by withholding
//! whole frames: a granted frame advances by the full wall delta, a skipped
//! one by zero, so rendering keeps its rate while logic slows down.

mod clock;
mod slow_motion;

pub use clock::{Clock, ClockConfig, DEFAULT_MAX_FRAME_DELTA};
pub use slow_motion::{SlowMotion, SlowMotionRequest};
