use super::SlowMotion;
use std::time::Duration;
use tracing::trace;

/// Largest wall delta a single frame may hand to the clock. Longer hitches
/// (debugger breaks, window drags) are clamped so logic never jumps.
pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Clock settings applied at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub max_frame_delta: Duration,
    pub debug_factor: u32,
    pub debug_paused: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            debug_factor: 1,
            debug_paused: false,
        }
    }
}

/// Logic time tracker.
///
/// `gametime` only moves by granted deltas, so it stands still during pause
/// and crawls during slow motion while the frame count keeps climbing.
#[derive(Debug, Clone)]
pub struct Clock {
    gametime: Duration,
    frame_count: u64,
    skipped_frames: u64,
    max_frame_delta: Duration,
    slow_motion: SlowMotion,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_config(ClockConfig::default())
    }

    pub fn with_config(config: ClockConfig) -> Self {
        let mut slow_motion = SlowMotion::new();
        slow_motion.debug_factor = config.debug_factor;
        slow_motion.debug_paused = config.debug_paused;
        Self {
            gametime: Duration::ZERO,
            frame_count: 0,
            skipped_frames: 0,
            max_frame_delta: config.max_frame_delta,
            slow_motion,
        }
    }

    /// Start a frame: clamp the wall delta, ask slow motion how much of it
    /// logic gets, and advance game time by that amount.
    pub fn advance(&mut self, wall_delta: Duration) -> Duration {
        let wall_delta = wall_delta.min(self.max_frame_delta);
        let granted = self.slow_motion.grant(wall_delta);

        self.frame_count += 1;
        if granted.is_zero() && !wall_delta.is_zero() {
            self.skipped_frames += 1;
        }
        self.gametime += granted;
        trace!(
            frame = self.frame_count,
            ?wall_delta,
            ?granted,
            "clock advanced"
        );
        granted
    }

    /// Total granted logic time. Monotonic.
    pub fn gametime(&self) -> Duration {
        self.gametime
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames whose wall delta was withheld by slow motion or pause.
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    pub fn slow_motion(&self) -> &SlowMotion {
        &self.slow_motion
    }

    pub fn slow_motion_mut(&mut self) -> &mut SlowMotion {
        &mut self.slow_motion
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
