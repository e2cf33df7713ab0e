use std::time::Duration;
use tracing::trace;

/// A timed slow-motion effect. A factor of N lets one frame in N advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowMotionRequest {
    factor: u32,
    remaining: Duration,
}

impl SlowMotionRequest {
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Wall time left before the request expires.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// Frame-skipping throttle shared by every system.
///
/// Any number of requests may overlap; the strongest one wins. The debug
/// factor competes with them for the maximum, and debug pause overrides
/// everything without consuming request time.
#[derive(Debug, Clone)]
pub struct SlowMotion {
    requests: Vec<SlowMotionRequest>,
    frame: u32,
    /// Freeze logic entirely. Requests do not tick down while set.
    pub debug_paused: bool,
    /// Developer speed override, candidate for the combined maximum.
    /// 1 means normal speed.
    pub debug_factor: u32,
}

impl SlowMotion {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            frame: 0,
            debug_paused: false,
            debug_factor: 1,
        }
    }

    /// Slow logic down by `factor` for `duration` of wall time. Factors
    /// below 1 are treated as 1; a zero duration never takes effect.
    pub fn request(&mut self, factor: u32, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let factor = factor.max(1);
        trace!(factor, ?duration, "slow motion requested");
        self.requests.push(SlowMotionRequest {
            factor,
            remaining: duration,
        });
    }

    /// Maximum of all active requests and the debug factor, at least 1.
    pub fn combined_factor(&self) -> u32 {
        self.requests
            .iter()
            .map(|request| request.factor)
            .chain(std::iter::once(self.debug_factor))
            .max()
            .unwrap_or(1)
            .max(1)
    }

    pub fn active_requests(&self) -> &[SlowMotionRequest] {
        &self.requests
    }

    /// Decide how much of `wall_delta` this frame gets.
    ///
    /// The factor in force is the one active when the frame starts; requests
    /// then tick down by the wall delta and expired ones are dropped. The
    /// frame counter advances modulo the factor and only the wrap to zero is
    /// granted the full delta.
    pub fn grant(&mut self, wall_delta: Duration) -> Duration {
        if self.debug_paused {
            return Duration::ZERO;
        }

        let factor = self.combined_factor();
        self.tick_requests(wall_delta);

        self.frame = (self.frame + 1) % factor;
        if self.frame == 0 {
            wall_delta
        } else {
            Duration::ZERO
        }
    }

    /// Drop every request and restart the frame counter.
    pub fn reset(&mut self) {
        self.requests.clear();
        self.frame = 0;
    }

    fn tick_requests(&mut self, wall_delta: Duration) {
        for request in &mut self.requests {
            request.remaining = request.remaining.saturating_sub(wall_delta);
        }
        self.requests.retain(|request| !request.remaining.is_zero());
    }
}

impl Default for SlowMotion {
    fn default() -> Self {
        Self::new()
    }
}
