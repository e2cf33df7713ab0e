//! System profiler for timing named systems

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated time spent in one system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTiming {
    pub total: Duration,
    pub calls: u64,
}

impl SystemTiming {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: HashMap<String, SystemTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Add an externally measured sample.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let timing = match self.timings.get_mut(name) {
            Some(timing) => timing,
            None => self.timings.entry(name.to_string()).or_default(),
        };
        timing.total += elapsed;
        timing.calls += 1;
    }

    pub fn get_timing(&self, name: &str) -> SystemTiming {
        self.timings.get(name).copied().unwrap_or_default()
    }

    /// Up to `count` systems ordered by total time, slowest first.
    pub fn slowest(&self, count: usize) -> Vec<(String, SystemTiming)> {
        let mut all: Vec<_> = self
            .timings
            .iter()
            .map(|(name, timing)| (name.clone(), *timing))
            .collect();
        all.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(&b.0)));
        all.truncate(count);
        all
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }
}
