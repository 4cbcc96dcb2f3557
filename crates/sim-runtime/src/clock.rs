//! Elapsed-time sources for driving [`EconomyEngine::tick`](crate::EconomyEngine::tick).

use std::time::Instant;

/// Supplies seconds elapsed since the previous call.
pub trait Clock {
    fn delta_secs(&mut self) -> f64;
}

/// Monotonic wall clock.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn delta_secs(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        dt
    }
}

/// Scripted clock: time passes only when told to.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    pending: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `secs` to be reported by the next [`Clock::delta_secs`] call.
    pub fn advance(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.pending += secs;
        }
    }
}

impl Clock for ManualClock {
    fn delta_secs(&mut self) -> f64 {
        std::mem::take(&mut self.pending)
    }
}
