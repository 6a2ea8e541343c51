//! Time sources for the simulation loop.
//!
//! The loop never reads the system clock itself: every iteration asks its
//! [`Clock`] for a [`Tick`]. A [`LogicalClock`] advances by a fixed step and
//! makes runs deterministic and instant; a [`WallClock`] measures real time
//! and can pace the loop with a sleep after every iteration.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{SimError, SimResult};

/// Elapsed time since the run started and time since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub elapsed: f64,
    pub dt: f64,
}

pub trait Clock {
    /// Advance to the next iteration.
    fn tick(&mut self) -> Tick;

    /// Called once at the end of every iteration.
    fn pace(&mut self) {}
}

/// Fixed-step logical time.
#[derive(Debug, Clone)]
pub struct LogicalClock {
    step: f64,
    ticks: u64,
}

impl LogicalClock {
    pub fn new(step: f64) -> SimResult<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SimError::InvalidConfiguration {
                what: "clock step must be positive and finite",
            });
        }
        Ok(Self { step, ticks: 0 })
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

impl Clock for LogicalClock {
    fn tick(&mut self) -> Tick {
        self.ticks += 1;
        // Multiply rather than accumulate so long runs do not drift.
        Tick {
            elapsed: self.ticks as f64 * self.step,
            dt: self.step,
        }
    }
}

/// Real elapsed time, started lazily on the first tick.
///
/// The first tick reports zero elapsed time and a zero `dt`.
#[derive(Debug, Clone)]
pub struct WallClock {
    start: Option<Instant>,
    last: Option<Instant>,
    pace: Duration,
}

impl WallClock {
    /// `pace` is slept after every iteration; zero disables pacing.
    pub fn new(pace: Duration) -> Self {
        Self {
            start: None,
            last: None,
            pace,
        }
    }
}

impl Clock for WallClock {
    fn tick(&mut self) -> Tick {
        let now = Instant::now();
        let start = *self.start.get_or_insert(now);
        let last = self.last.replace(now).unwrap_or(now);
        Tick {
            elapsed: now.duration_since(start).as_secs_f64(),
            dt: now.duration_since(last).as_secs_f64(),
        }
    }

    fn pace(&mut self) {
        if !self.pace.is_zero() {
            thread::sleep(self.pace);
        }
    }
}
