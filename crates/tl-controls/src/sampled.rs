//! Sampled execution for digital controllers.
//!
//! A controller with a sample period only recomputes once enough time has
//! accumulated. Between samples the previous output is held (zero-order hold)
//! and the next real update sees the full accumulated interval as its `dt`.

use serde::{Deserialize, Serialize};
use tl_core::sanitize_dt;

/// Decides whether a controller call is a real sample or a held one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleGate {
    /// Sample period in seconds. `None` samples on every call.
    pub period: Option<f64>,
    /// Time accumulated since the last sample.
    pending: f64,
    primed: bool,
}

impl SampleGate {
    pub fn new(period: Option<f64>) -> Self {
        Self {
            period,
            pending: 0.0,
            primed: false,
        }
    }

    /// Feed the time elapsed since the previous call.
    ///
    /// Returns the interval to integrate over when a sample is due, or `None`
    /// when the previous output should be held. The first call always samples.
    /// Degenerate `dt` values count as zero elapsed time.
    pub fn poll(&mut self, dt: f64) -> Option<f64> {
        self.pending += sanitize_dt(dt).unwrap_or(0.0);
        match self.period {
            Some(period) if self.primed && self.pending < period => None,
            _ => {
                self.primed = true;
                Some(std::mem::take(&mut self.pending))
            }
        }
    }

    /// Time accumulated towards the next sample.
    pub fn pending(&self) -> f64 {
        self.pending
    }

    pub fn reset(&mut self) {
        self.pending = 0.0;
        self.primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_period_every_call_samples() {
        let mut gate = SampleGate::new(None);
        assert_eq!(gate.poll(0.01), Some(0.01));
        assert_eq!(gate.poll(0.02), Some(0.02));
        assert_eq!(gate.poll(0.0), Some(0.0));
    }

    #[test]
    fn holds_until_period_elapsed() {
        let mut gate = SampleGate::new(Some(0.1));

        // First call always samples.
        assert_eq!(gate.poll(0.03), Some(0.03));

        assert_eq!(gate.poll(0.05), None);
        assert!((gate.pending() - 0.05).abs() < 1e-12);

        let dt = gate.poll(0.05).unwrap();
        assert!((dt - 0.1).abs() < 1e-12);
        assert_eq!(gate.pending(), 0.0);
    }

    #[test]
    fn degenerate_dt_counts_as_zero() {
        let mut gate = SampleGate::new(Some(0.1));
        gate.poll(0.0);
        assert_eq!(gate.poll(f64::NAN), None);
        assert_eq!(gate.poll(-1.0), None);
        assert_eq!(gate.pending(), 0.0);
    }

    #[test]
    fn reset_reprimes_gate() {
        let mut gate = SampleGate::new(Some(1.0));
        gate.poll(0.1);
        assert_eq!(gate.poll(0.1), None);

        gate.reset();
        assert_eq!(gate.poll(0.1), Some(0.1));
    }
}
