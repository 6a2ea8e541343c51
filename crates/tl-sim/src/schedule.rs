//! Scheduled setpoint changes.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Replace the setpoint with `value` once elapsed time has passed `at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointChange {
    /// Elapsed time threshold (seconds).
    pub at: f64,
    pub value: f64,
}

/// Ordered setpoint changes, each applied exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetpointSchedule {
    changes: Vec<SetpointChange>,
    next: usize,
}

impl SetpointSchedule {
    /// Build a schedule. Changes are sorted by time; ties keep their order.
    pub fn new(mut changes: Vec<SetpointChange>) -> SimResult<Self> {
        for change in &changes {
            if !(change.at.is_finite() && change.at >= 0.0) {
                return Err(SimError::InvalidConfiguration {
                    what: "setpoint change time must be finite and non-negative",
                });
            }
            if !change.value.is_finite() {
                return Err(SimError::InvalidConfiguration {
                    what: "setpoint change value must be finite",
                });
            }
        }
        changes.sort_by(|a, b| a.at.total_cmp(&b.at));
        Ok(Self { changes, next: 0 })
    }

    /// Schedule with no changes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One change at `at`.
    pub fn single(at: f64, value: f64) -> SimResult<Self> {
        Self::new(vec![SetpointChange { at, value }])
    }

    /// Changes whose threshold `elapsed` has strictly passed and that were
    /// not returned before. A tick landing exactly on `at` does not fire.
    pub fn due(&mut self, elapsed: f64) -> &[SetpointChange] {
        let start = self.next;
        while self
            .changes
            .get(self.next)
            .is_some_and(|change| change.at < elapsed)
        {
            self.next += 1;
        }
        &self.changes[start..self.next]
    }

    pub fn changes(&self) -> &[SetpointChange] {
        &self.changes
    }

    /// Number of changes already applied.
    pub fn applied(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.next == self.changes.len()
    }
}
