//! Fixed-depth transport delay.

use serde::{Deserialize, Serialize};

/// FIFO of pending values with a constant length.
///
/// Backed by a ring buffer: every [`DelayLine::push_pop`] writes one value at
/// the head and returns the value that was there, so the length never
/// changes and nothing reallocates. A depth of zero passes values straight
/// through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayLine {
    slots: Vec<f64>,
    head: usize,
}

impl DelayLine {
    /// Zero-filled delay line holding `depth` values.
    pub fn new(depth: usize) -> Self {
        Self {
            slots: vec![0.0; depth],
            head: 0,
        }
    }

    /// Number of values in flight. Constant for the lifetime of the line.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Push `value` on the back and pop the oldest value from the front.
    pub fn push_pop(&mut self, value: f64) -> f64 {
        if self.slots.is_empty() {
            return value;
        }
        let out = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.slots.len();
        out
    }

    /// Pending values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Sum of everything still in flight.
    pub fn pending_total(&self) -> f64 {
        self.slots.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_by_depth() {
        let mut line = DelayLine::new(3);
        assert_eq!(line.push_pop(1.0), 0.0);
        assert_eq!(line.push_pop(2.0), 0.0);
        assert_eq!(line.push_pop(3.0), 0.0);
        assert_eq!(line.push_pop(4.0), 1.0);
        assert_eq!(line.push_pop(5.0), 2.0);
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn zero_depth_passes_through() {
        let mut line = DelayLine::new(0);
        assert!(line.is_empty());
        assert_eq!(line.push_pop(7.5), 7.5);
        assert_eq!(line.len(), 0);
    }

    #[test]
    fn iter_is_oldest_first() {
        let mut line = DelayLine::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            line.push_pop(v);
        }
        let pending: Vec<f64> = line.iter().copied().collect();
        assert_eq!(pending, vec![2.0, 3.0, 4.0]);
        assert_eq!(line.pending_total(), 9.0);
    }
}
