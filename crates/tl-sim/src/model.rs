//! Plant trait for pluggable process models.

/// A physical process driven by an actuation signal.
///
/// A Plant must implement:
/// - the current measurement at full precision
/// - `advance`: apply one actuation over `dt` seconds and report the result
pub trait Plant {
    /// Current measurement at full internal precision.
    fn measurement(&self) -> f64;

    /// Measurement as a sensor would report it. Defaults to full precision.
    fn reported(&self) -> f64 {
        self.measurement()
    }

    /// Apply `actuation` for `dt` seconds and return the reported measurement.
    ///
    /// Must tolerate zero, negative and non-finite `dt` without panicking.
    fn advance(&mut self, actuation: f64, dt: f64) -> f64;
}
