//! Control loop performance metrics.
//!
//! Computes rise time, settling time, overshoot and steady-state error of the
//! response to the last setpoint change, plus peak and saturation figures over
//! the whole run.

use serde::{Deserialize, Serialize};
use tl_core::{Tolerances, nearly_equal};
use tl_sim::SimRecord;

/// Standard control loop performance metrics.
///
/// Times are measured from the start of the response window, which is the
/// first sample acting on the final setpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoopMetrics {
    /// Start of the response window (seconds of elapsed time)
    pub response_start_s: Option<f64>,
    /// Time for the measurement to cover 10% of its change (seconds)
    pub rise_time_10_s: Option<f64>,
    /// Time for the measurement to cover 90% of its change (seconds)
    pub rise_time_90_s: Option<f64>,
    /// Time to enter the ±2% band around the final value and stay there (seconds)
    pub settling_time_2pct_s: Option<f64>,
    /// Peak overshoot in percent of the final value
    pub overshoot_pct: Option<f64>,
    /// Final steady-state error (measured - setpoint)
    pub steady_state_error: Option<f64>,
    /// Highest measurement over the whole run
    pub peak_measurement: Option<f64>,
    /// Maximum controller output witnessed
    pub max_controller_output: Option<f64>,
    /// Percentage of time the controller output sat at its upper limit
    pub saturation_pct_upper: Option<f64>,
    /// Percentage of time the controller output sat at its lower limit
    pub saturation_pct_lower: Option<f64>,
}

impl LoopMetrics {
    /// Returns true if at least some metrics were computed
    pub fn has_data(&self) -> bool {
        self.rise_time_10_s.is_some()
            || self.rise_time_90_s.is_some()
            || self.settling_time_2pct_s.is_some()
            || self.overshoot_pct.is_some()
            || self.steady_state_error.is_some()
    }
}

/// Metrics for a finished loop whose controller output is bounded by
/// `output_limits`.
pub fn metrics_for_record(record: &SimRecord, output_limits: (f64, f64)) -> LoopMetrics {
    let measured = record.measurement_series();
    let setpoint = record.setpoint_series();
    let output = record.output_series();
    compute_loop_metrics(&measured, &setpoint, Some(&output), Some(output_limits))
}

/// Compute metrics from `(time, value)` series.
///
/// # Arguments
/// * `measured_series` - measured variable
/// * `setpoint_series` - setpoint in effect at each time
/// * `controller_output_series` - optional controller output
/// * `output_limits` - `(min, max)` of the controller output, enables the
///   saturation figures
pub fn compute_loop_metrics(
    measured_series: &[(f64, f64)],
    setpoint_series: &[(f64, f64)],
    controller_output_series: Option<&[(f64, f64)]>,
    output_limits: Option<(f64, f64)>,
) -> LoopMetrics {
    let mut metrics = LoopMetrics::default();

    if let Some(series) = controller_output_series {
        metrics.max_controller_output = series.iter().map(|(_, v)| *v).reduce(f64::max);
        if let Some((lo, hi)) = output_limits {
            metrics.saturation_pct_upper =
                Some(compute_saturation_pct(series, |v| at_or_beyond(v, hi, true)));
            metrics.saturation_pct_lower =
                Some(compute_saturation_pct(series, |v| at_or_beyond(v, lo, false)));
        }
    }

    let (Some(&(_, final_setpoint)), Some(&(_, final_measured))) =
        (setpoint_series.last(), measured_series.last())
    else {
        return metrics;
    };

    metrics.peak_measurement = measured_series.iter().map(|(_, v)| *v).reduce(f64::max);
    metrics.steady_state_error = Some(final_measured - final_setpoint);

    let start = response_start(setpoint_series);
    metrics.response_start_s = Some(start);
    let window: Vec<(f64, f64)> = measured_series
        .iter()
        .filter(|(t, _)| *t >= start)
        .map(|(t, v)| (t - start, *v))
        .collect();
    let Some(&(_, initial_measured)) = window.first() else {
        return metrics;
    };

    let measured_change = (final_measured - initial_measured).abs();
    if measured_change > 1e-6 && final_measured.abs() > 1e-6 {
        metrics.rise_time_10_s =
            compute_time_to_percentage(&window, initial_measured, final_measured, 0.1);
        metrics.rise_time_90_s =
            compute_time_to_percentage(&window, initial_measured, final_measured, 0.9);

        // Peak on the side of the change, beyond the final value
        let rising = final_measured > initial_measured;
        let peak = window
            .iter()
            .map(|(_, v)| *v)
            .fold(final_measured, |acc, v| if rising { acc.max(v) } else { acc.min(v) });
        let overshoot = ((peak - final_measured).abs() / final_measured.abs()) * 100.0;
        if overshoot > 0.0 {
            metrics.overshoot_pct = Some(overshoot);
        }

        metrics.settling_time_2pct_s = compute_settling_time(&window, final_measured, 0.02);
    }

    metrics
}

/// Time of the first sample of the trailing run of equal setpoints.
fn response_start(setpoint_series: &[(f64, f64)]) -> f64 {
    let Some(&(mut start, final_value)) = setpoint_series.last() else {
        return 0.0;
    };
    for &(t, v) in setpoint_series.iter().rev() {
        if v != final_value {
            break;
        }
        start = t;
    }
    start
}

fn at_or_beyond(value: f64, limit: f64, upper: bool) -> bool {
    let beyond = if upper { value >= limit } else { value <= limit };
    beyond || nearly_equal(value, limit, Tolerances::default())
}

/// Time at which the series first reaches `pct` (0.0..1.0) of the change
/// from `initial` to `final_val`, linearly interpolated.
fn compute_time_to_percentage(
    series: &[(f64, f64)],
    initial: f64,
    final_val: f64,
    pct: f64,
) -> Option<f64> {
    let change = final_val - initial;
    if change.abs() < 1e-9 {
        return None;
    }

    let target = initial + pct * change;
    let looking_above = change > 0.0;

    for (i, &(time, val)) in series.iter().enumerate() {
        let reached = if looking_above {
            val >= target
        } else {
            val <= target
        };

        if i > 0 && reached {
            let (prev_time, prev_val) = series[i - 1];
            let delta_v = val - prev_val;
            if delta_v.abs() > 1e-9 {
                let frac = (target - prev_val) / delta_v;
                return Some(prev_time + frac * (time - prev_time));
            }
            return Some(time);
        }
    }

    None
}

/// Time at which the series enters the open band
/// `(final * (1 - tolerance), final * (1 + tolerance))` for good.
fn compute_settling_time(series: &[(f64, f64)], final_val: f64, tolerance: f64) -> Option<f64> {
    if final_val.abs() < 1e-9 {
        return None;
    }

    let half_width = final_val.abs() * tolerance;
    let lower = final_val - half_width;
    let upper = final_val + half_width;

    let mut entry: Option<f64> = None;
    for &(time, val) in series {
        let in_band = val > lower && val < upper;
        match (entry, in_band) {
            (None, true) => entry = Some(time),
            (Some(_), false) => entry = None,
            _ => {}
        }
    }
    entry
}

/// Percentage of time the held output satisfied `saturated`. Each sample
/// holds until the next one.
fn compute_saturation_pct<F>(series: &[(f64, f64)], saturated: F) -> f64
where
    F: Fn(f64) -> bool,
{
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    let total_time = last.0 - first.0;
    if total_time <= 0.0 {
        return 0.0;
    }

    let saturated_time: f64 = series
        .windows(2)
        .filter(|w| saturated(w[0].1))
        .map(|w| w[1].0 - w[0].0)
        .sum();

    (saturated_time / total_time) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_time_10_90_percent() {
        let measured = vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.5, 0.15),
            (2.0, 0.5),
            (2.5, 0.85),
            (3.0, 0.95),
            (4.0, 1.0),
        ];
        let setpoint = vec![(0.0, 1.0), (4.0, 1.0)];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        let t10 = metrics.rise_time_10_s.unwrap();
        let t90 = metrics.rise_time_90_s.unwrap();
        assert!(t10 < t90);
        assert!(t10 > 1.0 && t10 < 2.0);
        assert!(t90 > 2.0 && t90 < 3.0);
    }

    #[test]
    fn test_overshoot() {
        let measured = vec![(0.0, 0.0), (1.0, 0.5), (2.0, 1.2), (3.0, 1.1), (4.0, 1.0)];
        let setpoint = vec![(0.0, 1.0), (4.0, 1.0)];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        let overshoot = metrics.overshoot_pct.unwrap();
        assert!(overshoot > 19.0 && overshoot < 21.0);
        assert_eq!(metrics.peak_measurement, Some(1.2));
    }

    #[test]
    fn test_settling_time() {
        let measured = vec![
            (0.0, 0.0),
            (1.0, 0.8),
            (2.0, 1.05),
            (3.0, 1.03),
            (4.0, 1.01),
            (5.0, 1.002),
            (6.0, 1.001),
            (7.0, 1.0005),
        ];
        let setpoint = vec![(0.0, 1.0), (7.0, 1.0)];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        assert_eq!(metrics.settling_time_2pct_s, Some(4.0));
    }

    #[test]
    fn test_steady_state_error() {
        let measured = vec![(0.0, 95.0), (1.0, 98.0), (2.0, 99.0), (3.0, 99.5)];
        let setpoint = vec![(0.0, 100.0), (3.0, 100.0)];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        let err = metrics.steady_state_error.unwrap();
        assert!((err - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_response_window_starts_at_last_setpoint_change() {
        let measured = vec![
            (0.0, 45.0),
            (1.0, 45.0),
            (2.0, 45.0),
            (3.0, 48.0),
            (4.0, 50.0),
            (5.0, 50.0),
        ];
        let setpoint = vec![
            (0.0, 45.0),
            (1.0, 45.0),
            (2.0, 50.0),
            (3.0, 50.0),
            (4.0, 50.0),
            (5.0, 50.0),
        ];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        assert_eq!(metrics.response_start_s, Some(2.0));
        // 90% of 45 -> 50 is 49.5, reached between t=3 and t=4.
        let t90 = metrics.rise_time_90_s.unwrap();
        assert!((t90 - 1.75).abs() < 1e-9);
        assert_eq!(metrics.settling_time_2pct_s, Some(2.0));
        assert!(metrics.overshoot_pct.is_none());
    }

    #[test]
    fn test_controller_saturation() {
        let measured = vec![(0.0, 0.0), (1.0, 0.5)];
        let setpoint = vec![(0.0, 1.0), (1.0, 1.0)];
        let controller = vec![
            (0.0, 300.0),
            (0.25, 300.0),
            (0.5, 120.0),
            (0.75, 0.0),
            (1.0, 0.0),
        ];

        let metrics =
            compute_loop_metrics(&measured, &setpoint, Some(&controller), Some((0.0, 300.0)));

        assert_eq!(metrics.max_controller_output, Some(300.0));
        assert!((metrics.saturation_pct_upper.unwrap() - 50.0).abs() < 1e-9);
        assert!((metrics.saturation_pct_lower.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series() {
        let empty: Vec<(f64, f64)> = vec![];
        let setpoint = vec![(0.0, 1.0), (1.0, 1.0)];

        let metrics = compute_loop_metrics(&empty, &setpoint, None, None);

        assert!(!metrics.has_data());
    }

    #[test]
    fn test_no_step_change() {
        let measured = vec![(0.0, 100.0), (1.0, 100.0), (2.0, 100.0)];
        let setpoint = vec![(0.0, 100.0), (2.0, 100.0)];

        let metrics = compute_loop_metrics(&measured, &setpoint, None, None);

        assert!(metrics.rise_time_10_s.is_none());
        assert!(metrics.overshoot_pct.is_none());
        assert_eq!(metrics.steady_state_error, Some(0.0));
    }
}
