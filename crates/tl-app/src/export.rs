//! Trajectory export for external plotting tools.

use std::fmt::Write;

use tl_sim::SimRecord;

use crate::error::AppResult;

pub const CSV_HEADER: &str = "time_s,measurement,setpoint,output,p,i,d";

/// One row per sample, header first.
pub fn record_to_csv(record: &SimRecord) -> String {
    let mut csv = String::with_capacity(64 * (record.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for s in &record.samples {
        // Writing into a String cannot fail.
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{}",
            s.elapsed,
            s.measurement,
            s.setpoint,
            s.output,
            s.terms.proportional,
            s.terms.integral,
            s.terms.derivative
        );
    }
    csv
}

/// The whole record, samples and counters, as pretty JSON.
pub fn record_to_json(record: &SimRecord) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_controls::PidTerms;
    use tl_sim::Sample;

    fn record() -> SimRecord {
        SimRecord {
            samples: vec![
                Sample {
                    elapsed: 0.5,
                    measurement: 45.0,
                    setpoint: 50.0,
                    output: 25.0,
                    terms: PidTerms {
                        proportional: 25.0,
                        integral: 0.0,
                        derivative: 0.0,
                    },
                },
                Sample {
                    elapsed: 1.0,
                    measurement: 45.5,
                    setpoint: 50.0,
                    output: 22.5,
                    terms: PidTerms {
                        proportional: 22.5,
                        integral: 0.0,
                        derivative: 0.0,
                    },
                },
            ],
            degenerate_steps: 0,
            setpoint_changes_applied: 1,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let csv = record_to_csv(&record());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "0.5,45,50,25,25,0,0");
        assert_eq!(lines[2], "1,45.5,50,22.5,22.5,0,0");
    }

    #[test]
    fn empty_record_exports_header_only() {
        assert_eq!(record_to_csv(&SimRecord::default()), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn json_parses_back() {
        let original = record();
        let json = record_to_json(&original).unwrap();
        let parsed: SimRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
