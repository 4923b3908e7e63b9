//! Derived metrics - pure computation from a record's timestamps.
//!
//! Nothing here is persisted; metrics are recomputed per render so the
//! table, summary panel, chart and export can never disagree. Each value
//! carries the explanation string the UI shows as a hover note, built from
//! the same operands as the number itself.

use std::fmt;

use crate::record::{format_local, Record};

/// Fixed efficiency threshold for the MET/BELOW classification.
pub const EFFICIENCY_TARGET_PCT: f64 = 98.0;

/// Target productivity is 98% of the observed turnaround.
pub const PRODUCTIVITY_FACTOR: f64 = 0.98;

/// A computed quantity or the reason it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    /// A required input is missing.
    Unavailable,
    /// Inputs present but inconsistent: finish precedes receipt.
    Invalid,
    /// Zero turnaround makes the efficiency ratio undefined.
    DivideByZero,
}

impl Metric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}", v),
            Metric::Unavailable => write!(f, "N/A"),
            Metric::Invalid => write!(f, "Invalid"),
            Metric::DivideByZero => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Met,
    Below,
    Unavailable,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Met => "MET TARGET",
            Classification::Below => "BELOW TARGET",
            Classification::Unavailable => "N/A",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub turnaround_hours: Metric,
    pub turnaround_note: String,
    pub target_hours: Metric,
    pub target_note: String,
    /// Integer-rounded target, the efficiency numerator. Rounded once,
    /// before the division, never after.
    pub rounded_target: Option<i64>,
    pub efficiency_pct: Metric,
    pub efficiency_note: String,
    pub classification: Classification,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compute all derived metrics for one record. Total and side-effect free;
/// bad inputs come back as sentinels, never panics or errors.
pub fn compute(record: &Record) -> DerivedMetrics {
    let (turnaround_hours, turnaround_note) =
        match (record.received_at(), record.finished_at()) {
            (Some(received), Some(finished)) => {
                let secs = finished.signed_duration_since(received).num_seconds();
                if secs >= 0 {
                    let hours = round2(secs as f64 / 3600.0);
                    (
                        Metric::Value(hours),
                        format!(
                            "Computed as (Date & Time QC Finished ({}) - Date & Time Received for QC ({})) in hours.",
                            format_local(record.qc_finished.as_deref()),
                            format_local(record.received_qc.as_deref()),
                        ),
                    )
                } else {
                    (
                        Metric::Invalid,
                        "QC Finish Time is before QC Receive Time. Please check dates.".to_string(),
                    )
                }
            }
            _ => (
                Metric::Unavailable,
                "Requires both \"Date & Time Received for QC\" and \"Date & Time QC Finished\"."
                    .to_string(),
            ),
        };

    let (target_hours, target_note, rounded_target) = match turnaround_hours.value() {
        Some(t) => {
            let raw_target = t * PRODUCTIVITY_FACTOR;
            let target = round2(raw_target);
            (
                Metric::Value(target),
                format!(
                    "Computed as Turnaround Time ({:.2} hours) × 0.98 = {:.2} hours. \
                     This is a target duration reflecting 98% productivity for this specific \
                     turnaround, not a percentage goal for overall efficiency.",
                    t, target,
                ),
                Some(raw_target.round() as i64),
            )
        }
        None => (
            Metric::Unavailable,
            "Requires a valid \"Turnaround Time (Hours)\" calculation.".to_string(),
            None,
        ),
    };

    let (efficiency_pct, efficiency_note) = match (turnaround_hours.value(), rounded_target) {
        (Some(t), Some(rounded)) => {
            if t == 0.0 {
                (
                    Metric::DivideByZero,
                    "Error: Turnaround Time is 0. Cannot divide by zero.".to_string(),
                )
            } else {
                let eff = round2(rounded as f64 / t * 100.0);
                (
                    Metric::Value(eff),
                    format!(
                        "Computed as (ROUND OFF Target Productivity Hours ({}) / TURNAROUND TIME \
                         ({:.2})) × 100%. This reflects how closely the actual turnaround time \
                         aligns with its 98% productivity goal.",
                        rounded, t,
                    ),
                )
            }
        }
        _ => (
            Metric::Unavailable,
            "Requires valid \"Turnaround Time (Hours)\" and \"Target Productivity Hours\" calculations."
                .to_string(),
        ),
    };

    let classification = match efficiency_pct.value() {
        Some(e) if e >= EFFICIENCY_TARGET_PCT => Classification::Met,
        Some(_) => Classification::Below,
        None => Classification::Unavailable,
    };

    DerivedMetrics {
        turnaround_hours,
        turnaround_note,
        target_hours,
        target_note,
        rounded_target,
        efficiency_pct,
        efficiency_note,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AssemblyRequired, Record};

    fn record(received: Option<&str>, finished: Option<&str>) -> Record {
        Record {
            id: 1,
            description: "widget".to_string(),
            total_qty: 10,
            tracking_number: "TCN-1".to_string(),
            inspected_qty: 10,
            received_qc: received.map(String::from),
            qc_start: None,
            qc_finished: finished.map(String::from),
            assembly_required: AssemblyRequired::No,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_ten_hour_turnaround_meets_target() {
        let m = compute(&record(Some("2024-01-10T08:00"), Some("2024-01-10T18:00")));
        assert_eq!(m.turnaround_hours, Metric::Value(10.0));
        assert_eq!(m.target_hours, Metric::Value(9.8));
        assert_eq!(m.rounded_target, Some(10));
        assert_eq!(m.efficiency_pct, Metric::Value(100.0));
        assert_eq!(m.classification, Classification::Met);
    }

    #[test]
    fn test_fractional_turnaround() {
        // 90 minutes: target = 1.5 * 0.98 = 1.47, rounds to 1,
        // efficiency = 1 / 1.5 * 100 = 66.67 -> BELOW.
        let m = compute(&record(Some("2024-01-10T08:00"), Some("2024-01-10T09:30")));
        assert_eq!(m.turnaround_hours, Metric::Value(1.5));
        assert_eq!(m.target_hours, Metric::Value(1.47));
        assert_eq!(m.rounded_target, Some(1));
        assert_eq!(m.efficiency_pct, Metric::Value(66.67));
        assert_eq!(m.classification, Classification::Below);
    }

    #[test]
    fn test_reversed_timestamps_are_invalid_not_fatal() {
        let m = compute(&record(Some("2024-01-10T18:00"), Some("2024-01-10T08:00")));
        assert_eq!(m.turnaround_hours, Metric::Invalid);
        assert!(m.turnaround_note.contains("before QC Receive Time"));
        assert_eq!(m.target_hours, Metric::Unavailable);
        assert_eq!(m.efficiency_pct, Metric::Unavailable);
        assert_eq!(m.classification, Classification::Unavailable);
    }

    #[test]
    fn test_missing_timestamp_is_unavailable() {
        let m = compute(&record(Some("2024-01-10T08:00"), None));
        assert_eq!(m.turnaround_hours, Metric::Unavailable);
        assert_eq!(m.classification, Classification::Unavailable);
    }

    #[test]
    fn test_zero_turnaround_is_divide_by_zero() {
        let m = compute(&record(Some("2024-01-10T08:00"), Some("2024-01-10T08:00")));
        assert_eq!(m.turnaround_hours, Metric::Value(0.0));
        assert_eq!(m.target_hours, Metric::Value(0.0));
        assert_eq!(m.rounded_target, Some(0));
        assert_eq!(m.efficiency_pct, Metric::DivideByZero);
        assert!(m.efficiency_note.contains("Cannot divide by zero"));
        assert_eq!(m.classification, Classification::Unavailable);
    }

    #[test]
    fn test_classification_threshold_is_exact() {
        // 50 hours: target 49.0, rounded 49, efficiency = 49/50*100 = 98.00 -> MET.
        let m = compute(&record(Some("2024-01-01T00:00"), Some("2024-01-03T02:00")));
        assert_eq!(m.turnaround_hours, Metric::Value(50.0));
        assert_eq!(m.efficiency_pct, Metric::Value(98.0));
        assert_eq!(m.classification, Classification::Met);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let rec = record(Some("2024-01-10T08:00"), Some("2024-01-11T20:30"));
        assert_eq!(compute(&rec), compute(&rec));
    }

    #[test]
    fn test_notes_quote_operands() {
        let m = compute(&record(Some("2024-01-10T08:00"), Some("2024-01-10T18:00")));
        assert!(m.turnaround_note.contains("Jan 10, 2024, 06:00:00 PM"));
        assert!(m.turnaround_note.contains("Jan 10, 2024, 08:00:00 AM"));
        assert!(m.target_note.contains("10.00 hours"));
        assert!(m.efficiency_note.contains("(10)"));
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(Metric::Unavailable.to_string(), "N/A");
        assert_eq!(Metric::Invalid.to_string(), "Invalid");
        assert_eq!(Metric::DivideByZero.to_string(), "Error");
        assert_eq!(Metric::Value(9.8).to_string(), "9.80");
    }
}
