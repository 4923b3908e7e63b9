//! Turnaround bar-chart series for the external chart widget.
//!
//! The widget is destroyed and rebuilt on every refresh, so the series is a
//! plain value rebuilt from the visible slice; it holds no widget state.
//! Bars only exist for records with a numeric turnaround - `series` returns
//! `None` when there are none, which the UI renders as a "no data" note in
//! place of the canvas.

use crate::metrics::Classification;
use crate::pipeline::RecordView;

pub const CHART_TITLE: &str = "Turnaround Time for Each Item";
pub const AXIS_LABEL: &str = "Turnaround Time (Hours)";

const MET_FILL: &str = "rgba(75, 192, 192, 0.6)";
const MET_BORDER: &str = "rgba(75, 192, 192, 1)";
const BELOW_FILL: &str = "rgba(255, 99, 132, 0.6)";
const BELOW_BORDER: &str = "rgba(255, 99, 132, 1)";
const NEUTRAL_FILL: &str = "rgba(200, 200, 200, 0.6)";
const NEUTRAL_BORDER: &str = "rgba(200, 200, 200, 1)";

const LABEL_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub hours: f64,
    pub fill: &'static str,
    pub border: &'static str,
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub bars: Vec<ChartBar>,
    tooltips: Vec<String>,
}

impl ChartSeries {
    /// Tooltip text for bar `index`, for the widget's hover callback.
    pub fn tooltip(&self, index: usize) -> Option<&str> {
        self.tooltips.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

pub fn series(visible: &[RecordView]) -> Option<ChartSeries> {
    let charted: Vec<&RecordView> = visible
        .iter()
        .filter(|v| v.metrics.turnaround_hours.is_value())
        .collect();
    if charted.is_empty() {
        return None;
    }

    let mut bars = Vec::with_capacity(charted.len());
    let mut tooltips = Vec::with_capacity(charted.len());
    for (i, view) in charted.iter().enumerate() {
        let hours = view.metrics.turnaround_hours.value().unwrap_or(0.0);
        let (fill, border) = match view.metrics.classification {
            Classification::Met => (MET_FILL, MET_BORDER),
            Classification::Below => (BELOW_FILL, BELOW_BORDER),
            Classification::Unavailable => (NEUTRAL_FILL, NEUTRAL_BORDER),
        };
        bars.push(ChartBar {
            label: bar_label(&view.record.description, i),
            hours,
            fill,
            border,
        });
        tooltips.push(format!(
            "{}: {} hours | Actual Efficiency: {} | Result: {}",
            AXIS_LABEL,
            hours,
            match view.metrics.efficiency_pct.value() {
                Some(e) => format!("{:.2}%", e),
                None => "N/A".to_string(),
            },
            view.metrics.classification,
        ));
    }

    Some(ChartSeries { bars, tooltips })
}

fn bar_label(description: &str, index: usize) -> String {
    if description.is_empty() {
        return format!("Item #{}", index + 1);
    }
    let truncated: String = description.chars().take(LABEL_MAX_CHARS).collect();
    let ellipsis = if description.chars().count() > LABEL_MAX_CHARS { "..." } else { "" };
    format!("{}{} (#{})", truncated, ellipsis, index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute;
    use crate::record::{AssemblyRequired, Record};

    fn view(desc: &str, received: Option<&str>, finished: Option<&str>) -> RecordView {
        let record = Record {
            id: 7,
            description: desc.to_string(),
            total_qty: 1,
            tracking_number: "T".to_string(),
            inspected_qty: 1,
            received_qc: received.map(String::from),
            qc_start: None,
            qc_finished: finished.map(String::from),
            assembly_required: AssemblyRequired::No,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        };
        let metrics = compute(&record);
        RecordView { record, metrics }
    }

    #[test]
    fn test_no_numeric_turnaround_means_no_chart() {
        let views = vec![
            view("a", None, None),
            view("b", Some("2024-01-10T18:00"), Some("2024-01-10T08:00")),
        ];
        assert!(series(&views).is_none());
    }

    #[test]
    fn test_colors_follow_classification() {
        let views = vec![
            // 10h, MET
            view("met", Some("2024-01-10T08:00"), Some("2024-01-10T18:00")),
            // 1.5h, BELOW
            view("below", Some("2024-01-10T08:00"), Some("2024-01-10T09:30")),
            // zero turnaround -> divide-by-zero, neutral grey
            view("zero", Some("2024-01-10T08:00"), Some("2024-01-10T08:00")),
        ];
        let s = series(&views).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.bars[0].fill, MET_FILL);
        assert_eq!(s.bars[1].fill, BELOW_FILL);
        assert_eq!(s.bars[2].fill, NEUTRAL_FILL);
    }

    #[test]
    fn test_labels_truncate_and_number() {
        let views = vec![view(
            "a very long item description indeed",
            Some("2024-01-10T08:00"),
            Some("2024-01-10T18:00"),
        )];
        let s = series(&views).unwrap();
        assert_eq!(s.bars[0].label, "a very long item des... (#1)");
    }

    #[test]
    fn test_blank_description_falls_back_to_index() {
        let views = vec![view("", Some("2024-01-10T08:00"), Some("2024-01-10T18:00"))];
        let s = series(&views).unwrap();
        assert_eq!(s.bars[0].label, "Item #1");
    }

    #[test]
    fn test_tooltip_combines_hours_efficiency_result() {
        let views = vec![view("met", Some("2024-01-10T08:00"), Some("2024-01-10T18:00"))];
        let s = series(&views).unwrap();
        let tip = s.tooltip(0).unwrap();
        assert!(tip.contains("10 hours"));
        assert!(tip.contains("100.00%"));
        assert!(tip.contains("MET TARGET"));
        assert!(s.tooltip(1).is_none());
    }
}
