//! Filter/aggregate pipeline: the one path from the stored collection to
//! everything on screen. Table rows, summary panel and chart series are all
//! carved from the same `ViewModel`, so they cannot drift apart.

use std::collections::BTreeSet;

use crate::metrics::{compute, Classification, DerivedMetrics};
use crate::record::Record;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Shown in place of the table when filtering leaves nothing visible.
pub const NO_MATCH_MESSAGE: &str = "No items found matching the current filters.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    /// A `YYYY-MM` bucket key.
    Month(String),
}

impl MonthFilter {
    fn matches(&self, record: &Record) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(key) => record
                .received_qc
                .as_deref()
                .map(|ts| ts.starts_with(key.as_str()))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewFilter {
    pub month: MonthFilter,
    pub search: String,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self { month: MonthFilter::All, search: String::new() }
    }
}

impl ViewFilter {
    pub fn matches(&self, record: &Record) -> bool {
        let by_month = self.month.matches(record);
        let by_search = self.search.is_empty()
            || record
                .description
                .to_lowercase()
                .contains(&self.search.to_lowercase());
        by_month && by_search
    }
}

/// One distinct month present in the data, for the month selector.
/// "all" is the selector's implicit first choice and is not listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub key: String,
    /// Human label, e.g. "January 2024".
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct RecordView {
    pub record: Record,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    /// Mean over valid turnarounds only; `None` when nothing is eligible.
    pub avg_turnaround_hours: Option<f64>,
    /// Mean over valid efficiencies only; `None` when nothing is eligible.
    pub avg_efficiency_pct: Option<f64>,
    pub met_target: usize,
    pub below_target: usize,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            total: 0,
            avg_turnaround_hours: None,
            avg_efficiency_pct: None,
            met_target: 0,
            below_target: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewModel {
    pub visible: Vec<RecordView>,
    pub summary: Summary,
    pub months: Vec<MonthBucket>,
}

impl ViewModel {
    pub fn empty() -> Self {
        Self { visible: Vec::new(), summary: Summary::empty(), months: Vec::new() }
    }

    pub fn no_match(&self) -> bool {
        self.visible.is_empty()
    }
}

/// Sort, filter, derive and aggregate in one pass over the collection.
pub fn select_and_summarize(all: &[Record], filter: &ViewFilter) -> ViewModel {
    let mut sorted: Vec<Record> = all.to_vec();
    sorted.sort_by_key(Record::created_sort_key);

    // Selector options come from the whole collection, not the visible
    // slice, so a filtered-out month can still be switched back to.
    let months = month_buckets(&sorted);

    let visible: Vec<RecordView> = sorted
        .into_iter()
        .filter(|r| filter.matches(r))
        .map(|record| {
            let metrics = compute(&record);
            RecordView { record, metrics }
        })
        .collect();

    let summary = summarize(&visible);
    ViewModel { visible, summary, months }
}

fn month_buckets(records: &[Record]) -> Vec<MonthBucket> {
    let mut keys = BTreeSet::new();
    for rec in records {
        if let Some(key) = rec.received_qc.as_deref().and_then(|ts| ts.get(..7)) {
            keys.insert(key.to_string());
        }
    }
    keys.into_iter()
        .map(|key| {
            let label = month_label(&key);
            MonthBucket { key, label }
        })
        .collect()
}

fn month_label(key: &str) -> String {
    let mut parts = key.splitn(2, '-');
    let year = parts.next().unwrap_or("");
    let month = parts
        .next()
        .and_then(|m| m.parse::<usize>().ok())
        .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)))
        .copied()
        .unwrap_or(key);
    format!("{} {}", month, year)
}

fn summarize(visible: &[RecordView]) -> Summary {
    let mut turnaround_sum = 0.0;
    let mut turnaround_n = 0usize;
    let mut efficiency_sum = 0.0;
    let mut efficiency_n = 0usize;
    let mut met = 0usize;
    let mut below = 0usize;

    for view in visible {
        if let Some(t) = view.metrics.turnaround_hours.value() {
            turnaround_sum += t;
            turnaround_n += 1;
        }
        if let Some(e) = view.metrics.efficiency_pct.value() {
            efficiency_sum += e;
            efficiency_n += 1;
        }
        match view.metrics.classification {
            Classification::Met => met += 1,
            Classification::Below => below += 1,
            Classification::Unavailable => {}
        }
    }

    Summary {
        total: visible.len(),
        avg_turnaround_hours: (turnaround_n > 0).then(|| turnaround_sum / turnaround_n as f64),
        avg_efficiency_pct: (efficiency_n > 0).then(|| efficiency_sum / efficiency_n as f64),
        met_target: met,
        below_target: below,
    }
}
