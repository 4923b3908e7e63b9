//! QC turnaround tracker: records in, derived metrics and views out.
//!
//! One persisted collection of inspection records is the single source of
//! truth. `metrics` derives per-record numbers, `pipeline` turns the
//! collection into a filtered view with aggregates, `chart` and `export`
//! shape that view for the external rendering sinks, and `app` owns the
//! UI-facing state machine. `store` is the only module that touches
//! persistence.

pub mod app;
pub mod chart;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod store;
