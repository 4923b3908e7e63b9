//! The persisted data model: one QC inspection entry per record.
//!
//! Timestamps entered on the form are kept as the raw `YYYY-MM-DDTHH:MM`
//! strings the datetime-local input produces; parsing happens on demand so
//! a record with a blank or mangled timestamp still loads and displays.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AssemblyRequired {
    Yes,
    No,
}

impl AssemblyRequired {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyRequired::Yes => "Yes",
            AssemblyRequired::No => "No",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(AssemblyRequired::Yes),
            "no" | "n" | "false" | "0" => Some(AssemblyRequired::No),
            _ => None,
        }
    }
}

/// The form-submission unit: everything the user can type, nothing the
/// system assigns. Identity and creation time live only on `Record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    pub description: String,
    pub total_qty: u32,
    pub tracking_number: String,
    pub inspected_qty: u32,
    #[serde(default)]
    pub received_qc: Option<String>,
    #[serde(default)]
    pub qc_start: Option<String>,
    #[serde(default)]
    pub qc_finished: Option<String>,
    pub assembly_required: AssemblyRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub description: String,
    pub total_qty: u32,
    pub tracking_number: String,
    pub inspected_qty: u32,
    #[serde(default)]
    pub received_qc: Option<String>,
    #[serde(default)]
    pub qc_start: Option<String>,
    #[serde(default)]
    pub qc_finished: Option<String>,
    pub assembly_required: AssemblyRequired,
    /// RFC 3339, assigned once at creation and never touched by updates.
    pub created_at: String,
}

impl Record {
    pub fn from_fields(id: u64, created_at: String, fields: RecordFields) -> Self {
        Self {
            id,
            description: fields.description,
            total_qty: fields.total_qty,
            tracking_number: fields.tracking_number,
            inspected_qty: fields.inspected_qty,
            received_qc: fields.received_qc,
            qc_start: fields.qc_start,
            qc_finished: fields.qc_finished,
            assembly_required: fields.assembly_required,
            created_at,
        }
    }

    /// Overwrite every user-entered field, preserving id and created_at.
    pub fn apply(&mut self, fields: RecordFields) {
        self.description = fields.description;
        self.total_qty = fields.total_qty;
        self.tracking_number = fields.tracking_number;
        self.inspected_qty = fields.inspected_qty;
        self.received_qc = fields.received_qc;
        self.qc_start = fields.qc_start;
        self.qc_finished = fields.qc_finished;
        self.assembly_required = fields.assembly_required;
    }

    pub fn fields(&self) -> RecordFields {
        RecordFields {
            description: self.description.clone(),
            total_qty: self.total_qty,
            tracking_number: self.tracking_number.clone(),
            inspected_qty: self.inspected_qty,
            received_qc: self.received_qc.clone(),
            qc_start: self.qc_start.clone(),
            qc_finished: self.qc_finished.clone(),
            assembly_required: self.assembly_required,
        }
    }

    pub fn received_at(&self) -> Option<NaiveDateTime> {
        parse_local(self.received_qc.as_deref())
    }

    pub fn finished_at(&self) -> Option<NaiveDateTime> {
        parse_local(self.qc_finished.as_deref())
    }

    /// Millisecond key for chronological table order. Unparseable
    /// created_at sorts first rather than breaking the view.
    pub fn created_sort_key(&self) -> i64 {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

/// Parse a datetime-local string (with or without seconds). Blank or
/// malformed input is treated as absent.
pub fn parse_local(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Human form of a stored datetime, e.g. "Jan 10, 2024, 08:00:00 AM".
/// Absent or unparseable input renders as the empty string.
pub fn format_local(s: Option<&str>) -> String {
    match parse_local(s) {
        Some(dt) => dt.format("%b %-d, %Y, %I:%M:%S %p").to_string(),
        None => String::new(),
    }
}
