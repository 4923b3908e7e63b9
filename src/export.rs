//! Spreadsheet report: the visible slice flattened to a 2-D cell array.
//!
//! Column order matches the on-screen table, with the actions column left
//! out. The array is handed to a `SheetWriter` - the seam where the real
//! spreadsheet library sits; the bundled `CsvWriter` is enough for the CLI.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::pipeline::RecordView;
use crate::record::format_local;

pub const SHEET_NAME: &str = "Turnaround Report";
pub const REPORT_FILE_NAME: &str = "Turnaround_Report.xlsx";

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    /// Suggested width in characters, for sheet formatting.
    pub width: u16,
}

pub const REPORT_COLUMNS: [Column; 12] = [
    Column { header: "ITEM DESCRIPTION", width: 25 },
    Column { header: "TOTAL QTY.", width: 10 },
    Column { header: "TCN #", width: 15 },
    Column { header: "TOTAL QTY. INSPECTED", width: 20 },
    Column { header: "DATE & TIME RECEIVED FOR QC", width: 25 },
    Column { header: "DATE & TIME QC START", width: 25 },
    Column { header: "DATE & TIME QC FINISHED", width: 25 },
    Column { header: "ASSEMBLY REQUIRED", width: 15 },
    Column { header: "TARGET EFFICIENCY (98%)", width: 20 },
    Column { header: "ACTUAL EFFICIENCY", width: 20 },
    Column { header: "EFFICIENCY RESULT", width: 20 },
    Column { header: "TURNAROUND TIME (HOURS)", width: 20 },
];

/// Header row plus one row per visible record.
pub fn report_rows(visible: &[RecordView]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(visible.len() + 1);
    rows.push(REPORT_COLUMNS.iter().map(|c| c.header.to_string()).collect());
    for view in visible {
        let r = &view.record;
        let m = &view.metrics;
        rows.push(vec![
            r.description.clone(),
            r.total_qty.to_string(),
            r.tracking_number.clone(),
            r.inspected_qty.to_string(),
            format_local(r.received_qc.as_deref()),
            format_local(r.qc_start.as_deref()),
            format_local(r.qc_finished.as_deref()),
            r.assembly_required.as_str().to_string(),
            m.target_hours.to_string(),
            format!("{}%", m.efficiency_pct),
            m.classification.to_string(),
            m.turnaround_hours.to_string(),
        ]);
    }
    rows
}

/// The external spreadsheet collaborator: consumes the whole cell array
/// synchronously and produces a file.
pub trait SheetWriter {
    fn write_sheet(&mut self, rows: &[Vec<String>]) -> Result<()>;
}

/// CSV materialization of the report.
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }
}

impl SheetWriter for CsvWriter {
    fn write_sheet(&mut self, rows: &[Vec<String>]) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("cannot create {}", self.path.display()))?;
        let mut out = BufWriter::new(file);
        for row in rows {
            let line: Vec<String> = row.iter().map(|cell| csv_cell(cell)).collect();
            writeln!(out, "{}", line.join(","))?;
        }
        out.flush()?;
        Ok(())
    }
}

fn csv_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
