//! Application state and controller.
//!
//! The original tool kept its filter, search text, pending edit and cached
//! view in module globals; here they live in one struct owned by whoever
//! drives the UI. Every event is synchronous and ends by rebuilding the
//! cached view, which is the single source the table, summary panel and
//! chart all render from.

use serde_json::json;

use crate::export::{report_rows, SheetWriter};
use crate::logging::{self, Domain};
use crate::pipeline::{select_and_summarize, MonthFilter, ViewFilter, ViewModel};
use crate::record::RecordFields;
use crate::store::{KvStore, RecordStore, StoreError};

/// The original's localStorage slot name.
pub const DEFAULT_STORAGE_KEY: &str = "turnaroundItems";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub storage_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("TURNAROUND_DB")
                .unwrap_or_else(|_| "./turnaround.sqlite".to_string()),
            storage_key: std::env::var("TURNAROUND_KEY")
                .unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string()),
        }
    }
}

/// A transient, auto-dismissed message. Never a modal, never a halt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn ok(text: &str) -> Self {
        Self { text: text.to_string(), is_error: false }
    }

    fn error(text: &str) -> Self {
        Self { text: text.to_string(), is_error: true }
    }
}

pub struct App<S: KvStore> {
    store: RecordStore<S>,
    filter: ViewFilter,
    editing: Option<u64>,
    view: ViewModel,
}

impl<S: KvStore> App<S> {
    pub fn new(store: RecordStore<S>) -> Self {
        let mut app = Self {
            store,
            filter: ViewFilter::default(),
            editing: None,
            view: ViewModel::empty(),
        };
        app.refresh();
        app
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn editing(&self) -> Option<u64> {
        self.editing
    }

    /// Reload from the store and recompute the visible slice. The one path
    /// that keeps every presentation surface consistent.
    pub fn refresh(&mut self) {
        let records = self.store.load_all();
        self.view = select_and_summarize(&records, &self.filter);
        logging::debug(
            Domain::Pipeline,
            "view_refreshed",
            json!({ "total": records.len(), "visible": self.view.visible.len() }),
        );
    }

    /// Form submission: create, or update when an edit is pending.
    pub fn submit(&mut self, fields: RecordFields) -> Notice {
        let notice = match self.editing.take() {
            Some(id) => match self.store.update(id, fields) {
                Ok(_) => Notice::ok("Item updated successfully!"),
                Err(StoreError::NotFound { .. }) => {
                    Notice::error("Error: Item to update not found.")
                }
                Err(err) => self.persist_failure("update", err),
            },
            None => match self.store.create(fields) {
                Ok(_) => Notice::ok("Item added successfully!"),
                Err(err) => self.persist_failure("create", err),
            },
        };
        self.refresh();
        notice
    }

    /// Start editing: returns the record's fields for the form, or None if
    /// the id has vanished since it was rendered.
    pub fn begin_edit(&mut self, id: u64) -> Option<RecordFields> {
        let fields = self.store.get(id).map(|r| r.fields());
        if fields.is_some() {
            self.editing = Some(id);
        }
        fields
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn delete(&mut self, id: u64) -> Notice {
        let notice = match self.store.delete(id) {
            Ok(()) => Notice::ok("Item deleted successfully!"),
            Err(StoreError::NotFound { .. }) => Notice::error("Item not found for deletion."),
            Err(err) => self.persist_failure("delete", err),
        };
        self.refresh();
        notice
    }

    pub fn set_month_filter(&mut self, month: MonthFilter) {
        self.filter.month = month;
        self.refresh();
    }

    pub fn set_search(&mut self, search: String) {
        self.filter.search = search;
        self.refresh();
    }

    /// Export the visible slice. Refused, with an error notice, when there
    /// is nothing to export.
    pub fn export(&mut self, writer: &mut dyn SheetWriter) -> Notice {
        self.refresh();
        if self.view.visible.is_empty() {
            return Notice::error("No data to download.");
        }
        let rows = report_rows(&self.view.visible);
        match writer.write_sheet(&rows) {
            Ok(()) => {
                logging::info(Domain::Export, "report_written", json!({ "rows": rows.len() - 1 }));
                Notice::ok("Report downloaded successfully!")
            }
            Err(err) => {
                logging::error(Domain::Export, "report_failed", json!({ "error": err.to_string() }));
                Notice::error("Error writing report. Please try again.")
            }
        }
    }

    fn persist_failure(&self, op: &str, err: StoreError) -> Notice {
        logging::error(
            Domain::App,
            "persist_failed",
            json!({ "op": op, "error": err.to_string() }),
        );
        Notice::error("Error adding/updating item. Please try again.")
    }
}
