//! Structured logging: JSON lines on stderr, one event each.
//!
//! Level comes from `LOG_LEVEL`, domains can be narrowed with `LOG_DOMAINS`
//! (comma-separated list or "all"). Events carry a sequence number so an
//! interleaved capture can be reordered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Store,    // persistence, collection rewrites
    Pipeline, // filtering, aggregation
    Export,   // spreadsheet report
    App,      // controller events, notices
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Store => "store",
            Domain::Pipeline => "pipeline",
            Domain::Export => "export",
            Domain::App => "app",
        }
    }

    fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

static SEQ: AtomicU64 = AtomicU64::new(0);
static THRESHOLD: OnceLock<Level> = OnceLock::new();

fn threshold() -> Level {
    *THRESHOLD.get_or_init(Level::from_env)
}

pub fn emit(level: Level, domain: Domain, event: &str, data: Value) {
    if level < threshold() || !domain.is_enabled() {
        return;
    }
    let line = json!({
        "ts": Utc::now().to_rfc3339(),
        "seq": SEQ.fetch_add(1, Ordering::SeqCst),
        "level": level.as_str(),
        "domain": domain.as_str(),
        "event": event,
        "data": data,
    });
    eprintln!("{}", line);
}

pub fn debug(domain: Domain, event: &str, data: Value) {
    emit(Level::Debug, domain, event, data);
}

pub fn info(domain: Domain, event: &str, data: Value) {
    emit(Level::Info, domain, event, data);
}

pub fn warn(domain: Domain, event: &str, data: Value) {
    emit(Level::Warn, domain, event, data);
}

pub fn error(domain: Domain, event: &str, data: Value) {
    emit(Level::Error, domain, event, data);
}
