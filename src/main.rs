use std::env;
use std::path::Path;
use std::process::exit;

use turnaround::app::{App, Config, Notice};
use turnaround::chart;
use turnaround::export::CsvWriter;
use turnaround::pipeline::{MonthFilter, ViewModel, NO_MATCH_MESSAGE};
use turnaround::record::{format_local, AssemblyRequired, RecordFields};
use turnaround::store::{RecordStore, SqliteKv};

const USAGE: &str = "usage: turnaround <command> [options]

commands:
  list                     show the table and summary (default)
  add                      add a record
  edit <id>                update a record (unset flags keep old values)
  delete <id>              remove a record
  summary                  summary panel only
  chart                    textual turnaround bar chart
  months                   list month-selector options
  export <path.csv>        write the visible slice as CSV

record flags (add/edit):
  --desc TEXT  --qty N  --tcn TEXT  --inspected N
  --received YYYY-MM-DDTHH:MM  --start ...  --finished ...
  --assembly yes|no

view flags (list/summary/chart/export):
  --month YYYY-MM          restrict to one received-month
  --search TEXT            case-insensitive description match

environment: TURNAROUND_DB, TURNAROUND_KEY, LOG_LEVEL, LOG_DOMAINS";

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cfg = Config::from_env();
    let kv = match SqliteKv::open(&cfg.db_path) {
        Ok(kv) => kv,
        Err(err) => {
            eprintln!("failed to open {}: {:#}", cfg.db_path, err);
            exit(1);
        }
    };
    let mut app = App::new(RecordStore::new(kv, cfg.storage_key));

    apply_view_flags(&mut app, &args);

    match args.first().map(String::as_str) {
        None | Some("list") => {
            print_table(app.view());
            print_summary(app.view());
        }
        Some("add") => {
            let fields = match parse_fields(&args[1..], None) {
                Ok(f) => f,
                Err(msg) => fail(&msg),
            };
            report(app.submit(fields));
        }
        Some("edit") => {
            let id = parse_id(args.get(1));
            let current = match app.begin_edit(id) {
                Some(f) => f,
                None => fail(&format!("no record with id {}", id)),
            };
            let fields = match parse_fields(&args[2..], Some(current)) {
                Ok(f) => f,
                Err(msg) => fail(&msg),
            };
            report(app.submit(fields));
        }
        Some("delete") => {
            let id = parse_id(args.get(1));
            report(app.delete(id));
        }
        Some("summary") => print_summary(app.view()),
        Some("chart") => print_chart(app.view()),
        Some("months") => {
            println!("all\tAll Months");
            for bucket in &app.view().months {
                println!("{}\t{}", bucket.key, bucket.label);
            }
        }
        Some("export") => {
            let path = match args.get(1).filter(|a| !a.starts_with("--")) {
                Some(p) => p.clone(),
                None => fail("export needs an output path"),
            };
            let mut writer = CsvWriter::new(Path::new(&path));
            report(app.export(&mut writer));
        }
        Some("help") | Some("--help") => println!("{}", USAGE),
        Some(other) => {
            eprintln!("unknown command: {}\n\n{}", other, USAGE);
            exit(2);
        }
    }
}

fn apply_view_flags<S: turnaround::store::KvStore>(app: &mut App<S>, args: &[String]) {
    if let Some(month) = flag_value(args, "--month") {
        let filter = if month == "all" {
            MonthFilter::All
        } else {
            MonthFilter::Month(month)
        };
        app.set_month_filter(filter);
    }
    if let Some(search) = flag_value(args, "--search") {
        app.set_search(search);
    }
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_id(arg: Option<&String>) -> u64 {
    match arg.and_then(|a| a.parse().ok()) {
        Some(id) => id,
        None => fail("expected a numeric record id"),
    }
}

/// Build form fields from flags, starting from `base` when editing so
/// unset flags keep their stored values.
fn parse_fields(args: &[String], base: Option<RecordFields>) -> Result<RecordFields, String> {
    let editing = base.is_some();
    let mut fields = base.unwrap_or(RecordFields {
        description: String::new(),
        total_qty: 0,
        tracking_number: String::new(),
        inspected_qty: 0,
        received_qc: None,
        qc_start: None,
        qc_finished: None,
        assembly_required: AssemblyRequired::No,
    });

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} needs a value", flag))?;
        match flag {
            "--desc" => fields.description = value.clone(),
            "--qty" => {
                fields.total_qty = value.parse().map_err(|_| "--qty must be a non-negative integer".to_string())?;
            }
            "--tcn" => fields.tracking_number = value.clone(),
            "--inspected" => {
                fields.inspected_qty = value.parse().map_err(|_| "--inspected must be a non-negative integer".to_string())?;
            }
            "--received" => fields.received_qc = blank_to_none(value),
            "--start" => fields.qc_start = blank_to_none(value),
            "--finished" => fields.qc_finished = blank_to_none(value),
            "--assembly" => {
                fields.assembly_required = AssemblyRequired::parse(value)
                    .ok_or_else(|| "--assembly must be yes or no".to_string())?;
            }
            "--month" | "--search" => {} // view flags, handled earlier
            other => return Err(format!("unknown flag: {}", other)),
        }
        i += 2;
    }

    if !editing && fields.description.is_empty() {
        return Err("--desc is required".to_string());
    }
    Ok(fields)
}

fn blank_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn report(notice: Notice) -> ! {
    if notice.is_error {
        eprintln!("{}", notice.text);
        exit(1);
    }
    println!("{}", notice.text);
    exit(0);
}

fn fail(msg: &str) -> ! {
    eprintln!("{}\n\n{}", msg, USAGE);
    exit(2);
}

fn print_table(view: &ViewModel) {
    if view.no_match() {
        println!("{}", NO_MATCH_MESSAGE);
        return;
    }
    println!(
        "{:>13}  {:<25} {:<8} {:<24} {:<24} {:>8} {:>10} {:<12} {:>10}",
        "ID", "DESCRIPTION", "QTY", "RECEIVED", "FINISHED", "TARGET", "EFFIC.", "RESULT", "HOURS",
    );
    for v in &view.visible {
        let r = &v.record;
        let m = &v.metrics;
        println!(
            "{:>13}  {:<25} {:<8} {:<24} {:<24} {:>8} {:>9}% {:<12} {:>10}",
            r.id,
            truncate(&r.description, 25),
            r.total_qty,
            format_local(r.received_qc.as_deref()),
            format_local(r.qc_finished.as_deref()),
            m.target_hours,
            m.efficiency_pct,
            m.classification,
            m.turnaround_hours,
        );
    }
}

fn print_summary(view: &ViewModel) {
    let s = &view.summary;
    println!("Total Records: {}", s.total);
    match s.avg_turnaround_hours {
        Some(avg) => println!("Avg Turnaround Time: {:.2} hours", avg),
        None => println!("Avg Turnaround Time: N/A"),
    }
    match s.avg_efficiency_pct {
        Some(avg) => println!("Avg Actual Efficiency: {:.2}%", avg),
        None => println!("Avg Actual Efficiency: N/A"),
    }
    println!("Met Target: {}", s.met_target);
    println!("Below Target: {}", s.below_target);
}

fn print_chart(view: &ViewModel) {
    let series = match chart::series(&view.visible) {
        Some(s) => s,
        None => {
            println!("No turnaround data available to chart.");
            return;
        }
    };
    println!("{}", chart::CHART_TITLE);
    for (i, bar) in series.bars.iter().enumerate() {
        let width = bar.hours.round().max(0.0) as usize;
        println!(
            "{:<28} {} {}",
            bar.label,
            "#".repeat(width.min(60)),
            series.tooltip(i).unwrap_or(""),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
