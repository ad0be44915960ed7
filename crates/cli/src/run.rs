//! `callboard run`: load the five exports, reconcile, write the report.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate};

use callboard_io::{load_sources, resolve_output_path, write_report, SourceFiles};
use callboard_recon::{DateWindow, OutputFormat, Report, SourceKind};

use crate::util::{fmt_opt, load_config, pad_right, source_base};
use crate::CliError;

/// Per-source path flags.
#[derive(Debug, Default)]
pub(crate) struct SourceOverrides {
    pub leads: Option<PathBuf>,
    pub contacts: Option<PathBuf>,
    pub dials: Option<PathBuf>,
    pub calling_hours: Option<PathBuf>,
    pub payroll: Option<PathBuf>,
}

impl SourceOverrides {
    fn apply(&self, files: &mut SourceFiles) {
        let given = [
            (SourceKind::Leads, &self.leads),
            (SourceKind::Contacts, &self.contacts),
            (SourceKind::Dials, &self.dials),
            (SourceKind::CallingHours, &self.calling_hours),
            (SourceKind::Payroll, &self.payroll),
        ];
        for (kind, path) in given {
            if let Some(path) = path {
                log::debug!("{kind}: using {}", path.display());
                files.set(kind, path.clone());
            }
        }
    }
}

pub(crate) struct RunArgs {
    pub start: Option<String>,
    pub end: Option<String>,
    pub week: Option<String>,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub overrides: SourceOverrides,
    pub out: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub json: bool,
    pub quiet: bool,
}

pub(crate) fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), args.week.as_deref())?;
    let (config, config_path) = load_config(args.config.as_deref())?;

    let base = source_base(args.data_dir.as_deref(), config_path.as_deref());
    let mut files = SourceFiles::from_config(&config.sources, &base);
    args.overrides.apply(&mut files);

    let tables = load_sources(&files)?;
    let report = callboard_recon::run(&config, &window, &tables)?;

    let format = args.format.unwrap_or(config.output.format);
    let path = resolve_output_path(args.out.as_deref(), &config.output.prefix, &window, format);
    ensure_parent_dir(&path)?;
    write_report(&report, &path, format)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::args(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    if !args.quiet {
        print_summary(&report, &path);
    }

    Ok(())
}

/// `--start/--end`, or the Monday-to-Sunday week containing `--week`.
fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    week: Option<&str>,
) -> Result<DateWindow, CliError> {
    let hint = "dates are YYYY-MM-DD, e.g. --start 2026-03-02 --end 2026-03-08";
    match (start, end, week) {
        (Some(start), Some(end), None) => {
            DateWindow::parse(start, end).map_err(|e| CliError::from(e).with_hint(hint))
        }
        (None, None, Some(day)) => {
            let day = NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::args(format!("--week: '{day}' is not a valid YYYY-MM-DD date")).with_hint(hint)
            })?;
            week_containing(day)
        }
        _ => Err(CliError::args("give either --start and --end, or --week").with_hint(hint)),
    }
}

fn week_containing(day: NaiveDate) -> Result<DateWindow, CliError> {
    let offset = u64::from(day.weekday().num_days_from_monday());
    let monday = day.checked_sub_days(Days::new(offset));
    let sunday = monday.and_then(|m| m.checked_add_days(Days::new(6)));
    match (monday, sunday) {
        (Some(start), Some(end)) => Ok(DateWindow::new(start, end)?),
        _ => Err(CliError::args(format!("--week: {day} is out of range"))),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), CliError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::from(callboard_recon::ReconError::Write {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            })
        }
        _ => Ok(()),
    }
}

fn print_summary(report: &Report, path: &Path) {
    let t = &report.totals;
    eprintln!("wrote {}", path.display());
    eprintln!(
        "{} to {}: {} agent(s), {} set(s), {} dial(s), {} calling hour(s), {} payroll hour(s)",
        report.meta.start,
        report.meta.end,
        report.rows.len(),
        t.sets,
        fmt_opt(t.dials, 0),
        fmt_opt(t.calling_hours_rounded, 2),
        fmt_opt(t.payroll_hours, 2),
    );

    if report.rows.is_empty() {
        eprintln!("warning: no agents found in any source");
    }

    if report.diagnostics.is_clean() {
        return;
    }
    eprintln!("dropped records:");
    for (kind, diag) in &report.diagnostics.sources {
        if diag.dropped_total() == 0 {
            continue;
        }
        let detail: Vec<String> = diag
            .dropped
            .iter()
            .map(|(issue, n)| format!("{issue}: {n}"))
            .collect();
        eprintln!(
            "  {} {:>4}  ({})",
            pad_right(kind.as_str(), 14),
            diag.dropped_total(),
            detail.join(", ")
        );
    }
}
