// Report layout shared by the writers, output naming, and the atomic write

use std::path::{Path, PathBuf};

use callboard_recon::model::{AgentMetrics, DateWindow, Report};
use callboard_recon::{OutputFormat, ReconError};

/// Output columns, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    Agent,
    Name,
    Sets,
    Contacts,
    Dials,
    SetsPerDial,
    SetsPerContact,
    CallingHours,
    CallingHoursRounded,
    SetsPerHour,
    PayrollHours,
    CallingPayrollPct,
}

/// A rendered cell. `Blank` is a metric the agent has no source value for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// One output line: an agent row or the totals row.
#[derive(Debug, Clone, Copy)]
pub struct ReportLine<'a> {
    pub label: &'a str,
    pub metrics: &'a AgentMetrics,
    pub is_total: bool,
}

impl ReportColumn {
    pub const ALL: [ReportColumn; 12] = [
        Self::Agent,
        Self::Name,
        Self::Sets,
        Self::Contacts,
        Self::Dials,
        Self::SetsPerDial,
        Self::SetsPerContact,
        Self::CallingHours,
        Self::CallingHoursRounded,
        Self::SetsPerHour,
        Self::PayrollHours,
        Self::CallingPayrollPct,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Name => "Name",
            Self::Sets => "Sets",
            Self::Contacts => "Contacts",
            Self::Dials => "Dials",
            Self::SetsPerDial => "Sets/Dial",
            Self::SetsPerContact => "Sets/Contact",
            Self::CallingHours => "Calling Hours",
            Self::CallingHoursRounded => "Calling Hours (Rounded)",
            Self::SetsPerHour => "Sets/Hour",
            Self::PayrollHours => "Payroll Hours",
            Self::CallingPayrollPct => "Calling/Payroll %",
        }
    }

    /// Display precision. Counts are whole numbers.
    pub fn decimals(&self) -> usize {
        match self {
            Self::Agent | Self::Name | Self::Sets | Self::Contacts | Self::Dials => 0,
            Self::SetsPerDial | Self::SetsPerContact => 4,
            Self::CallingPayrollPct => 1,
            _ => 2,
        }
    }

    pub fn cell<'a>(&self, line: &ReportLine<'a>) -> Cell<'a> {
        let m = line.metrics;
        let num = |v: Option<f64>| v.map_or(Cell::Blank, Cell::Number);
        match self {
            Self::Agent => Cell::Text(line.label),
            Self::Name if line.is_total => Cell::Blank,
            Self::Name => m.name.as_deref().map_or(Cell::Blank, Cell::Text),
            Self::Sets => Cell::Number(f64::from(m.sets)),
            Self::Contacts => num(m.contacts),
            Self::Dials => num(m.dials),
            Self::SetsPerDial => num(m.sets_per_dial),
            Self::SetsPerContact => num(m.sets_per_contact),
            Self::CallingHours => num(m.calling_hours),
            Self::CallingHoursRounded => num(m.calling_hours_rounded),
            Self::SetsPerHour => num(m.sets_per_hour),
            Self::PayrollHours => num(m.payroll_hours),
            Self::CallingPayrollPct => num(m.calling_payroll_pct),
        }
    }
}

/// Agent rows in report order, then the totals row.
pub fn report_lines(report: &Report) -> impl Iterator<Item = ReportLine<'_>> {
    report
        .rows
        .iter()
        .map(|r| ReportLine {
            label: r.agent.as_str(),
            metrics: &r.metrics,
            is_total: false,
        })
        .chain(std::iter::once(ReportLine {
            label: "Total",
            metrics: &report.totals,
            is_total: true,
        }))
}

// ---------------------------------------------------------------------------
// Output naming
// ---------------------------------------------------------------------------

/// `{prefix}_{start}_{end}.{ext}`
pub fn report_file_name(prefix: &str, window: &DateWindow, format: OutputFormat) -> String {
    format!("{prefix}_{}.{}", window.label(), format.extension())
}

/// Where the report goes. `out` may name a file, an existing directory, or a
/// directory-to-be written with a trailing separator; without it the report
/// lands in the current directory.
pub fn resolve_output_path(
    out: Option<&Path>,
    prefix: &str,
    window: &DateWindow,
    format: OutputFormat,
) -> PathBuf {
    let name = report_file_name(prefix, window, format);
    match out {
        Some(p) if p.is_dir() || p.to_string_lossy().ends_with(std::path::is_separator) => {
            p.join(name)
        }
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(name),
    }
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Write the report in the given format.
///
/// The file is written beside the target under a temporary name and renamed
/// into place, so a failed write leaves no partial report.
pub fn write_report(report: &Report, path: &Path, format: OutputFormat) -> Result<(), ReconError> {
    let write_err = |message: String| ReconError::Write {
        path: path.display().to_string(),
        message,
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| write_err("not a file path".into()))?;
    let mut partial_name = file_name.to_os_string();
    partial_name.push(".partial");
    let partial = path.with_file_name(partial_name);

    let written = match format {
        OutputFormat::Xlsx => crate::xlsx::export_report(report, &partial),
        OutputFormat::Csv => crate::csv::export_report(report, &partial),
        OutputFormat::Json => crate::json::export_report(report, &partial),
    };
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        write_err(e.to_string())
    })?;

    log::info!("wrote {} row(s) to {}", report.rows.len(), path.display());
    Ok(())
}
