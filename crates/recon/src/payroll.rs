//! Paid hours from the headerless payroll time-card summary.
//!
//! The export is a report, not a table: an identity row whose first cell
//! starts with the marker (`ID:`) and carries the employee name, some detail
//! rows, then a summary row with blank cells whose hours column holds the
//! paid total. [`scan_timecards`] pairs them with a two-state machine;
//! [`extract_payroll`] resolves the names to agent keys.

use crate::config::PayrollLayout;
use crate::diagnostics::{RecordIssue, SourceDiagnostics};
use crate::error::ReconError;
use crate::extract::parse_number;
use crate::identity::{IdentityNormalizer, Roster};
use crate::model::SourceKind;
use crate::table::{RawTable, SourceColumn};

/// An identity row paired with its hours.
#[derive(Debug, Clone, PartialEq)]
pub struct TimecardEntry {
    /// 1-based line of the identity row.
    pub line: usize,
    /// Name text as exported, e.g. `Doe, John`. Empty when the identity row
    /// had no usable name.
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    SeekingIdentity,
    /// `hours` is the latest summary value seen for this identity.
    SeekingHours {
        line: usize,
        name: String,
        hours: Option<f64>,
    },
}

/// Pair identity rows with summary hours rows.
///
/// A marker row is one whose marker cell starts with the marker, matched
/// case-sensitively. A summary row has at least one blank cell and a value in
/// the hours column.
///
/// - `SeekingIdentity` + marker row → `SeekingHours`.
/// - `SeekingHours` + summary row with a numeric hours cell → remember it.
///   The last one before the next identity wins, since the time card's total
///   follows its detail rows.
/// - `SeekingHours` + summary row with non-numeric hours → `UnparseableHours`.
/// - `SeekingHours` + marker row or end of input → emit the remembered hours,
///   or `MissingHours` when there were none.
pub fn scan_timecards(
    table: &RawTable,
    layout: &PayrollLayout,
    diagnostics: &mut SourceDiagnostics,
) -> Vec<TimecardEntry> {
    let marker = layout.marker.trim();
    let mut entries = Vec::new();
    let mut state = ScanState::SeekingIdentity;

    for (row, cells) in table.rows().iter().enumerate() {
        diagnostics.rows_read += 1;
        let line = table.line_number(row);
        let marker_cell = table.cell(row, layout.marker_column);

        if let Some(after_marker) = strip_marker(marker_cell, marker) {
            close_timecard(state, &mut entries, diagnostics);
            state = ScanState::SeekingHours {
                line,
                name: identity_text(table.cell(row, layout.name_column), after_marker),
                hours: None,
            };
            continue;
        }

        let ScanState::SeekingHours { hours, .. } = &mut state else {
            continue;
        };
        if !cells.iter().any(|c| c.trim().is_empty()) {
            continue;
        }
        let hours_text = table.cell(row, layout.hours_column).trim();
        if hours_text.is_empty() {
            continue;
        }
        match parse_number(hours_text) {
            Some(value) => *hours = Some(value),
            None => {
                diagnostics.drop_record(SourceKind::Payroll, RecordIssue::UnparseableHours, line, hours_text);
            }
        }
    }
    close_timecard(state, &mut entries, diagnostics);

    entries
}

fn close_timecard(state: ScanState, entries: &mut Vec<TimecardEntry>, diagnostics: &mut SourceDiagnostics) {
    match state {
        ScanState::SeekingIdentity => {}
        ScanState::SeekingHours { line, name, hours: Some(hours) } => {
            entries.push(TimecardEntry { line, name, hours });
        }
        ScanState::SeekingHours { line, name, hours: None } => {
            diagnostics.drop_record(SourceKind::Payroll, RecordIssue::MissingHours, line, &name);
        }
    }
}

/// The text after the marker when the cell starts with it.
fn strip_marker<'a>(cell: &'a str, marker: &str) -> Option<&'a str> {
    cell.trim_start().strip_prefix(marker)
}

/// The name column when it has text; otherwise whatever follows the marker,
/// unless that is only an employee number.
fn identity_text(name_cell: &str, after_marker: &str) -> String {
    let name = name_cell.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    let rest = after_marker.trim();
    if rest.chars().any(|c| c.is_alphabetic()) {
        rest.to_string()
    } else {
        String::new()
    }
}

/// Paid hours per agent.
pub fn extract_payroll(
    table: &RawTable,
    layout: &PayrollLayout,
    identity: &IdentityNormalizer,
    roster: &Roster,
) -> Result<SourceColumn, ReconError> {
    if table.is_empty() {
        return Err(ReconError::Csv {
            kind: SourceKind::Payroll,
            message: "file has no rows".into(),
        });
    }

    let mut out = SourceColumn::new(SourceKind::Payroll);
    let entries = scan_timecards(table, layout, &mut out.diagnostics);
    log::debug!("payroll: {} time card(s) paired", entries.len());

    for entry in entries {
        let Some(display) = identity.parse_person_name(&entry.name) else {
            out.diagnostics.drop_record(
                SourceKind::Payroll,
                RecordIssue::UnparseableIdentity,
                entry.line,
                &entry.name,
            );
            continue;
        };
        match identity.resolve_display(roster, &display) {
            Ok(agent) => {
                out.diagnostics.rows_used += 1;
                out.accumulate(agent, entry.hours);
            }
            Err(issue) => {
                out.diagnostics
                    .drop_record(SourceKind::Payroll, issue, entry.line, &display);
            }
        }
    }

    Ok(out)
}
