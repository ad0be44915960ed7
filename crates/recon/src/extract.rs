//! Per-source extractors: leads → sets, contacts, dials, calling hours.
//!
//! Each extractor checks its required columns up front, then walks the rows
//! once. Records it cannot use are dropped and counted; only structural
//! problems are errors.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::{CallingHoursColumns, ContactsColumns, DialsColumns, LeadsColumns};
use crate::diagnostics::{RecordIssue, SourceDiagnostics};
use crate::error::ReconError;
use crate::identity::{IdentityNormalizer, Roster};
use crate::model::{AgentKey, DateWindow, SourceKind};
use crate::table::{RawTable, SourceColumn};

// ---------------------------------------------------------------------------
// Sets (leads)
// ---------------------------------------------------------------------------

/// Count completed sets per agent inside the window. Every agent with an
/// in-window lead is present, at zero when none of its leads is a set.
pub fn extract_sets(
    table: &RawTable,
    cols: &LeadsColumns,
    window: &DateWindow,
    identity: &IdentityNormalizer,
) -> Result<SourceColumn, ReconError> {
    let date_idx = table.column_index(&cols.date)?;
    let bonus_idx = table.column_index(&cols.bonus)?;
    let agent_idx = table.column_index(&cols.agent)?;

    let mut out = SourceColumn::new(SourceKind::Leads);
    for row in 0..table.len() {
        out.diagnostics.rows_read += 1;
        let line = table.line_number(row);

        let date_text = table.cell(row, date_idx);
        let Some(date) = parse_record_date(date_text) else {
            out.diagnostics
                .drop_record(SourceKind::Leads, RecordIssue::UnparseableDate, line, date_text);
            continue;
        };
        if !window.contains(date) {
            continue;
        }

        let caller = table.cell(row, agent_idx);
        let Some(agent) = identity.normalize_username(caller) else {
            out.diagnostics
                .drop_record(SourceKind::Leads, RecordIssue::UnparseableIdentity, line, caller);
            continue;
        };

        // Agents with only zero-bonus leads still get a row, at zero sets.
        if is_set(table.cell(row, bonus_idx)) {
            out.diagnostics.rows_used += 1;
            out.accumulate(agent, 1.0);
        } else {
            out.register(agent);
        }
    }

    log::debug!(
        "leads: {} set(s) for {} agent(s) in {}",
        out.diagnostics.rows_used,
        out.values.len(),
        window.label()
    );
    Ok(out)
}

/// A lead is a set when its bonus is non-zero.
///
/// Currency symbols, thousands separators and accounting parentheses are
/// ignored. Blank cells and the `none` / `n/a` / `-` placeholders are zero.
/// Text that is not a number at all still counts as a bonus.
pub fn is_set(bonus: &str) -> bool {
    let text = bonus.trim().to_lowercase();
    if matches!(text.as_str(), "" | "none" | "n/a" | "na" | "-") {
        return false;
    }
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '(' | ')' | ' '))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return false;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => v != 0.0,
        Err(_) => true,
    }
}

const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M%p",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Calendar date of a lead timestamp. The time of day is discarded.
pub fn parse_record_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

// ---------------------------------------------------------------------------
// Contacts / dials
// ---------------------------------------------------------------------------

/// Sum contact attempts per agent.
pub fn extract_contacts(
    table: &RawTable,
    cols: &ContactsColumns,
    identity: &IdentityNormalizer,
) -> Result<SourceColumn, ReconError> {
    let agent_idx = table.column_index(&cols.agent)?;
    let mut skip = vec![agent_idx];
    skip.extend(cols.exclude.iter().filter_map(|c| table.find_column(c)));

    let mut out = SourceColumn::new(SourceKind::Contacts);
    sum_volume(table, agent_idx, &skip, identity, &mut out);
    Ok(out)
}

/// Dials per agent plus the display-name roster the payroll source needs.
#[derive(Debug, Clone)]
pub struct DialsExtract {
    pub dials: SourceColumn,
    pub roster: Roster,
    pub names: BTreeMap<AgentKey, String>,
}

/// Sum dial attempts per agent and collect each agent's `First L` name.
pub fn extract_dials(
    table: &RawTable,
    cols: &DialsColumns,
    identity: &IdentityNormalizer,
) -> Result<DialsExtract, ReconError> {
    let agent_idx = table.column_index(&cols.agent)?;
    let first_idx = table.column_index(&cols.first_name)?;
    let last_idx = table.column_index(&cols.last_name)?;
    let mut skip = vec![agent_idx, first_idx, last_idx];
    skip.extend(cols.exclude.iter().filter_map(|c| table.find_column(c)));

    let mut dials = SourceColumn::new(SourceKind::Dials);
    sum_volume(table, agent_idx, &skip, identity, &mut dials);

    let mut roster = Roster::new();
    let mut names = BTreeMap::new();
    for row in 0..table.len() {
        let Some(agent) = identity.normalize_username(table.cell(row, agent_idx)) else {
            continue;
        };
        let Some(display) =
            identity.display_name(table.cell(row, first_idx), table.cell(row, last_idx))
        else {
            continue;
        };
        roster.insert(&display, &agent);
        names.entry(agent).or_insert(display);
    }

    log::debug!("dials: roster of {} display name(s)", roster.len());
    Ok(DialsExtract { dials, roster, names })
}

/// Columns (outside `skip`) whose every non-empty cell is a number, with at
/// least one non-empty cell.
pub fn numeric_columns(table: &RawTable, skip: &[usize]) -> Vec<usize> {
    let width = table.rows().iter().map(|r| r.len()).max().unwrap_or(0);
    let width = width.max(table.headers().len());

    (0..width)
        .filter(|col| !skip.contains(col))
        .filter(|&col| {
            let mut seen = false;
            for row in 0..table.len() {
                let cell = table.cell(row, col).trim();
                if cell.is_empty() {
                    continue;
                }
                if parse_number(cell).is_none() {
                    return false;
                }
                seen = true;
            }
            seen
        })
        .collect()
}

fn sum_volume(
    table: &RawTable,
    agent_idx: usize,
    skip: &[usize],
    identity: &IdentityNormalizer,
    out: &mut SourceColumn,
) {
    let kind = out.kind;
    let numeric = numeric_columns(table, skip);
    log::debug!("{kind}: summing {} numeric column(s)", numeric.len());

    for row in 0..table.len() {
        out.diagnostics.rows_read += 1;
        let raw = table.cell(row, agent_idx);
        let Some(agent) = identity.normalize_username(raw) else {
            out.diagnostics
                .drop_record(kind, RecordIssue::UnparseableIdentity, table.line_number(row), raw);
            continue;
        };
        let total: f64 = numeric
            .iter()
            .filter_map(|&col| parse_number(table.cell(row, col)))
            .sum();
        out.diagnostics.rows_used += 1;
        out.accumulate(agent, total);
    }
}

/// A plain number, allowing thousands separators.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Calling hours
// ---------------------------------------------------------------------------

/// Sum on-call and ready state time per agent, in fractional hours.
pub fn extract_calling_hours(
    table: &RawTable,
    cols: &CallingHoursColumns,
    identity: &IdentityNormalizer,
) -> Result<SourceColumn, ReconError> {
    let agent_idx = table.column_index(&cols.agent)?;
    let state_idx = [
        table.column_index(&cols.on_call)?,
        table.column_index(&cols.ready)?,
    ];

    let mut out = SourceColumn::new(SourceKind::CallingHours);
    'rows: for row in 0..table.len() {
        out.diagnostics.rows_read += 1;
        let line = table.line_number(row);

        let raw = table.cell(row, agent_idx);
        let Some(agent) = identity.normalize_username(raw) else {
            out.diagnostics
                .drop_record(SourceKind::CallingHours, RecordIssue::UnparseableIdentity, line, raw);
            continue;
        };

        let mut hours = 0.0;
        for &idx in &state_idx {
            let text = table.cell(row, idx).trim();
            if text.is_empty() {
                continue;
            }
            match parse_duration_hours(text) {
                Some(h) => hours += h,
                None => {
                    out.diagnostics.drop_record(
                        SourceKind::CallingHours,
                        RecordIssue::UnparseableDuration,
                        line,
                        text,
                    );
                    continue 'rows;
                }
            }
        }

        out.diagnostics.rows_used += 1;
        out.accumulate(agent, hours);
    }
    Ok(out)
}

/// `H:MM:SS` or `H:MM` → fractional hours. Hours may exceed 24; minutes and
/// seconds must be below 60.
pub fn parse_duration_hours(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [h, m] => (*h, *m, "0"),
        _ => return None,
    };
    let hours: u64 = h.trim().parse().ok()?;
    let minutes: u64 = m.trim().parse().ok()?;
    let seconds: f64 = s.trim().parse().ok()?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 + minutes as f64 / 60.0 + seconds / 3600.0)
}
