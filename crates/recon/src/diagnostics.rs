use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::SourceKind;

/// Why a single record was left out of a source's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordIssue {
    /// No normalization strategy produced an agent key.
    UnparseableIdentity,
    /// Lead row whose date column could not be read.
    UnparseableDate,
    /// State-time cell that is not `H:MM:SS`.
    UnparseableDuration,
    /// Payroll summary row whose hours cell is not numeric.
    UnparseableHours,
    /// Payroll name that matches no agent (or more than one).
    UnresolvedName,
    /// Payroll identity row with no hours row before the next identity.
    MissingHours,
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnparseableIdentity => write!(f, "unparseable_identity"),
            Self::UnparseableDate => write!(f, "unparseable_date"),
            Self::UnparseableDuration => write!(f, "unparseable_duration"),
            Self::UnparseableHours => write!(f, "unparseable_hours"),
            Self::UnresolvedName => write!(f, "unresolved_name"),
            Self::MissingHours => write!(f, "missing_hours"),
        }
    }
}

/// Row accounting for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceDiagnostics {
    pub rows_read: usize,
    pub rows_used: usize,
    pub dropped: BTreeMap<RecordIssue, usize>,
}

impl SourceDiagnostics {
    /// Count a dropped record. `line` is 1-based, as a spreadsheet shows it.
    pub fn drop_record(&mut self, kind: SourceKind, issue: RecordIssue, line: usize, detail: &str) {
        log::debug!("{kind} line {line}: {issue}: {detail:?}");
        *self.dropped.entry(issue).or_insert(0) += 1;
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn count(&self, issue: RecordIssue) -> usize {
        self.dropped.get(&issue).copied().unwrap_or(0)
    }
}

/// Dropped-record counts for the whole run, surfaced in the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub sources: BTreeMap<SourceKind, SourceDiagnostics>,
}

impl Diagnostics {
    pub fn insert(&mut self, kind: SourceKind, diag: SourceDiagnostics) {
        if diag.dropped_total() > 0 {
            let parts: Vec<String> = diag
                .dropped
                .iter()
                .map(|(issue, n)| format!("{issue}: {n}"))
                .collect();
            log::warn!(
                "{kind}: dropped {} record(s) ({})",
                diag.dropped_total(),
                parts.join(", ")
            );
        }
        self.sources.insert(kind, diag);
    }

    pub fn get(&self, kind: SourceKind) -> Option<&SourceDiagnostics> {
        self.sources.get(&kind)
    }

    pub fn dropped_total(&self) -> usize {
        self.sources.values().map(|d| d.dropped_total()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.dropped_total() == 0
    }
}
