use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The five weekly exports, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Leads,
    Contacts,
    Dials,
    CallingHours,
    Payroll,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        Self::Leads,
        Self::Contacts,
        Self::Dials,
        Self::CallingHours,
        Self::Payroll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Contacts => "contacts",
            Self::Dials => "dials",
            Self::CallingHours => "calling_hours",
            Self::Payroll => "payroll",
        }
    }

    /// The payroll time-card summary is exported without a header row.
    pub fn has_headers(&self) -> bool {
        !matches!(self, Self::Payroll)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Canonical agent identity: a lowercase username with overrides applied.
///
/// Only [`crate::identity::IdentityNormalizer`] constructs these, so every key
/// in an [`crate::table::AgentTable`] has been through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AgentKey(String);

impl AgentKey {
    pub(crate) fn new(canonical: String) -> Self {
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// Inclusive reporting window. Filters the leads source only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReconError> {
        if start > end {
            return Err(ReconError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ReconError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                ReconError::InvalidWindow(format!("'{s}' is not a valid YYYY-MM-DD date"))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `2026-03-02_2026-03-08`, used in report file names.
    pub fn label(&self) -> String {
        format!("{}_{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Per-agent metrics
// ---------------------------------------------------------------------------

/// One row of the accumulated table. Fields fill in as stages merge;
/// `None` means the agent never appeared in the source that supplies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absence from the leads window means zero sets, so this is not optional.
    pub sets: u32,
    pub contacts: Option<f64>,
    pub dials: Option<f64>,
    pub sets_per_dial: Option<f64>,
    pub sets_per_contact: Option<f64>,
    pub calling_hours: Option<f64>,
    pub calling_hours_rounded: Option<f64>,
    pub sets_per_hour: Option<f64>,
    pub payroll_hours: Option<f64>,
    pub calling_payroll_pct: Option<f64>,
}

impl AgentMetrics {
    /// Recompute every ratio whose inputs are present.
    ///
    /// Called after every merge, so the final values do not depend on the
    /// order sources were merged in.
    pub fn derive(&mut self) {
        let sets = Some(f64::from(self.sets));
        self.sets_per_dial = ratio(sets, self.dials);
        self.sets_per_contact = ratio(sets, self.contacts);
        self.sets_per_hour = ratio(sets, self.calling_hours_rounded);
        self.calling_payroll_pct = ratio(self.calling_hours, self.payroll_hours).map(|r| r * 100.0);
    }
}

/// `numerator / denominator`, or `None` when either side is missing or the
/// denominator is zero.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 && n.is_finite() && d.is_finite() => Some(n / d),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub agent: AgentKey,
    #[serde(flatten)]
    pub metrics: AgentMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub engine_version: String,
    pub run_at: String,
}

/// The finished table: one row per reconciled agent plus a totals row.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub rows: Vec<ReportRow>,
    pub totals: AgentMetrics,
    pub diagnostics: Diagnostics,
}

impl Report {
    pub fn row(&self, agent: &str) -> Option<&AgentMetrics> {
        self.rows
            .iter()
            .find(|r| r.agent.as_str() == agent)
            .map(|r| &r.metrics)
    }
}
