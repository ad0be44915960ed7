use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::identity::IdentityOverrides;
use crate::model::SourceKind;
use crate::rounding::{RoundingTier, RoundingTiers, DEFAULT_TIERS};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every section is optional; defaults match the
/// standard weekly exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sources: SourcePaths,
    pub columns: ColumnConfig,
    pub payroll: PayrollLayout,
    pub identity: IdentityOverrides,
    pub rounding: RoundingConfig,
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Source file locations, relative to the config file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcePaths {
    pub leads: String,
    pub contacts: String,
    pub dials: String,
    pub calling_hours: String,
    pub payroll: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            leads: "call_center_master_list.csv".into(),
            contacts: "total_warm_contacts.csv".into(),
            dials: "total_warm_dials.csv".into(),
            calling_hours: "agent_daily_summary.csv".into(),
            payroll: "master_timecard_summary.csv".into(),
        }
    }
}

impl SourcePaths {
    pub fn get(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Leads => &self.leads,
            SourceKind::Contacts => &self.contacts,
            SourceKind::Dials => &self.dials,
            SourceKind::CallingHours => &self.calling_hours,
            SourceKind::Payroll => &self.payroll,
        }
    }
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    pub leads: LeadsColumns,
    pub contacts: ContactsColumns,
    pub dials: DialsColumns,
    pub calling_hours: CallingHoursColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeadsColumns {
    pub date: String,
    pub bonus: String,
    pub agent: String,
}

impl Default for LeadsColumns {
    fn default() -> Self {
        Self {
            date: "Date/Time".into(),
            bonus: "WT/SA Bonus".into(),
            agent: "BCI Caller".into(),
        }
    }
}

/// Every column besides `agent` and `exclude` that holds only numbers is
/// summed as attempt volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactsColumns {
    pub agent: String,
    pub exclude: Vec<String>,
}

impl Default for ContactsColumns {
    fn default() -> Self {
        Self {
            agent: "AGENT".into(),
            exclude: vec!["AGENT GROUP".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialsColumns {
    pub agent: String,
    pub first_name: String,
    pub last_name: String,
    pub exclude: Vec<String>,
}

impl Default for DialsColumns {
    fn default() -> Self {
        Self {
            agent: "AGENT".into(),
            first_name: "AGENT FIRST NAME".into(),
            last_name: "AGENT LAST NAME".into(),
            exclude: vec!["AGENT GROUP".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallingHoursColumns {
    pub agent: String,
    pub on_call: String,
    pub ready: String,
}

impl Default for CallingHoursColumns {
    fn default() -> Self {
        Self {
            agent: "AGENT".into(),
            on_call: "On Call / AGENT STATE TIME".into(),
            ready: "Ready / AGENT STATE TIME".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Payroll layout
// ---------------------------------------------------------------------------

/// Positions in the headerless time-card summary (0-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PayrollLayout {
    /// Text that marks an employee identity row.
    pub marker: String,
    pub marker_column: usize,
    pub name_column: usize,
    pub hours_column: usize,
}

impl Default for PayrollLayout {
    fn default() -> Self {
        Self {
            marker: "ID:".into(),
            marker_column: 0,
            name_column: 1,
            hours_column: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Rounding + output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoundingConfig {
    pub tiers: Vec<RoundingTier>,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl RoundingConfig {
    pub fn build(&self) -> Result<RoundingTiers, ReconError> {
        RoundingTiers::new(self.tiers.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File name prefix; the date window is appended.
    pub prefix: String,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "agent_call_center_metrics".into(),
            format: OutputFormat::Xlsx,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: Config =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.identity.validate()?;
        self.rounding.build()?;

        let p = &self.payroll;
        if p.marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation("payroll.marker must not be empty".into()));
        }
        if p.hours_column == p.marker_column || p.hours_column == p.name_column {
            return Err(ReconError::ConfigValidation(format!(
                "payroll.hours_column ({}) must differ from marker_column and name_column",
                p.hours_column
            )));
        }

        for kind in SourceKind::ALL {
            if self.sources.get(kind).trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sources.{kind} must not be empty"
                )));
            }
        }

        if self.output.prefix.trim().is_empty() {
            return Err(ReconError::ConfigValidation("output.prefix must not be empty".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
