//! Quarter-hour rounding of calling hours.
//!
//! The fractional part of an hour value is converted to whole minutes and
//! classified by a tier table. Default tiers follow the usual 7-minute
//! payroll rule:
//!
//! | Minutes | Added  |
//! |---------|--------|
//! | 0–7     | 0.00   |
//! | 8–22    | 0.25   |
//! | 23–37   | 0.50   |
//! | 38–52   | 0.75   |
//! | 53–59   | 1.00   |

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// One row of the tier table. A tier covers the minutes after the previous
/// tier's `max_minute` up to and including its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoundingTier {
    pub max_minute: u32,
    pub quarter: f64,
}

pub const DEFAULT_TIERS: [RoundingTier; 5] = [
    RoundingTier { max_minute: 7, quarter: 0.0 },
    RoundingTier { max_minute: 22, quarter: 0.25 },
    RoundingTier { max_minute: 37, quarter: 0.5 },
    RoundingTier { max_minute: 52, quarter: 0.75 },
    RoundingTier { max_minute: 59, quarter: 1.0 },
];

const ALLOWED_QUARTERS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// A validated tier table: contiguous over 0–59, quarters non-decreasing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundingTiers {
    tiers: Vec<RoundingTier>,
}

impl Default for RoundingTiers {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl RoundingTiers {
    pub fn new(tiers: Vec<RoundingTier>) -> Result<Self, ReconError> {
        let invalid = |msg: String| ReconError::ConfigValidation(format!("rounding.tiers: {msg}"));

        if tiers.is_empty() {
            return Err(invalid("at least one tier is required".into()));
        }

        let mut prev: Option<&RoundingTier> = None;
        for tier in &tiers {
            if !ALLOWED_QUARTERS.contains(&tier.quarter) {
                return Err(invalid(format!(
                    "quarter {} must be one of 0, 0.25, 0.5, 0.75, 1",
                    tier.quarter
                )));
            }
            if let Some(p) = prev {
                if tier.max_minute <= p.max_minute {
                    return Err(invalid(format!(
                        "max_minute {} does not follow {}",
                        tier.max_minute, p.max_minute
                    )));
                }
                if tier.quarter < p.quarter {
                    return Err(invalid(format!(
                        "quarter {} after {} would round more minutes down",
                        tier.quarter, p.quarter
                    )));
                }
            }
            prev = Some(tier);
        }

        let last = tiers[tiers.len() - 1].max_minute;
        if last != 59 {
            return Err(invalid(format!("last tier must end at minute 59, ends at {last}")));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[RoundingTier] {
        &self.tiers
    }

    /// Quarter added for a whole-minute value in 0–59.
    pub fn quarter_for_minute(&self, minute: u32) -> f64 {
        self.tiers
            .iter()
            .find(|t| minute <= t.max_minute)
            .map(|t| t.quarter)
            .unwrap_or(1.0)
    }

    /// Round a fractional hour value to a quarter hour. Negative and
    /// non-finite input rounds to zero.
    pub fn round(&self, hours: f64) -> f64 {
        if !hours.is_finite() || hours <= 0.0 {
            return 0.0;
        }
        let mut whole = hours.trunc();
        let mut minute = ((hours - whole) * 60.0).round() as u32;
        if minute >= 60 {
            whole += 1.0;
            minute = 0;
        }
        whole + self.quarter_for_minute(minute)
    }
}

/// [`RoundingTiers::round`] with the default tier table.
pub fn round_quarter_hour(hours: f64) -> f64 {
    RoundingTiers::default().round(hours)
}
