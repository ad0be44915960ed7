//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scheduled report jobs rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success: report written                              |
//! | 1    | General error (unreadable source, CSV parse failure) |
//! | 2    | Usage error (bad arguments, bad date window)         |
//! | 3    | A source file is missing                             |
//! | 4    | A source file lacks a required column                |
//! | 5    | Config file cannot be parsed or fails validation     |
//! | 6    | The report could not be written                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError::from`

use callboard_recon::ReconError;

/// Success - report written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed or inverted date window.
pub const EXIT_USAGE: u8 = 2;

/// A source file does not exist. Nothing was parsed.
pub const EXIT_MISSING_SOURCE: u8 = 3;

/// A source file exists but lacks a required column.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// Config file unreadable as TOML, unknown key, or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// The report file could not be written. No partial file is left behind.
pub const EXIT_WRITE_FAILED: u8 = 6;

/// Exit code for an engine or IO error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingSource { .. } => EXIT_MISSING_SOURCE,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::InvalidWindow(_) => EXIT_USAGE,
        ReconError::Write { .. } => EXIT_WRITE_FAILED,
        ReconError::Csv { .. } | ReconError::Io(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_recon::SourceKind;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_MISSING_SOURCE,
            EXIT_MISSING_COLUMN,
            EXIT_INVALID_CONFIG,
            EXIT_WRITE_FAILED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn structural_errors_map_to_specific_codes() {
        let missing = ReconError::MissingSource {
            kind: SourceKind::Payroll,
            path: "data/master_timecard_summary.csv".into(),
        };
        assert_eq!(recon_exit_code(&missing), EXIT_MISSING_SOURCE);

        let column = ReconError::MissingColumn {
            kind: SourceKind::Leads,
            column: "WT/SA Bonus".into(),
        };
        assert_eq!(recon_exit_code(&column), EXIT_MISSING_COLUMN);

        assert_eq!(
            recon_exit_code(&ReconError::ConfigValidation("x".into())),
            EXIT_INVALID_CONFIG
        );
        assert_eq!(recon_exit_code(&ReconError::InvalidWindow("x".into())), EXIT_USAGE);
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_ERROR);
    }
}
