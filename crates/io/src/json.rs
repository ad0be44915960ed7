// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use callboard_recon::model::Report;
use callboard_recon::ReconError;

/// Export the full report (meta, rows, totals, diagnostics) as pretty JSON.
/// Values keep full precision; missing metrics are `null`.
pub fn export_report(report: &Report, path: &Path) -> Result<(), ReconError> {
    let write_err = |message: String| ReconError::Write {
        path: path.display().to_string(),
        message,
    };
    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(|e| write_err(e.to_string()))?;
    Ok(())
}
