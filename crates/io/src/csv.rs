// CSV source import and report export

use std::io::Read;
use std::path::Path;

use callboard_recon::model::{Report, SourceKind};
use callboard_recon::{RawTable, ReconError};

use crate::report::{report_lines, Cell, ReportColumn};

/// Import a delimited source file. The delimiter is sniffed.
pub fn import_table(kind: SourceKind, path: &Path) -> Result<RawTable, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    log::debug!(
        "{kind}: reading {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );
    RawTable::from_csv(kind, &content, delimiter, kind.has_headers())
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by its width.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let io_err = |e: std::io::Error| ReconError::Io(format!("{}: {e}", path.display()));
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Write the report as CSV: header row, one row per agent, totals row.
/// Numbers are rounded to each column's display precision; missing values
/// are empty fields.
pub fn export_report(report: &Report, path: &Path) -> Result<(), ReconError> {
    let write_err = |e: csv::Error| ReconError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut writer = csv::WriterBuilder::new().from_path(path).map_err(write_err)?;

    writer
        .write_record(ReportColumn::ALL.iter().map(|c| c.header()))
        .map_err(write_err)?;

    for line in report_lines(report) {
        let record: Vec<String> = ReportColumn::ALL
            .iter()
            .map(|col| match col.cell(&line) {
                Cell::Text(s) => s.to_string(),
                Cell::Number(n) => format!("{n:.*}", col.decimals()),
                Cell::Blank => String::new(),
            })
            .collect();
        writer.write_record(&record).map_err(write_err)?;
    }

    writer.flush().map_err(|e| ReconError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "AGENT;Mon;Tue\njdoe;3;4\nasmith;1;2\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "AGENT,Mon,Tue\njdoe,3,4\nasmith,1,2\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "AGENT\tMon\tTue\njdoe\t3\t4\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_quoted_commas_in_headerless_payroll() {
        let content = "ID: 1;\"Doe, John\";;;\n;;;Total;38.5\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dials.csv");
        // "José" with é as 0xE9
        fs::write(&path, b"AGENT,AGENT FIRST NAME\njose@x.com,Jos\xe9\n").unwrap();
        let content = read_file_as_utf8(&path).unwrap();
        assert!(content.contains("José"));
    }

    #[test]
    fn test_import_semicolon_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.csv");
        fs::write(&path, "AGENT;Mon;Tue\njdoe@x.com;3;4\n").unwrap();

        let table = import_table(SourceKind::Contacts, &path).unwrap();
        assert_eq!(table.headers(), &["AGENT", "Mon", "Tue"]);
        assert_eq!(table.cell(0, 2), "4");
    }

    #[test]
    fn test_import_payroll_has_no_header_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payroll.csv");
        fs::write(&path, "ID: 1,\"Doe, John\",,,\n,,,Total,38.5\n").unwrap();

        let table = import_table(SourceKind::Payroll, &path).unwrap();
        assert!(table.headers().is_empty());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_table(SourceKind::Leads, Path::new("/nonexistent/leads.csv")).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }

    #[test]
    fn test_export_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        export_report(&sample_report(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("Agent"));
        assert_eq!(headers.get(11), Some("Calling/Payroll %"));

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);

        // jdoe: full row
        assert_eq!(records[0].get(0), Some("jdoe"));
        assert_eq!(records[0].get(1), Some("John D"));
        assert_eq!(records[0].get(2), Some("2"));
        assert_eq!(records[0].get(5), Some("0.1333"));
        assert_eq!(records[0].get(8), Some("2.00"));

        // bkim: leads only, blanks elsewhere
        assert_eq!(records[1].get(0), Some("bkim"));
        assert_eq!(records[1].get(1), Some(""));
        assert_eq!(records[1].get(4), Some(""));
        assert_eq!(records[1].get(10), Some(""));

        // totals
        assert_eq!(records[2].get(0), Some("Total"));
        assert_eq!(records[2].get(2), Some("3"));
    }
}
