// Excel source import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import: first sheet only, every cell rendered to the text a CSV export of
// the same data would hold, so extractors see one shape regardless of format.
// Export: presentation snapshot. Values are written as numbers with display
// formats; no formulas.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet, XlsxError};

use callboard_recon::model::{Report, SourceKind};
use callboard_recon::{RawTable, ReconError};

use crate::report::{report_lines, Cell, ReportColumn};

/// File extensions read through the spreadsheet importer.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import the first sheet of a workbook as a source table.
pub fn import_table(kind: SourceKind, path: &Path) -> Result<RawTable, ReconError> {
    let csv_err = |message: String| ReconError::Csv { kind, message };

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| csv_err(format!("failed to open {}: {e}", path.display())))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(csv_err(format!("{} contains no sheets", path.display())));
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| csv_err(format!("failed to read sheet '{first}': {e}")))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    log::debug!(
        "{kind}: read {} row(s) from sheet '{first}' of {}",
        rows.len(),
        path.display()
    );
    Ok(RawTable::from_rows(kind, rows, kind.has_headers()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => serial_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Render an Excel date serial (1900 system). Serials below one day are
/// state-time durations (`H:MM:SS`); anything else is a timestamp.
fn serial_text(serial: f64) -> String {
    const MAX_SERIAL: f64 = 2_958_466.0; // 9999-12-31
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_SERIAL {
        return format!("{serial}");
    }

    let total_seconds = (serial * 86_400.0).round() as i64;
    if serial < 1.0 {
        let (h, m, s) = (total_seconds / 3600, total_seconds / 60 % 60, total_seconds % 60);
        return format!("{h}:{m:02}:{s:02}");
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    match epoch.and_then(|e| e.checked_add_signed(Duration::seconds(total_seconds))) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{serial}"),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Export the report as a workbook with a `Metrics` sheet (bold header,
/// frozen header row, bold totals row) and a `Diagnostics` sheet.
pub fn export_report(report: &Report, path: &Path) -> Result<(), ReconError> {
    let write_err = |e: XlsxError| ReconError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();

    let metrics = workbook.add_worksheet().set_name("Metrics").map_err(write_err)?;
    write_metrics_sheet(metrics, report).map_err(write_err)?;

    let diagnostics = workbook.add_worksheet().set_name("Diagnostics").map_err(write_err)?;
    write_diagnostics_sheet(diagnostics, report).map_err(write_err)?;

    workbook.save(path).map_err(write_err)?;
    Ok(())
}

fn number_format(decimals: usize) -> String {
    if decimals == 0 {
        "0".to_string()
    } else {
        format!("0.{}", "0".repeat(decimals))
    }
}

fn write_metrics_sheet(worksheet: &mut Worksheet, report: &Report) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    let body: Vec<Format> = ReportColumn::ALL
        .iter()
        .map(|c| Format::new().set_num_format(number_format(c.decimals())))
        .collect();
    let totals: Vec<Format> = body
        .iter()
        .map(|f| f.clone().set_bold().set_border_top(FormatBorder::Thin))
        .collect();

    for (col, column) in ReportColumn::ALL.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, column.header(), &header_format)?;
        let width = column.header().len().max(10) as f64 + 2.0;
        worksheet.set_column_width(col, width)?;
    }

    for (i, line) in report_lines(report).enumerate() {
        let row = i as u32 + 1;
        let formats = if line.is_total { &totals } else { &body };
        for (col, column) in ReportColumn::ALL.iter().enumerate() {
            let format = &formats[col];
            let col = col as u16;
            match column.cell(&line) {
                Cell::Text(s) => worksheet.write_string_with_format(row, col, s, format)?,
                Cell::Number(n) => worksheet.write_number_with_format(row, col, n, format)?,
                Cell::Blank => worksheet.write_blank(row, col, format)?,
            };
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_diagnostics_sheet(worksheet: &mut Worksheet, report: &Report) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let meta = &report.meta;

    worksheet.write_string_with_format(0, 0, "Window", &bold)?;
    worksheet.write_string(0, 1, format!("{} to {}", meta.start, meta.end))?;
    worksheet.write_string_with_format(1, 0, "Run At", &bold)?;
    worksheet.write_string(1, 1, &meta.run_at)?;
    worksheet.write_string_with_format(2, 0, "Engine", &bold)?;
    worksheet.write_string(2, 1, &meta.engine_version)?;

    let headers = ["Source", "Rows Read", "Rows Used", "Dropped", "Detail"];
    for (col, h) in headers.iter().enumerate() {
        worksheet.write_string_with_format(4, col as u16, *h, &bold)?;
    }

    for (i, (kind, diag)) in report.diagnostics.sources.iter().enumerate() {
        let row = i as u32 + 5;
        let detail: Vec<String> = diag
            .dropped
            .iter()
            .map(|(issue, n)| format!("{issue}: {n}"))
            .collect();
        worksheet.write_string(row, 0, kind.as_str())?;
        worksheet.write_number(row, 1, diag.rows_read as f64)?;
        worksheet.write_number(row, 2, diag.rows_used as f64)?;
        worksheet.write_number(row, 3, diag.dropped_total() as f64)?;
        worksheet.write_string(row, 4, detail.join(", "))?;
    }

    worksheet.set_column_width(0, 16)?;
    worksheet.set_column_width(4, 40)?;
    Ok(())
}
