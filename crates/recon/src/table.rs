use std::collections::BTreeMap;

use crate::diagnostics::SourceDiagnostics;
use crate::error::ReconError;
use crate::model::{AgentKey, AgentMetrics, SourceKind};

// ---------------------------------------------------------------------------
// Raw source table
// ---------------------------------------------------------------------------

/// One source file as strings: an optional header row plus data rows.
///
/// Rows may be ragged; missing trailing cells read as empty.
#[derive(Debug, Clone)]
pub struct RawTable {
    kind: SourceKind,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text. Header cells are trimmed and stripped of a UTF-8 BOM.
    pub fn from_csv(
        kind: SourceKind,
        content: &str,
        delimiter: u8,
        has_headers: bool,
    ) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = if has_headers {
            reader
                .headers()
                .map_err(|e| ReconError::Csv { kind, message: e.to_string() })?
                .iter()
                .map(clean_header)
                .collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Csv { kind, message: e.to_string() })?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self { kind, headers, rows })
    }

    /// Build from rows already split into cells, e.g. a spreadsheet range.
    pub fn from_rows(kind: SourceKind, mut rows: Vec<Vec<String>>, has_headers: bool) -> Self {
        let headers = if has_headers && !rows.is_empty() {
            rows.remove(0).iter().map(|h| clean_header(h)).collect()
        } else {
            Vec::new()
        };
        Self { kind, headers, rows }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column, or `MissingColumn`.
    pub fn column_index(&self, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h == name.trim())
            .ok_or_else(|| ReconError::MissingColumn {
                kind: self.kind,
                column: name.into(),
            })
    }

    /// Like [`column_index`](Self::column_index) but absence is not an error.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name.trim())
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Spreadsheet-style line number of a data row (header counts as line 1).
    pub fn line_number(&self, row: usize) -> usize {
        if self.headers.is_empty() {
            row + 1
        } else {
            row + 2
        }
    }
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

// ---------------------------------------------------------------------------
// Extractor output
// ---------------------------------------------------------------------------

/// One metric per canonical agent, as produced by a single source.
#[derive(Debug, Clone)]
pub struct SourceColumn {
    pub kind: SourceKind,
    pub values: BTreeMap<AgentKey, f64>,
    pub diagnostics: SourceDiagnostics,
}

impl SourceColumn {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
            diagnostics: SourceDiagnostics::default(),
        }
    }

    /// Make sure the agent has an entry, at zero if it has none yet.
    pub fn register(&mut self, agent: AgentKey) {
        self.values.entry(agent).or_insert(0.0);
    }

    /// Add `amount` to the agent's running total.
    pub fn accumulate(&mut self, agent: AgentKey, amount: f64) {
        *self.values.entry(agent).or_insert(0.0) += amount;
    }

    pub fn get(&self, agent: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| k.as_str() == agent)
            .map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// Accumulated table
// ---------------------------------------------------------------------------

/// The running per-agent table. Each merge consumes it and returns the next
/// one; keys are the union of every source merged so far.
#[derive(Debug, Clone, Default)]
pub struct AgentTable {
    rows: BTreeMap<AgentKey, AgentMetrics>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer-join a source column onto the table, then re-derive ratios for
    /// the touched rows.
    pub fn merge<F>(mut self, column: &SourceColumn, apply: F) -> Self
    where
        F: Fn(&mut AgentMetrics, f64),
    {
        for (agent, value) in &column.values {
            let metrics = self.rows.entry(agent.clone()).or_default();
            apply(metrics, *value);
            metrics.derive();
        }
        self
    }

    /// Attach display names to agents already in the table.
    pub fn with_names(mut self, names: &BTreeMap<AgentKey, String>) -> Self {
        for (agent, metrics) in self.rows.iter_mut() {
            if metrics.name.is_none() {
                metrics.name = names.get(agent).cloned();
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, agent: &str) -> Option<&AgentMetrics> {
        self.rows
            .iter()
            .find(|(k, _)| k.as_str() == agent)
            .map(|(_, m)| m)
    }

    pub fn keys(&self) -> impl Iterator<Item = &AgentKey> {
        self.rows.keys()
    }

    pub fn into_rows(self) -> BTreeMap<AgentKey, AgentMetrics> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(kind: SourceKind, values: &[(&str, f64)]) -> SourceColumn {
        let mut col = SourceColumn::new(kind);
        for (agent, v) in values {
            col.accumulate(AgentKey::new((*agent).into()), *v);
        }
        col
    }

    #[test]
    fn raw_table_reads_headers_and_ragged_rows() {
        let csv = "\u{feff}AGENT , Calls\njdoe@x.com,4\nasmith@x.com\n";
        let t = RawTable::from_csv(SourceKind::Contacts, csv, b',', true).unwrap();
        assert_eq!(t.headers(), &["AGENT".to_string(), "Calls".to_string()]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(1, 1), "");
        assert_eq!(t.column_index("Calls").unwrap(), 1);
        assert_eq!(t.line_number(0), 2);
    }

    #[test]
    fn raw_table_missing_column_is_named() {
        let t = RawTable::from_csv(SourceKind::Dials, "AGENT\njdoe\n", b',', true).unwrap();
        let err = t.column_index("AGENT FIRST NAME").unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { kind: SourceKind::Dials, ref column } if column == "AGENT FIRST NAME"
        ));
    }

    #[test]
    fn headerless_table_keeps_first_line() {
        let t = RawTable::from_csv(SourceKind::Payroll, "ID: 7,\"Doe, John\"\n,,,,38.5\n", b',', false)
            .unwrap();
        assert!(t.headers().is_empty());
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 1), "Doe, John");
        assert_eq!(t.line_number(0), 1);
    }

    #[test]
    fn from_rows_splits_header() {
        let rows = vec![
            vec![" AGENT".to_string(), "Calls".to_string()],
            vec!["jdoe".to_string(), "3".to_string()],
        ];
        let t = RawTable::from_rows(SourceKind::Contacts, rows, true);
        assert_eq!(t.column_index("AGENT").unwrap(), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.cell(0, 1), "3");
    }

    #[test]
    fn accumulate_sums_per_agent() {
        let col = column(SourceKind::Dials, &[("jdoe", 10.0), ("jdoe", 5.0), ("asmith", 1.0)]);
        assert_eq!(col.get("jdoe"), Some(15.0));
        assert_eq!(col.values.len(), 2);
    }

    #[test]
    fn merge_is_an_outer_join() {
        let sets = column(SourceKind::Leads, &[("jdoe", 2.0), ("asmith", 1.0)]);
        let dials = column(SourceKind::Dials, &[("jdoe", 20.0), ("bkim", 40.0)]);

        let table = AgentTable::new()
            .merge(&sets, |m, v| m.sets = v as u32)
            .merge(&dials, |m, v| m.dials = Some(v));

        assert_eq!(table.len(), 3);
        let keys: Vec<&str> = table.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["asmith", "bkim", "jdoe"]);

        assert_eq!(table.get("jdoe").unwrap().sets_per_dial, Some(0.1));
        assert_eq!(table.get("asmith").unwrap().dials, None);
        assert_eq!(table.get("asmith").unwrap().sets_per_dial, None);
        assert_eq!(table.get("bkim").unwrap().sets, 0);
        assert_eq!(table.get("bkim").unwrap().sets_per_dial, Some(0.0));
    }

    #[test]
    fn merge_order_does_not_change_ratios() {
        let sets = column(SourceKind::Leads, &[("jdoe", 3.0)]);
        let dials = column(SourceKind::Dials, &[("jdoe", 12.0)]);

        let a = AgentTable::new()
            .merge(&sets, |m, v| m.sets = v as u32)
            .merge(&dials, |m, v| m.dials = Some(v));
        let b = AgentTable::new()
            .merge(&dials, |m, v| m.dials = Some(v))
            .merge(&sets, |m, v| m.sets = v as u32);

        assert_eq!(a.get("jdoe"), b.get("jdoe"));
        assert_eq!(a.get("jdoe").unwrap().sets_per_dial, Some(0.25));
    }

    #[test]
    fn names_fill_only_existing_rows() {
        let dials = column(SourceKind::Dials, &[("jdoe", 1.0)]);
        let names = BTreeMap::from([
            (AgentKey::new("jdoe".into()), "John D".to_string()),
            (AgentKey::new("ghost".into()), "Ghost G".to_string()),
        ]);
        let table = AgentTable::new().merge(&dials, |m, v| m.dials = Some(v)).with_names(&names);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("jdoe").unwrap().name.as_deref(), Some("John D"));
    }
}
