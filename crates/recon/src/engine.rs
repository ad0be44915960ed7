use std::collections::BTreeMap;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::ReconError;
use crate::extract::{extract_calling_hours, extract_contacts, extract_dials, extract_sets};
use crate::identity::{IdentityNormalizer, Roster};
use crate::model::{ratio, AgentKey, AgentMetrics, DateWindow, Report, ReportMeta, ReportRow, SourceKind};
use crate::payroll::extract_payroll;
use crate::rounding::RoundingTiers;
use crate::table::{AgentTable, RawTable};

/// The five parsed source files.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub leads: RawTable,
    pub contacts: RawTable,
    pub dials: RawTable,
    pub calling_hours: RawTable,
    pub payroll: RawTable,
}

impl SourceTables {
    pub fn get(&self, kind: SourceKind) -> &RawTable {
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
// Stages
// ---------------------------------------------------------------------------

/// Pipeline stages. Each extracts one source and merges it onto the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sets,
    Contacts,
    Dials,
    CallingHours,
    Payroll,
}

impl Stage {
    /// Payroll must follow dials: its names resolve through the dials roster.
    pub const ORDER: [Stage; 5] = [
        Self::Sets,
        Self::Contacts,
        Self::Dials,
        Self::CallingHours,
        Self::Payroll,
    ];

    pub fn source(&self) -> SourceKind {
        match self {
            Self::Sets => SourceKind::Leads,
            Self::Contacts => SourceKind::Contacts,
            Self::Dials => SourceKind::Dials,
            Self::CallingHours => SourceKind::CallingHours,
            Self::Payroll => SourceKind::Payroll,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sets => write!(f, "sets"),
            Self::Contacts => write!(f, "contacts"),
            Self::Dials => write!(f, "dials"),
            Self::CallingHours => write!(f, "calling_hours"),
            Self::Payroll => write!(f, "payroll"),
        }
    }
}

/// Read-only inputs shared by every stage.
struct RunContext<'a> {
    config: &'a Config,
    window: &'a DateWindow,
    sources: &'a SourceTables,
    identity: IdentityNormalizer,
    tiers: RoundingTiers,
}

/// What flows from one stage to the next.
#[derive(Debug, Default)]
struct PipelineState {
    table: AgentTable,
    roster: Roster,
    diagnostics: Diagnostics,
}

impl Stage {
    fn apply(self, state: PipelineState, ctx: &RunContext<'_>) -> Result<PipelineState, ReconError> {
        let PipelineState {
            table,
            mut roster,
            mut diagnostics,
        } = state;
        let source = ctx.sources.get(self.source());
        let columns = &ctx.config.columns;

        let (column, table) = match self {
            Self::Sets => {
                let col = extract_sets(source, &columns.leads, ctx.window, &ctx.identity)?;
                let table = table.merge(&col, |m, v| m.sets = v as u32);
                (col, table)
            }
            Self::Contacts => {
                let col = extract_contacts(source, &columns.contacts, &ctx.identity)?;
                let table = table.merge(&col, |m, v| m.contacts = Some(v));
                (col, table)
            }
            Self::Dials => {
                let extract = extract_dials(source, &columns.dials, &ctx.identity)?;
                let table = table
                    .merge(&extract.dials, |m, v| m.dials = Some(v))
                    .with_names(&extract.names);
                roster = extract.roster;
                (extract.dials, table)
            }
            Self::CallingHours => {
                let col = extract_calling_hours(source, &columns.calling_hours, &ctx.identity)?;
                let tiers = &ctx.tiers;
                let table = table.merge(&col, |m, v| {
                    m.calling_hours = Some(v);
                    m.calling_hours_rounded = Some(tiers.round(v));
                });
                (col, table)
            }
            Self::Payroll => {
                let col = extract_payroll(source, &ctx.config.payroll, &ctx.identity, &roster)?;
                let table = table.merge(&col, |m, v| m.payroll_hours = Some(v));
                (col, table)
            }
        };

        log::debug!(
            "stage {self}: {} agent(s) from source, {} in table",
            column.values.len(),
            table.len()
        );
        diagnostics.insert(column.kind, column.diagnostics);

        Ok(PipelineState {
            table,
            roster,
            diagnostics,
        })
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the whole pipeline. Fails on the first structural error; per-record
/// problems are counted in the report's diagnostics.
pub fn run(config: &Config, window: &DateWindow, sources: &SourceTables) -> Result<Report, ReconError> {
    config.validate()?;
    let ctx = RunContext {
        config,
        window,
        sources,
        identity: IdentityNormalizer::new(&config.identity),
        tiers: config.rounding.build()?,
    };

    let state = Stage::ORDER
        .iter()
        .try_fold(PipelineState::default(), |state, stage| stage.apply(state, &ctx))?;

    let report = finalize(state.table, state.diagnostics, window);
    log::info!(
        "{} agent(s), {} set(s), {} dropped record(s)",
        report.rows.len(),
        report.totals.sets,
        report.diagnostics.dropped_total()
    );
    Ok(report)
}

/// Sort rows by sets (descending, then agent) and compute the totals row.
pub fn finalize(table: AgentTable, diagnostics: Diagnostics, window: &DateWindow) -> Report {
    let rows_by_agent: BTreeMap<AgentKey, AgentMetrics> = table.into_rows();
    let totals = totals(rows_by_agent.values());

    let mut rows: Vec<ReportRow> = rows_by_agent
        .into_iter()
        .map(|(agent, metrics)| ReportRow { agent, metrics })
        .collect();
    rows.sort_by(|a, b| {
        b.metrics
            .sets
            .cmp(&a.metrics.sets)
            .then_with(|| a.agent.cmp(&b.agent))
    });

    Report {
        meta: ReportMeta {
            start: window.start,
            end: window.end,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        rows,
        totals,
        diagnostics,
    }
}

/// Column sums. A metric no agent has stays `None`.
///
/// Each ratio is recomputed from its numerator and denominator summed over
/// only the agents that have both, so a leads-only agent's sets do not
/// inflate sets/dial and calling hours without a payroll row do not inflate
/// calling/payroll.
fn totals<'a>(rows: impl Iterator<Item = &'a AgentMetrics>) -> AgentMetrics {
    fn add(acc: Option<f64>, v: Option<f64>) -> Option<f64> {
        match (acc, v) {
            (Some(a), Some(b)) => Some(a + b),
            (None, v) => v,
            (a, None) => a,
        }
    }

    let mut t = AgentMetrics {
        name: Some("Total".into()),
        ..Default::default()
    };
    let mut per_dial = PairedSum::default();
    let mut per_contact = PairedSum::default();
    let mut per_hour = PairedSum::default();
    let mut calling_payroll = PairedSum::default();

    for m in rows {
        let sets = Some(f64::from(m.sets));
        t.sets += m.sets;
        t.contacts = add(t.contacts, m.contacts);
        t.dials = add(t.dials, m.dials);
        t.calling_hours = add(t.calling_hours, m.calling_hours);
        t.calling_hours_rounded = add(t.calling_hours_rounded, m.calling_hours_rounded);
        t.payroll_hours = add(t.payroll_hours, m.payroll_hours);

        per_dial.add(sets, m.dials);
        per_contact.add(sets, m.contacts);
        per_hour.add(sets, m.calling_hours_rounded);
        calling_payroll.add(m.calling_hours, m.payroll_hours);
    }

    t.sets_per_dial = per_dial.ratio();
    t.sets_per_contact = per_contact.ratio();
    t.sets_per_hour = per_hour.ratio();
    t.calling_payroll_pct = calling_payroll.ratio().map(|r| r * 100.0);
    t
}

/// Numerator and denominator summed over rows that have both.
#[derive(Debug, Default)]
struct PairedSum {
    numerator: Option<f64>,
    denominator: Option<f64>,
}

impl PairedSum {
    fn add(&mut self, numerator: Option<f64>, denominator: Option<f64>) {
        if let (Some(n), Some(d)) = (numerator, denominator) {
            self.numerator = Some(self.numerator.unwrap_or(0.0) + n);
            self.denominator = Some(self.denominator.unwrap_or(0.0) + d);
        }
    }

    fn ratio(&self) -> Option<f64> {
        ratio(self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordIssue;

    fn csv(kind: SourceKind, content: &str) -> RawTable {
        RawTable::from_csv(kind, content, b',', kind.has_headers()).unwrap()
    }

    fn sources() -> SourceTables {
        SourceTables {
            leads: csv(
                SourceKind::Leads,
                "\
Date/Time,WT/SA Bonus,BCI Caller
2026-03-02 09:00:00,$25.00,jdoe
2026-03-03 09:00:00,$0.00,jdoe
2026-03-04 09:00:00,$25.00,jdoe
2026-03-04 10:00:00,$25.00,lonely
",
            ),
            contacts: csv(
                SourceKind::Contacts,
                "\
AGENT,Mon,Tue
jdoe@domain.com,3,1
asmith@domain.com,2,2
",
            ),
            dials: csv(
                SourceKind::Dials,
                "\
AGENT,AGENT GROUP,AGENT FIRST NAME,AGENT LAST NAME,A,B,C
jdoe@domain.com,Warm,John,Doe,10,5,0
asmith@domain.com,Warm,Allison,Smith,0,0,0
",
            ),
            calling_hours: csv(
                SourceKind::CallingHours,
                "\
AGENT,On Call / AGENT STATE TIME,Ready / AGENT STATE TIME
jdoe@domain.com,1:15:00,0:45:00
asmith@domain.com,0:10:00,0:00:00
",
            ),
            payroll: csv(
                SourceKind::Payroll,
                "\
ID: 1,\"Doe, John\",,,
,,,Total,38.5
",
            ),
        }
    }

    fn window() -> DateWindow {
        DateWindow::parse("2026-03-02", "2026-03-08").unwrap()
    }

    #[test]
    fn stage_order_puts_payroll_after_dials() {
        let pos = |s: Stage| Stage::ORDER.iter().position(|x| *x == s).unwrap();
        assert!(pos(Stage::Dials) < pos(Stage::Payroll));
        assert_eq!(Stage::CallingHours.source(), SourceKind::CallingHours);
    }

    #[test]
    fn run_end_to_end() {
        let report = run(&Config::default(), &window(), &sources()).unwrap();

        let jdoe = report.row("jdoe").unwrap();
        assert_eq!(jdoe.name.as_deref(), Some("John D"));
        assert_eq!(jdoe.sets, 2);
        assert_eq!(jdoe.contacts, Some(4.0));
        assert_eq!(jdoe.dials, Some(15.0));
        assert!((jdoe.sets_per_dial.unwrap() - 0.1333).abs() < 1e-3);
        assert_eq!(jdoe.sets_per_contact, Some(0.5));
        assert_eq!(jdoe.calling_hours, Some(2.0));
        assert_eq!(jdoe.calling_hours_rounded, Some(2.0));
        assert_eq!(jdoe.sets_per_hour, Some(1.0));
        assert_eq!(jdoe.payroll_hours, Some(38.5));

        // Zero dials guard, no payroll row.
        let asmith = report.row("asmith").unwrap();
        assert_eq!(asmith.sets, 0);
        assert_eq!(asmith.dials, Some(0.0));
        assert_eq!(asmith.sets_per_dial, None);
        assert_eq!(asmith.calling_hours_rounded, Some(0.25));
        assert_eq!(asmith.payroll_hours, None);

        // Leads-only agent is kept, not dropped.
        let lonely = report.row("lonely").unwrap();
        assert_eq!(lonely.sets, 1);
        assert_eq!(lonely.dials, None);
        assert_eq!(lonely.payroll_hours, None);

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].agent.as_str(), "jdoe");
        assert_eq!(report.rows[1].agent.as_str(), "lonely");
        assert_eq!(report.rows[2].agent.as_str(), "asmith");
    }

    #[test]
    fn totals_row() {
        let report = run(&Config::default(), &window(), &sources()).unwrap();
        let t = &report.totals;
        assert_eq!(t.name.as_deref(), Some("Total"));
        assert_eq!(t.sets, 3);
        assert_eq!(t.contacts, Some(8.0));
        assert_eq!(t.dials, Some(15.0));
        assert_eq!(t.calling_hours_rounded, Some(2.25));
        assert_eq!(t.payroll_hours, Some(38.5));
    }

    #[test]
    fn totals_ratios_pair_numerator_with_denominator() {
        let report = run(&Config::default(), &window(), &sources()).unwrap();
        let t = &report.totals;
        // lonely's set has no dials or contacts behind it.
        assert_eq!(t.sets_per_dial, Some(2.0 / 15.0));
        assert_eq!(t.sets_per_contact, Some(0.25));
        assert_eq!(t.sets_per_hour, Some(2.0 / 2.25));
        // asmith's calling hours have no payroll row.
        let pct = t.calling_payroll_pct.unwrap();
        assert!((pct - 2.0 / 38.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_set_leads_agent_gets_a_row() {
        let mut s = sources();
        s.leads = csv(
            SourceKind::Leads,
            "\
Date/Time,WT/SA Bonus,BCI Caller
2026-03-02 09:00:00,$25.00,jdoe
2026-03-03 09:00:00,$0.00,zero
",
        );
        let report = run(&Config::default(), &window(), &s).unwrap();
        let zero = report.row("zero").unwrap();
        assert_eq!(zero.sets, 0);
        assert_eq!(zero.dials, None);
        assert_eq!(report.rows.last().unwrap().agent.as_str(), "zero");
        assert_eq!(report.totals.sets, 1);
    }

    #[test]
    fn missing_column_aborts() {
        let mut s = sources();
        s.calling_hours = csv(
            SourceKind::CallingHours,
            "AGENT,On Call / AGENT STATE TIME\njdoe,1:00:00\n",
        );
        let err = run(&Config::default(), &window(), &s).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { kind: SourceKind::CallingHours, .. }
        ));
    }

    #[test]
    fn diagnostics_cover_every_source() {
        let mut s = sources();
        s.payroll = csv(
            SourceKind::Payroll,
            "ID: 1,\"Doe, John\",,,\n,,,Total,38.5\nID: 2,\"Nobody, Zed\",,,\n,,,Total,10\n",
        );
        let report = run(&Config::default(), &window(), &s).unwrap();
        assert_eq!(report.diagnostics.sources.len(), 5);
        let payroll = report.diagnostics.get(SourceKind::Payroll).unwrap();
        assert_eq!(payroll.count(RecordIssue::UnresolvedName), 1);
        assert_eq!(report.diagnostics.dropped_total(), 1);
    }

    #[test]
    fn display_override_routes_payroll_name() {
        let mut config = Config::default();
        config
            .identity
            .display_names
            .insert("Zed N".into(), "asmith".into());
        let mut s = sources();
        s.payroll = csv(
            SourceKind::Payroll,
            "ID: 2,\"Nobody, Zed\",,,\n,,,Total,10\n",
        );
        let report = run(&config, &window(), &s).unwrap();
        assert_eq!(report.row("asmith").unwrap().payroll_hours, Some(10.0));
        assert!(report.diagnostics.is_clean());
    }
}
