//! `callboard-recon`: weekly per-agent call-center metrics engine.
//!
//! Pure engine crate: receives the five source files as parsed tables,
//! returns one reconciled row per agent. No CLI or IO dependencies.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod extract;
pub mod identity;
pub mod model;
pub mod payroll;
pub mod rounding;
pub mod table;

pub use config::{Config, OutputFormat};
pub use diagnostics::{Diagnostics, RecordIssue};
pub use engine::{run, SourceTables};
pub use error::{ReconError, ReconResult};
pub use model::{AgentKey, AgentMetrics, DateWindow, Report, ReportRow, SourceKind};
pub use table::RawTable;
