// Source loading and report export

pub mod csv;
pub mod json;
pub mod report;
pub mod sources;
pub mod xlsx;

pub use report::{report_file_name, resolve_output_path, write_report};
pub use sources::{load_sources, SourceFiles};
