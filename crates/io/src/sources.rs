// Locating and loading the five source files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use callboard_recon::config::SourcePaths;
use callboard_recon::engine::SourceTables;
use callboard_recon::model::SourceKind;
use callboard_recon::{RawTable, ReconError};

/// Resolved path for every source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFiles {
    paths: BTreeMap<SourceKind, PathBuf>,
}

impl SourceFiles {
    /// Config paths, relative ones joined onto `base`.
    pub fn from_config(sources: &SourcePaths, base: &Path) -> Self {
        let paths = SourceKind::ALL
            .iter()
            .map(|&kind| (kind, base.join(sources.get(kind))))
            .collect();
        Self { paths }
    }

    /// Replace one source's path (command-line override).
    pub fn set(&mut self, kind: SourceKind, path: PathBuf) {
        self.paths.insert(kind, path);
    }

    pub fn get(&self, kind: SourceKind) -> &Path {
        // Every kind is inserted by `from_config`.
        self.paths.get(&kind).map(PathBuf::as_path).unwrap_or(Path::new(""))
    }

    /// The first source whose file does not exist.
    pub fn first_missing(&self) -> Option<(SourceKind, &Path)> {
        SourceKind::ALL
            .iter()
            .map(|&kind| (kind, self.get(kind)))
            .find(|(_, path)| !path.is_file())
    }
}

/// Load one source, by extension: spreadsheets through the Excel importer,
/// everything else as delimited text.
pub fn load_table(kind: SourceKind, path: &Path) -> Result<RawTable, ReconError> {
    let table = if crate::xlsx::is_spreadsheet(path) {
        crate::xlsx::import_table(kind, path)?
    } else {
        crate::csv::import_table(kind, path)?
    };
    log::info!("{kind}: {} row(s) from {}", table.len(), path.display());
    Ok(table)
}

/// Load every source. All paths are checked before any file is parsed, so a
/// missing file is reported without partial work.
pub fn load_sources(files: &SourceFiles) -> Result<SourceTables, ReconError> {
    if let Some((kind, path)) = files.first_missing() {
        return Err(ReconError::MissingSource {
            kind,
            path: path.display().to_string(),
        });
    }

    Ok(SourceTables {
        leads: load_table(SourceKind::Leads, files.get(SourceKind::Leads))?,
        contacts: load_table(SourceKind::Contacts, files.get(SourceKind::Contacts))?,
        dials: load_table(SourceKind::Dials, files.get(SourceKind::Dials))?,
        calling_hours: load_table(SourceKind::CallingHours, files.get(SourceKind::CallingHours))?,
        payroll: load_table(SourceKind::Payroll, files.get(SourceKind::Payroll))?,
    })
}
