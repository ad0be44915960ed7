//! `callboard check`: validate a config and show what it resolves to.

use std::path::PathBuf;

use callboard_io::SourceFiles;
use callboard_recon::config::Config;
use callboard_recon::{ReconError, SourceKind};

use crate::util::{load_config, pad_right, source_base, DEFAULT_CONFIG_FILE};
use crate::CliError;

pub(crate) fn cmd_check(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    print: bool,
) -> Result<(), CliError> {
    let (config, config_path) = load_config(config.as_deref())?;

    if print {
        let text = toml::to_string(&config)
            .map_err(|e| CliError::config(format!("cannot render config: {e}")))?;
        print!("{text}");
        return Ok(());
    }

    match &config_path {
        Some(p) => println!("config: {} (ok)", p.display()),
        None => println!("config: built-in defaults (no {DEFAULT_CONFIG_FILE})"),
    }
    print_config(&config);

    if let Some(dir) = data_dir {
        let base = source_base(Some(dir.as_path()), config_path.as_deref());
        let files = SourceFiles::from_config(&config.sources, &base);
        println!();
        println!("sources in {}:", base.display());
        for kind in SourceKind::ALL {
            let path = files.get(kind);
            let status = if path.is_file() { "ok" } else { "missing" };
            println!("  {} {} ({status})", pad_right(kind.as_str(), 14), path.display());
        }
        if let Some((kind, path)) = files.first_missing() {
            return Err(CliError::from(ReconError::MissingSource {
                kind,
                path: path.display().to_string(),
            }));
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    let id = &config.identity;
    let pairs = |map: &std::collections::BTreeMap<String, String>| -> String {
        if map.is_empty() {
            "(none)".to_string()
        } else {
            map.iter()
                .map(|(k, v)| format!("{k} -> {v}"))
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    println!("identity overrides:");
    println!("  {} {}", pad_right("usernames", 14), pairs(&id.usernames));
    println!("  {} {}", pad_right("first_names", 14), pairs(&id.first_names));
    println!("  {} {}", pad_right("display_names", 14), pairs(&id.display_names));

    println!("rounding tiers:");
    let mut from = 0;
    for tier in &config.rounding.tiers {
        println!(
            "  {}  +{:.2}",
            pad_right(&format!("{from}-{}", tier.max_minute), 6),
            tier.quarter
        );
        from = tier.max_minute + 1;
    }

    let p = &config.payroll;
    println!(
        "payroll: marker '{}' in column {}, name column {}, hours column {}",
        p.marker, p.marker_column, p.name_column, p.hours_column
    );
    println!(
        "output: {}_<start>_<end>.{}",
        config.output.prefix,
        config.output.format.extension()
    );
}
