use std::path::{Path, PathBuf};

use unicode_width::UnicodeWidthStr;

use callboard_recon::Config;

use crate::CliError;

/// Config file picked up from the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "callboard.toml";

/// Source directory when neither `--data-dir` nor a config file gives one.
pub(crate) const DEFAULT_DATA_DIR: &str = "data";

/// Load the config: the given file, else `./callboard.toml` when present,
/// else built-in defaults. Returns the path actually read.
pub(crate) fn load_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>), CliError> {
    let path = match path {
        Some(p) => {
            if !p.is_file() {
                return Err(CliError::args(format!("config file not found: {}", p.display())));
            }
            p.to_path_buf()
        }
        None => {
            let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                log::debug!("no {DEFAULT_CONFIG_FILE}, using built-in defaults");
                return Ok((Config::default(), None));
            }
            candidate
        }
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
    let config = Config::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("fix {} or run `callboard check --print` for a template", path.display()))
    })?;
    log::debug!("loaded config from {}", path.display());
    Ok((config, Some(path)))
}

/// Directory that relative source paths resolve against: `--data-dir`, else
/// the config file's directory, else `./data`.
pub(crate) fn source_base(data_dir: Option<&Path>, config_path: Option<&Path>) -> PathBuf {
    if let Some(dir) = data_dir {
        return dir.to_path_buf();
    }
    match config_path.and_then(|p| p.parent()) {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

/// Pad a string to `width` display columns. Longer strings are left intact.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Fixed-precision number, or `-` when absent.
pub(crate) fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_right_uses_display_width() {
        assert_eq!(pad_right("jdoe", 6), "jdoe  ");
        assert_eq!(pad_right("José", 6), "José  ");
        assert_eq!(pad_right("calling_hours", 4), "calling_hours");
    }

    #[test]
    fn source_base_precedence() {
        assert_eq!(
            source_base(Some(Path::new("exports")), Some(Path::new("cfg/callboard.toml"))),
            PathBuf::from("exports")
        );
        assert_eq!(
            source_base(None, Some(Path::new("cfg/callboard.toml"))),
            PathBuf::from("cfg")
        );
        assert_eq!(source_base(None, Some(Path::new("callboard.toml"))), PathBuf::from("."));
        assert_eq!(source_base(None, None), PathBuf::from("data"));
    }

    #[test]
    fn fmt_opt_blank_is_dash() {
        assert_eq!(fmt_opt(Some(2.0), 2), "2.00");
        assert_eq!(fmt_opt(None, 2), "-");
    }

    #[test]
    fn explicit_missing_config_is_usage_error() {
        let err = load_config(Some(Path::new("/nonexistent/callboard.toml"))).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }
}
