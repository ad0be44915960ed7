// callboard - weekly per-agent call-center metrics

mod check;
mod exit_codes;
mod run;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use callboard_recon::{OutputFormat, ReconError};
use exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG, EXIT_MISSING_COLUMN, EXIT_MISSING_SOURCE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "callboard")]
#[command(about = "Reconcile the weekly call-center exports into one per-agent metrics report")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the per-agent metrics report for a date window
    #[command(after_help = "\
Sources are read from --data-dir (default: the config file's directory, else ./data).
The leads export is filtered to the window; the other exports are taken as-is.

Examples:
  callboard run --start 2026-03-02 --end 2026-03-08
  callboard run --week 2026-03-04 --data-dir exports/week10
  callboard run --start 2026-03-02 --end 2026-03-08 --format csv --out reports/
  callboard run --week 2026-03-04 --payroll ~/Downloads/timecards.csv
  callboard run --week 2026-03-04 --json --quiet | jq '.rows[0]'")]
    Run {
        /// First day of the window (YYYY-MM-DD, inclusive)
        #[arg(long, requires = "end", required_unless_present = "week")]
        start: Option<String>,

        /// Last day of the window (YYYY-MM-DD, inclusive)
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Any day of a Monday-to-Sunday week to report on
        #[arg(long, conflicts_with_all = ["start", "end"])]
        week: Option<String>,

        /// TOML config file (default: ./callboard.toml when present)
        #[arg(long, short = 'c', env = "CALLBOARD_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding the source exports
        #[arg(long, short = 'd', env = "CALLBOARD_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Leads export (overrides the config path)
        #[arg(long)]
        leads: Option<PathBuf>,

        /// Warm contacts export
        #[arg(long)]
        contacts: Option<PathBuf>,

        /// Warm dials export
        #[arg(long)]
        dials: Option<PathBuf>,

        /// Agent daily summary (calling hours) export
        #[arg(long)]
        calling_hours: Option<PathBuf>,

        /// Payroll time-card summary
        #[arg(long)]
        payroll: Option<PathBuf>,

        /// Output file, or a directory to place the default-named report in
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Report format (default: from config, else xlsx)
        #[arg(long, short = 'f')]
        format: Option<Format>,

        /// Also print the report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Suppress the stderr summary and dropped-record warnings
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a config file and show what it resolves to
    #[command(after_help = "\
Examples:
  callboard check
  callboard check --config callboard.toml
  callboard check --data-dir exports/week10
  callboard check --print > callboard.toml")]
    Check {
        /// TOML config file (default: ./callboard.toml when present)
        #[arg(long, short = 'c', env = "CALLBOARD_CONFIG")]
        config: Option<PathBuf>,

        /// Also check that every source file exists in this directory
        #[arg(long, short = 'd', env = "CALLBOARD_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Print the fully resolved config as TOML
        #[arg(long)]
        print: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum Format {
    Xlsx,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Xlsx => OutputFormat::Xlsx,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  callboard-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  callboard-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// stderr logging. `RUST_LOG` wins over the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Some(Commands::Run { quiet: true, .. }));
    init_logging(cli.verbose, quiet);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: callboard <command> [options]");
            eprintln!("       callboard --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            start,
            end,
            week,
            config,
            data_dir,
            leads,
            contacts,
            dials,
            calling_hours,
            payroll,
            out,
            format,
            json,
            quiet,
        }) => run::cmd_run(run::RunArgs {
            start,
            end,
            week,
            config,
            data_dir,
            overrides: run::SourceOverrides {
                leads,
                contacts,
                dials,
                calling_hours,
                payroll,
            },
            out,
            format: format.map(OutputFormat::from),
            json,
            quiet,
        }),
        Some(Commands::Check { config, data_dir, print }) => check::cmd_check(config, data_dir, print),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match (&err, code) {
            (_, EXIT_MISSING_SOURCE) => {
                Some("pass --data-dir, a per-source flag like --payroll, or set [sources] in the config".to_string())
            }
            (ReconError::MissingColumn { kind, .. }, EXIT_MISSING_COLUMN) => {
                Some(format!("if the export renamed it, set the name under [columns.{kind}] in the config"))
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
