// spcov - Sponsored Products target coverage checks (headless)

mod chart;
mod coverage;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use exit_codes::{coverage_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use spcov_coverage::config::OutputFormat;
use spcov_coverage::CoverageError;

#[derive(Parser)]
#[command(name = "spcov")]
#[command(about = "Classify advertising targets and report coverage gaps")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check desired targets against a bulk targets export
    #[command(after_help = "\
Examples:
  spcov run weekly.coverage.toml
  spcov run weekly.coverage.toml --input bmt.xlsx --targets targets.txt
  spcov run weekly.coverage.toml --bids bulk.xlsx --format csv --out-dir reports
  spcov run weekly.coverage.toml --json --charts
  spcov run weekly.coverage.toml --fail-on-missing")]
    Run {
        /// Path to the .coverage.toml config file
        config: PathBuf,

        /// Targets table (overrides input.file)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Targets text file merged with [targets] (overrides targets_file)
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Bulk sheet with bid adjustments (overrides bids.file)
        #[arg(long)]
        bids: Option<PathBuf>,

        /// Directory for covered/missing tables (overrides output.dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Table format (overrides output.format)
        #[arg(long)]
        format: Option<TableFormatArg>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file (overrides output.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Draw per-identifier coverage charts on stderr
        #[arg(long)]
        charts: bool,

        /// Exit 62 when any desired target is missing
        #[arg(long)]
        fail_on_missing: bool,
    },

    /// Validate a coverage config (and its targets file) without running
    #[command(after_help = "\
Examples:
  spcov validate weekly.coverage.toml")]
    Validate {
        /// Path to the .coverage.toml config file
        config: PathBuf,
    },

    /// Label every row of a targets table with match type and funnel segment
    #[command(after_help = "\
Examples:
  spcov classify bmt.csv
  spcov classify bmt.xlsx --sheet Targets -o classified.xlsx
  spcov classify bmt.csv --config weekly.coverage.toml --json")]
    Classify {
        /// Targets table (csv, tsv, xlsx, xls, xlsb, ods)
        input: PathBuf,

        /// Workbook sheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Take columns and match-type prefixes from a config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output table format when -o has no extension; stdout is always csv
        #[arg(long)]
        format: Option<TableFormatArg>,

        /// Write the classified table to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print classified rows and baseline as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TableFormatArg {
    Xlsx,
    Csv,
}

impl From<TableFormatArg> for OutputFormat {
    fn from(arg: TableFormatArg) -> Self {
        match arg {
            TableFormatArg::Xlsx => OutputFormat::Xlsx,
            TableFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  spcov-coverage ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  spcov-coverage ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Diagnostics go to stderr so stdout stays clean for `--json` and csv.
/// `SPCOV_LOG` takes precedence over `RUST_LOG`.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("SPCOV_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            targets,
            bids,
            out_dir,
            format,
            json,
            output,
            charts,
            fail_on_missing,
        } => coverage::cmd_run(coverage::RunOptions {
            config,
            input,
            targets,
            bids,
            out_dir,
            format: format.map(OutputFormat::from),
            json,
            output,
            charts,
            fail_on_missing,
        }),
        Commands::Validate { config } => coverage::cmd_validate(config),
        Commands::Classify { input, sheet, config, format, output, json } => {
            coverage::cmd_classify(input, sheet, config, format.map(OutputFormat::from), output, json)
        }
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
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<CoverageError> for CliError {
    fn from(err: CoverageError) -> Self {
        let code = coverage_exit_code(&err);
        let hint = match &err {
            CoverageError::MissingColumn { table, .. } if table == "targets" => {
                Some("map the column under [input.columns] in the config".to_string())
            }
            CoverageError::MissingColumn { .. } => {
                Some("map the column under [bids.columns] in the config".to_string())
            }
            CoverageError::TargetsParse { .. } => {
                Some("start each group with an [IDENTIFIER] header line".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
