//! `spcov run`, `spcov validate` and `spcov classify`.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use spcov_coverage::baseline::WordCountBaseline;
use spcov_coverage::config::{BidConfig, OutputFormat};
use spcov_coverage::engine::load_dataset;
use spcov_coverage::model::{ClassifiedDataset, FunnelSegment, MatchTypeCounts, TargetRecord};
use spcov_coverage::output::{classified_table, covered_table, missing_table};
use spcov_coverage::{CoverageConfig, CoverageInput, CoverageReport, Table, TargetPlan};

use crate::chart::render_chart;
use crate::exit_codes::EXIT_COVERAGE_MISSING;
use crate::CliError;

pub const COVERED_FILE_STEM: &str = "covered_targets";
pub const MISSING_FILE_STEM: &str = "missing_targets";

/// Flags of `spcov run`; every `Option` overrides the config value.
pub struct RunOptions {
    pub config: PathBuf,
    pub input: Option<PathBuf>,
    pub targets: Option<PathBuf>,
    pub bids: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub charts: bool,
    pub fail_on_missing: bool,
}

// ============================================================================
// Config + plan
// ============================================================================

fn load_config(config_path: &Path) -> Result<CoverageConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    Ok(CoverageConfig::from_toml(&config_str)?)
}

/// Relative config paths resolve against the config file's directory.
fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_targets_file(path: &Path) -> Result<TargetPlan, CliError> {
    let text = spcov_io::csv::read_file_as_utf8(path)
        .map_err(|e| CliError::io(format!("cannot read targets file: {e}")))?;
    TargetPlan::from_text(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("check {}", path.display()))
    })
}

/// `[targets]` from the config followed by the targets file, deduplicated.
fn build_plan(config: &CoverageConfig, base_dir: &Path, targets: Option<PathBuf>) -> Result<TargetPlan, CliError> {
    let plan = TargetPlan::from_map(&config.targets);
    let targets_path = targets.or_else(|| config.targets_file.as_deref().map(|p| resolve(base_dir, p)));
    match targets_path {
        Some(path) => Ok(plan.merged(&load_targets_file(&path)?)),
        None => Ok(plan),
    }
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let config = load_config(&opts.config)?;
    let base_dir = config_dir(&opts.config);

    let plan = build_plan(&config, base_dir, opts.targets)?;
    if plan.is_empty() {
        return Err(CliError::args("no desired targets to check")
            .with_hint("add a [targets] table to the config or pass --targets FILE"));
    }

    let input_path = opts
        .input
        .or_else(|| config.input.file.as_deref().map(|p| resolve(base_dir, p)))
        .ok_or_else(|| {
            CliError::args("no targets table to read")
                .with_hint("set input.file in the config or pass --input FILE")
        })?;
    let targets_table = spcov_io::read_table(&input_path, config.input.sheet.as_deref())
        .map_err(|e| CliError::io(format!("cannot read input: {e}")))?;

    let bids_path = opts.bids.or_else(|| {
        config
            .bids
            .as_ref()
            .and_then(|b| b.file.as_deref())
            .map(|p| resolve(base_dir, p))
    });
    let bids_table = match bids_path {
        Some(path) => {
            let default_bids = BidConfig::default();
            let bid_config = config.bids.as_ref().unwrap_or(&default_bids);
            let table = spcov_io::read_tables_matching(&path, &bid_config.sheet_contains)
                .map_err(|e| CliError::io(format!("cannot read bids: {e}")))?;
            Some(table)
        }
        None => None,
    };

    info!(
        config = %config.name,
        input = %input_path.display(),
        desired_pairs = plan.len(),
        bids = bids_table.is_some(),
        "running coverage check"
    );

    let input = CoverageInput { targets: targets_table, bids: bids_table };
    let report = spcov_coverage::run(&config, &plan, &input)?;

    // Tables
    let out_dir = opts.out_dir.unwrap_or_else(|| resolve(base_dir, &config.output.dir));
    let format = opts.format.unwrap_or(config.output.format);
    let written = write_report_tables(&report, &config, &out_dir, format)?;
    for path in &written {
        eprintln!("wrote {}", path.display());
    }

    // JSON
    let json_path = opts
        .output
        .or_else(|| config.output.json.as_deref().map(|p| resolve(base_dir, p)));
    if opts.json || json_path.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = json_path {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        if opts.json {
            println!("{json_str}");
        }
    }

    print_run_summary(&report);

    if opts.charts {
        for outcome in &report.charts {
            eprint!("{}", render_chart(outcome));
        }
    }

    let fail_on_missing = opts.fail_on_missing || config.fail_on_missing;
    if fail_on_missing && !report.missing.is_empty() {
        return Err(CliError::new(
            EXIT_COVERAGE_MISSING,
            format!("{} missing targets (fail_on_missing)", report.missing.len()),
        ));
    }

    Ok(())
}

/// Write covered and missing tables. An empty collection writes no file.
fn write_report_tables(
    report: &CoverageReport,
    config: &CoverageConfig,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, CliError> {
    let columns = &config.input.columns;
    let tables = [
        (COVERED_FILE_STEM, covered_table(&report.covered, columns)),
        (MISSING_FILE_STEM, missing_table(&report.missing, columns)),
    ];

    let mut written = Vec::new();
    for (stem, table) in tables {
        if table.is_empty() {
            debug!(stem, "no rows; skipping");
            continue;
        }
        std::fs::create_dir_all(out_dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", out_dir.display())))?;
        let path = out_dir.join(format!("{stem}.{}", format.extension()));
        spcov_io::write_table(&path, &table).map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        written.push(path);
    }
    Ok(written)
}

fn match_type_line(counts: &MatchTypeCounts) -> String {
    format!(
        "exact {}, broad {}, phrase {}, product {}",
        counts.exact, counts.broad, counts.phrase, counts.product
    )
}

fn print_run_summary(report: &CoverageReport) {
    let s = &report.summary;
    eprintln!(
        "coverage: {} desired pairs over {} classified rows ({} discarded): {} covered rows, {} missing, {} pairs with no coverage",
        s.desired_pairs, s.classified_rows, s.discarded_rows, s.covered_rows, s.missing_rows, s.uncovered_pairs,
    );
    eprintln!("  covered: {}", match_type_line(&s.covered_by_match_type));
    eprintln!("  missing: {}", match_type_line(&s.missing_by_match_type));
    if !report.unmatched_bid_campaigns.is_empty() {
        eprintln!(
            "  bids: no adjustments for {}",
            report.unmatched_bid_campaigns.join(", ")
        );
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let plan = build_plan(&config, config_dir(&config_path), None)?;

    eprintln!(
        "ok: {} ({} match-type rules, {} desired pairs for {} identifiers)",
        config.name,
        config.match_types.len(),
        plan.len(),
        plan.identifiers().len(),
    );
    if plan.is_empty() {
        eprintln!("note: no desired targets; `spcov run` needs --targets FILE");
    }
    Ok(())
}

// ============================================================================
// classify
// ============================================================================

#[derive(Serialize)]
struct ClassifyReport<'a> {
    baseline: &'a WordCountBaseline,
    discarded_rows: usize,
    records: &'a [TargetRecord],
}

pub fn cmd_classify(
    input_path: PathBuf,
    sheet: Option<String>,
    config_path: Option<PathBuf>,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(ref path) => load_config(path)?,
        None => CoverageConfig::unnamed(),
    };
    let sheet = sheet.or_else(|| config.input.sheet.clone());

    let table = spcov_io::read_table(&input_path, sheet.as_deref())
        .map_err(|e| CliError::io(format!("cannot read input: {e}")))?;
    let input = CoverageInput { targets: table, bids: None };
    let dataset = load_dataset(&config, &input)?;

    print_classify_summary(&dataset);

    if json {
        let report = ClassifyReport {
            baseline: &dataset.baseline,
            discarded_rows: dataset.discarded,
            records: &dataset.records,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    let table = classified_table(&dataset, &config.input.columns);
    match output {
        Some(path) => {
            let path = match (path.extension(), format) {
                (None, Some(format)) => path.with_extension(format.extension()),
                _ => path,
            };
            spcov_io::write_table(&path, &table).map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            if format == Some(OutputFormat::Xlsx) {
                return Err(CliError::args("xlsx output cannot go to stdout")
                    .with_hint("pass -o FILE.xlsx"));
            }
            write_stdout_csv(&table)?;
        }
    }
    Ok(())
}

fn write_stdout_csv(table: &Table) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    spcov_io::csv::export_to_writer(table, &mut handle).map_err(CliError::io)?;
    handle.flush().map_err(|e| CliError::io(e.to_string()))
}

fn print_classify_summary(dataset: &ClassifiedDataset) {
    let mut by_type = MatchTypeCounts::default();
    let mut by_segment = [0usize; 3];
    for record in &dataset.records {
        by_type.add(record.match_type);
        if let Some(segment) = record.funnel_segment {
            let idx = match segment {
                FunnelSegment::Short => 0,
                FunnelSegment::Mid => 1,
                FunnelSegment::Long => 2,
            };
            by_segment[idx] += 1;
        }
    }

    eprintln!(
        "classified {} rows ({} discarded): {}",
        dataset.records.len(),
        dataset.discarded,
        match_type_line(&by_type)
    );
    eprintln!(
        "  segments: Short {}, Mid {}, Long {}",
        by_segment[0], by_segment[1], by_segment[2]
    );
}
