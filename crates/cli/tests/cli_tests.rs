// End-to-end tests driving the built `spcov` binary.
//
// Run with: cargo test -p spcov-cli --test cli_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

const BMT: &str = "\
ASIN,Target,Campaign Name,Current Bid
B0ABC123XY,wireless mouse,exact-campaign-1,1.50
B0ABC123XY,wireless mouse,broad-campaign-1,1.10
B0ABC123XY,silent mouse,phrase-campaign-1,1.25
B0ABC123XY,B0XYZ98765,product-campaign-1,0.75
B0ABC123XY,mouse pad,auto-campaign-1,0.40
";

const BULK: &str = "\
Entity,Campaign Name (Informational only),Placement,Percentage
Bidding Adjustment,exact-campaign-1,Placement Top,20
Bidding Adjustment,exact-campaign-1,Placement Product Page,20
";

fn spcov() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spcov"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    spcov()
        .current_dir(dir)
        .args(args)
        .output()
        .expect("spcov should start")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Temp dir holding bmt.csv, bulk.csv and a config with the given targets.
fn workspace(targets_toml: &str, extra: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bmt.csv"), BMT).unwrap();
    std::fs::write(dir.path().join("bulk.csv"), BULK).unwrap();
    let config = format!(
        "name = \"CLI test\"\n{extra}\n[input]\nfile = \"bmt.csv\"\n\n[targets]\n{targets_toml}\n\n[output]\ndir = \"out\"\nformat = \"csv\"\n"
    );
    std::fs::write(dir.path().join("cov.toml"), config).unwrap();
    dir
}

// ===========================================================================
// spcov run
// ===========================================================================

#[test]
fn run_writes_tables_and_json_report() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse", "bluetooth mouse"]"#, "");
    let output = run_in(dir.path(), &["run", "cov.toml", "--bids", "bulk.csv", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is one JSON value");
    assert_eq!(report["meta"]["config_name"], "CLI test");
    assert_eq!(report["summary"]["covered_rows"], 2);
    assert_eq!(report["summary"]["missing_rows"], 4);
    assert_eq!(report["covered"][0]["maximum_placement"], "Placement Top, Placement Product Page");

    let covered = std::fs::read_to_string(dir.path().join("out/covered_targets.csv")).unwrap();
    let mut lines = covered.lines();
    assert_eq!(
        lines.next(),
        Some("ASIN,Target,Campaign Name,Current Bid,Match Type,Funnel Segment,maximum placement,maximum percentage,effective bid")
    );
    assert!(lines.next().unwrap().starts_with("B0ABC123XY,wireless mouse,exact-campaign-1,1.5,exact,"));

    let missing = std::fs::read_to_string(dir.path().join("out/missing_targets.csv")).unwrap();
    assert!(missing.contains("b0abc123xy,bluetooth mouse,exact,"));
    assert_eq!(missing.lines().count(), 5);

    let err = stderr(&output);
    assert!(err.contains("2 desired pairs"), "{err}");
    assert!(err.contains("1 pairs with no coverage"), "{err}");
}

#[test]
fn run_without_missing_writes_no_missing_table() {
    let dir = workspace(r#""B0ABC123XY" = ["B0XYZ98765"]"#, "");
    let output = run_in(dir.path(), &["run", "cov.toml", "--fail-on-missing"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("out/covered_targets.csv").exists());
    assert!(!dir.path().join("out/missing_targets.csv").exists());
}

#[test]
fn run_fail_on_missing_exits_62() {
    let dir = workspace(r#""B0ABC123XY" = ["bluetooth mouse"]"#, "");
    let output = run_in(dir.path(), &["run", "cov.toml", "--fail-on-missing"]);

    assert_eq!(output.status.code(), Some(62), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("3 missing targets"));
    // Tables are still written before the exit decision
    assert!(dir.path().join("out/missing_targets.csv").exists());
}

#[test]
fn run_fail_on_missing_from_config() {
    let dir = workspace(r#""B0ABC123XY" = ["bluetooth mouse"]"#, "fail_on_missing = true");
    let output = run_in(dir.path(), &["run", "cov.toml"]);
    assert_eq!(output.status.code(), Some(62));
}

#[test]
fn run_merges_targets_file() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse"]"#, "");
    std::fs::write(dir.path().join("targets.txt"), "# extra\n[B0ABC123XY]\nsilent mouse\nWIRELESS MOUSE\n").unwrap();
    let output = run_in(dir.path(), &["run", "cov.toml", "--targets", "targets.txt", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["desired_pairs"], 2);
}

#[test]
fn run_default_format_is_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bmt.csv"), BMT).unwrap();
    std::fs::write(
        dir.path().join("cov.toml"),
        "name = \"xlsx\"\n[input]\nfile = \"bmt.csv\"\n[targets]\n\"B0ABC123XY\" = [\"wireless mouse\"]\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["run", "cov.toml", "--out-dir", "reports"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("reports/covered_targets.xlsx").exists());
    assert!(dir.path().join("reports/missing_targets.xlsx").exists());
}

#[test]
fn run_with_charts_draws_to_stderr() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse"]"#, "");
    let output = run_in(dir.path(), &["run", "cov.toml", "--charts"]);
    assert!(output.status.success());
    // All keyword rows share the Mid band, so the chart is unavailable
    assert!(stderr(&output).contains("B0ABC123XY: chart unavailable"), "{}", stderr(&output));
}

#[test]
fn run_missing_column_exits_61_with_hint() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse"]"#, "");
    std::fs::write(dir.path().join("bmt.csv"), "ASIN,Keyword,Campaign Name,Current Bid\n").unwrap();
    let output = run_in(dir.path(), &["run", "cov.toml"]);

    assert_eq!(output.status.code(), Some(61));
    let err = stderr(&output);
    assert!(err.contains("error: targets: missing column 'Target'"), "{err}");
    assert!(err.contains("hint:  map the column under [input.columns]"), "{err}");
}

#[test]
fn run_unreadable_input_exits_3() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse"]"#, "");
    let output = run_in(dir.path(), &["run", "cov.toml", "--input", "nope.csv"]);
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
}

#[test]
fn run_without_targets_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cov.toml"), "name = \"empty\"\n").unwrap();
    let output = run_in(dir.path(), &["run", "cov.toml"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--targets FILE"));
}

// ===========================================================================
// spcov validate
// ===========================================================================

#[test]
fn validate_ok() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse", "B0XYZ98765"]"#, "");
    let output = run_in(dir.path(), &["validate", "cov.toml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("2 desired pairs for 1 identifiers"));
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cov.toml"),
        "name = \"dup\"\n[[match_types]]\nprefix = \"OW_\"\nmatch_type = \"exact\"\n[[match_types]]\nprefix = \"OW_\"\nmatch_type = \"broad\"\n",
    )
    .unwrap();
    let output = run_in(dir.path(), &["validate", "cov.toml"]);

    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("duplicate prefix 'OW_'"));
}

#[test]
fn validate_rejects_bad_targets_file() {
    let dir = workspace(r#""B0ABC123XY" = ["wireless mouse"]"#, "targets_file = \"targets.txt\"");
    std::fs::write(dir.path().join("targets.txt"), "orphan keyword\n").unwrap();
    let output = run_in(dir.path(), &["validate", "cov.toml"]);
    assert_eq!(output.status.code(), Some(60));
}

// ===========================================================================
// spcov classify
// ===========================================================================

#[test]
fn classify_prints_csv_to_stdout() {
    let dir = workspace("", "");
    let output = run_in(dir.path(), &["classify", "bmt.csv"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "ASIN,Target,Campaign Name,Current Bid,Match Type,Funnel Segment");
    // auto-campaign row is dropped
    assert_eq!(lines.len(), 5);
    assert!(lines.contains(&"B0ABC123XY,B0XYZ98765,product-campaign-1,0.75,product,"));
    assert!(stderr(&output).contains("classified 4 rows (1 discarded)"));
}

#[test]
fn classify_json() {
    let dir = workspace("", "");
    let output = run_in(dir.path(), &["classify", "bmt.csv", "--json"]);

    assert!(output.status.success());
    let val: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(val["discarded_rows"], 1);
    assert_eq!(val["baseline"]["samples"], 4);
    assert_eq!(val["records"][0]["match_type"], "exact");
    assert_eq!(val["records"][0]["row"], 2);
}

#[test]
fn classify_to_xlsx_file() {
    let dir = workspace("", "");
    let output = run_in(dir.path(), &["classify", "bmt.csv", "-o", "classified", "--format", "xlsx"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("classified.xlsx").exists());

    let refused = run_in(dir.path(), &["classify", "bmt.csv", "--format", "xlsx"]);
    assert_eq!(refused.status.code(), Some(2));
}
