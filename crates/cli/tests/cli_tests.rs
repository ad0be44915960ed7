// Integration tests for `callboard run` and `callboard check`.
// Run with: cargo test -p callboard-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use tempfile::{tempdir, TempDir};

const REPORT_XLSX: &str = "agent_call_center_metrics_2026-03-02_2026-03-08.xlsx";

fn callboard(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_callboard"));
    cmd.current_dir(cwd)
        .env_remove("CALLBOARD_CONFIG")
        .env_remove("CALLBOARD_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    callboard(cwd).args(args).output().expect("run callboard")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

/// A clean week of exports in `<tmp>/data`.
fn week() -> TempDir {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(
        data.join("call_center_master_list.csv"),
        "\
Date/Time,WT/SA Bonus,BCI Caller
2026-03-02 09:14:00,$25.00,jdoe
2026-03-03 10:30:00,$0.00,jdoe
2026-03-04 11:00:00,$25.00,jdoe
2026-03-05 13:00:00,$25.00,bkim
",
    )
    .unwrap();
    fs::write(
        data.join("total_warm_contacts.csv"),
        "AGENT,AGENT GROUP,Mon,Tue\njdoe@domain.com,Warm,3,1\n",
    )
    .unwrap();
    fs::write(
        data.join("total_warm_dials.csv"),
        "\
AGENT,AGENT GROUP,AGENT FIRST NAME,AGENT LAST NAME,Attempt 1,Attempt 2,Attempt 3
jdoe@domain.com,Warm,John,Doe,10,5,0
",
    )
    .unwrap();
    fs::write(
        data.join("agent_daily_summary.csv"),
        "\
AGENT,On Call / AGENT STATE TIME,Ready / AGENT STATE TIME
jdoe@domain.com,1:15:00,0:45:00
",
    )
    .unwrap();
    fs::write(
        data.join("master_timecard_summary.csv"),
        "\
Timecard Summary,,,,,
ID: 1001,\"Doe, John\",,,,
03/02/2026,Regular,08:00,16:00,8.00,WEB
,,,Total,38.5,
",
    )
    .unwrap();
    dir
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// run: success paths
// ---------------------------------------------------------------------------

#[test]
fn run_writes_default_named_xlsx() {
    let dir = week();
    let out = run(dir.path(), &["run", "--start", "2026-03-02", "--end", "2026-03-08"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let path = dir.path().join(REPORT_XLSX);
    assert!(path.exists(), "report not written; files: {:?}", files_in(dir.path()));

    let mut wb: Sheets<_> = open_workbook_auto(&path).unwrap();
    let range = wb.worksheet_range("Metrics").unwrap();
    assert_eq!(range.get((0, 0)), Some(&Data::String("Agent".into())));
    assert_eq!(range.get((1, 0)), Some(&Data::String("jdoe".into())));
    assert_eq!(range.get((1, 2)), Some(&Data::Float(2.0)));
    assert_eq!(range.get((1, 4)), Some(&Data::Float(15.0)));
    assert_eq!(range.get((1, 10)), Some(&Data::Float(38.5)));

    let err = stderr(&out);
    assert!(err.contains("wrote"), "summary missing: {err}");
    assert!(err.contains("2 agent(s)"), "summary: {err}");
}

#[test]
fn run_json_on_stdout() {
    let dir = week();
    let out = run(
        dir.path(),
        &["run", "--week", "2026-03-04", "--format", "csv", "--json", "--quiet"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(out.stderr.is_empty(), "--quiet printed: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(report["meta"]["start"], "2026-03-02");
    assert_eq!(report["meta"]["end"], "2026-03-08");

    let jdoe = &report["rows"][0];
    assert_eq!(jdoe["agent"], "jdoe");
    assert_eq!(jdoe["name"], "John D");
    assert_eq!(jdoe["sets"], 2);
    assert_eq!(jdoe["dials"], 15.0);
    assert_eq!(jdoe["calling_hours_rounded"], 2.0);
    assert_eq!(jdoe["payroll_hours"], 38.5);
    let spd = jdoe["sets_per_dial"].as_f64().unwrap();
    assert!((spd - 0.1333).abs() < 1e-3);

    // Leads-only agent: present, payroll blank.
    let bkim = &report["rows"][1];
    assert_eq!(bkim["agent"], "bkim");
    assert!(bkim["payroll_hours"].is_null());

    assert!(dir
        .path()
        .join("agent_call_center_metrics_2026-03-02_2026-03-08.csv")
        .exists());
}

#[test]
fn run_out_directory_is_created() {
    let dir = week();
    let out = run(
        dir.path(),
        &["run", "--week", "2026-03-04", "--format", "json", "--out", "reports/"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        files_in(&dir.path().join("reports")),
        vec!["agent_call_center_metrics_2026-03-02_2026-03-08.json"]
    );
}

#[test]
fn run_with_config_and_source_override() {
    let dir = week();
    let data = dir.path().join("data");
    fs::rename(
        data.join("master_timecard_summary.csv"),
        dir.path().join("paylocity.csv"),
    )
    .unwrap();
    fs::write(
        dir.path().join("weekly.toml"),
        "[output]\nprefix = \"weekly\"\nformat = \"csv\"\n",
    )
    .unwrap();

    let out = run(
        dir.path(),
        &[
            "run", "--week", "2026-03-04",
            "--config", "weekly.toml",
            "--data-dir", "data",
            "--payroll", "paylocity.csv",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let csv = fs::read_to_string(dir.path().join("weekly_2026-03-02_2026-03-08.csv")).unwrap();
    assert!(csv.starts_with("Agent,Name,Sets,"));
    assert!(csv.contains("jdoe,John D,2,4,15,0.1333,0.5000,2.00,2.00,1.00,38.50,5.2"));
}

#[test]
fn run_reports_dropped_records() {
    let dir = week();
    fs::write(
        dir.path().join("data/master_timecard_summary.csv"),
        "ID: 1,\"Doe, John\",,,\n,,,Total,38.5\nID: 2,\"Quinn, Zed\",,,\n,,,Total,12\n",
    )
    .unwrap();
    let out = run(dir.path(), &["run", "--week", "2026-03-04"]);
    assert!(out.status.success());
    let err = stderr(&out);
    assert!(err.contains("dropped records:"), "stderr: {err}");
    assert!(err.contains("unresolved_name: 1"), "stderr: {err}");
}

// ---------------------------------------------------------------------------
// run: structural failures
// ---------------------------------------------------------------------------

#[test]
fn missing_column_exits_4_and_writes_nothing() {
    let dir = week();
    fs::write(
        dir.path().join("data/agent_daily_summary.csv"),
        "AGENT,On Call / AGENT STATE TIME\njdoe@domain.com,1:15:00\n",
    )
    .unwrap();
    let before = files_in(dir.path());

    let out = run(dir.path(), &["run", "--week", "2026-03-04"]);
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("calling_hours source"), "stderr: {err}");
    assert!(err.contains("Ready / AGENT STATE TIME"), "stderr: {err}");
    assert!(err.contains("[columns.calling_hours]"), "hint missing: {err}");
    assert_eq!(files_in(dir.path()), before, "output written despite failure");
}

#[test]
fn missing_source_exits_3() {
    let dir = week();
    fs::remove_file(dir.path().join("data/total_warm_dials.csv")).unwrap();
    let out = run(dir.path(), &["run", "--week", "2026-03-04"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("total_warm_dials.csv"));
    assert!(!dir.path().join(REPORT_XLSX).exists());
}

#[test]
fn inverted_window_exits_2() {
    let dir = week();
    let out = run(dir.path(), &["run", "--start", "2026-03-08", "--end", "2026-03-02"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("invalid date window"));
}

#[test]
fn start_without_end_is_rejected_by_clap() {
    let dir = week();
    let out = run(dir.path(), &["run", "--start", "2026-03-02"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn bad_config_exits_5() {
    let dir = week();
    fs::write(dir.path().join("callboard.toml"), "[sources]\nleeds = \"x.csv\"\n").unwrap();
    let out = run(dir.path(), &["run", "--week", "2026-03-04", "--data-dir", "data"]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("config parse error"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_defaults() {
    let dir = week();
    let out = run(dir.path(), &["check"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("built-in defaults"));
    assert!(stdout.contains("mgarcia -> ysanchez"));
    assert!(stdout.contains("53-59"));
}

#[test]
fn check_print_round_trips() {
    let dir = week();
    let out = run(dir.path(), &["check", "--print"]);
    assert!(out.status.success());
    fs::write(dir.path().join("callboard.toml"), &out.stdout).unwrap();

    let again = run(dir.path(), &["check"]);
    assert!(again.status.success(), "stderr: {}", stderr(&again));
    assert!(String::from_utf8_lossy(&again.stdout).contains("callboard.toml (ok)"));
}

#[test]
fn check_data_dir_reports_missing_source() {
    let dir = week();
    fs::remove_file(dir.path().join("data/call_center_master_list.csv")).unwrap();
    let out = run(dir.path(), &["check", "--data-dir", "data"]);
    assert_eq!(out.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("(missing)"));
    assert!(stdout.contains("(ok)"));
}
