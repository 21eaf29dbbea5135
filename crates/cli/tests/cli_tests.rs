// End-to-end tests for the sheetsync binary: real xlsx files in a temp dir.
//
// Run with: cargo test -p sheetsync-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sheetsync_engine::{Sheet, Workbook};

fn sheetsync(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sheetsync"));
    cmd.current_dir(dir)
        .env_remove("SHEETSYNC_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--no-prompt");
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Title on row 1, headers on row 2, data below.
fn write_book(path: &Path, sheet_name: &str, headers: &[&str], rows: &[&[&str]]) {
    let mut sheet = Sheet::new(sheet_name);
    sheet.set_value(0, 0, "Report");
    for (c, h) in headers.iter().enumerate() {
        sheet.set_value(1, c, *h);
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            if !v.is_empty() {
                sheet.set_value(r + 2, c, *v);
            }
        }
    }
    sheetsync_io::export(&Workbook::from_sheets(vec![sheet], 0), path).unwrap();
}

fn load(path: &Path) -> Workbook {
    sheetsync_io::import(path).unwrap().0
}

/// Target with two orders, one source marking O-1 as Done.
fn fixture(config_extra: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    write_book(
        &dir.path().join("target.xlsx"),
        "Orders",
        &["ID", "Status", "Note"],
        &[&["O-1", "Open", "x"], &["O-2", "Open", "y"]],
    );
    write_book(
        &dir.path().join("source.xlsx"),
        "Export",
        &["ID", "Status"],
        &[&["O-1", "Done"], &["O-3", "Done"]],
    );
    let config = format!(
        r#"{{
            "targetFileName": "target.xlsx",
            "targetSheetName": "Orders",
            "targetColumnName": "Status",
            "targetIdentifierColumnName": "ID",
            "sourceFiles": [{{ "fileName": "source.xlsx" }}]{config_extra}
        }}"#
    );
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

#[test]
fn updates_matching_rows_and_highlights() {
    let (dir, config) = fixture("");
    let output = sheetsync(dir.path()).arg(&config).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 cell(s) updated"));

    let book = load(&dir.path().join("target.xlsx"));
    let sheet = book.sheet_by_name("Orders").unwrap();
    assert_eq!(sheet.text(2, 1), "Done");
    assert!(sheet.format(2, 1).background_color.is_some());
    assert_eq!(sheet.text(3, 1), "Open");
    assert!(sheet.format(3, 1).background_color.is_none());
    assert_eq!(sheet.text(0, 0), "Report");
}

#[test]
fn merged_update_cell_is_reported_and_left_alone() {
    let (dir, config) = fixture("");
    let target = dir.path().join("target.xlsx");
    let mut sheet = Sheet::new("Orders");
    sheet.set_value(0, 0, "Report");
    for (c, h) in ["ID", "Status", "Note"].iter().enumerate() {
        sheet.set_value(1, c, *h);
    }
    sheet.set_value(2, 0, "O-3");
    sheet.set_value(2, 1, "Open");
    sheet.set_value(3, 0, "O-1");
    sheet.add_merged_region((2, 1), (3, 1));
    sheetsync_io::export(&Workbook::from_sheets(vec![sheet], 0), &target).unwrap();

    let output = sheetsync(dir.path()).arg(&config).arg("--json").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(report["rows_updated"], 1);
    assert_eq!(report["updates"][0]["cell"], "B3");
    assert_eq!(report["skipped_cells"][0]["cell"], "B4");

    let book = load(&target);
    let sheet = book.sheet_by_name("Orders").unwrap();
    assert_eq!(sheet.text(2, 1), "Done");
    assert_eq!(sheet.text(3, 1), "");
    assert_eq!(sheet.merged_regions.len(), 1);
}

#[test]
fn config_defaults_to_working_directory() {
    let (dir, _config) = fixture("");
    let output = sheetsync(dir.path()).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn json_report_is_single_value_on_stdout() {
    let (dir, config) = fixture("");
    let output = sheetsync(dir.path()).arg(&config).arg("--json").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["sheet"], "Orders");
    assert_eq!(report["rows_updated"], 1);
    let updates = report["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["cell"], "B3");
    assert_eq!(updates[0]["old_value"], "Open");
    assert_eq!(updates[0]["new_value"], "Done");
    assert_eq!(updates[0]["source"], "source.xlsx");
}

#[test]
fn second_run_changes_nothing() {
    let (dir, config) = fixture("");
    assert!(sheetsync(dir.path()).arg(&config).output().unwrap().status.success());

    let output = sheetsync(dir.path()).arg(&config).arg("--json").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(report["updates"].as_array().unwrap().len(), 0);
}

#[test]
fn dry_run_leaves_target_untouched() {
    let (dir, config) = fixture("");
    let output = sheetsync(dir.path()).arg(&config).arg("--dry-run").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("dry run"));

    let book = load(&dir.path().join("target.xlsx"));
    assert_eq!(book.sheet_by_name("Orders").unwrap().text(2, 1), "Open");
}

#[test]
fn timestamped_output_keeps_target() {
    let (dir, config) = fixture(r#", "outputMode": "timestamped""#);
    let output = sheetsync(dir.path()).arg(&config).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let book = load(&dir.path().join("target.xlsx"));
    assert_eq!(book.sheet_by_name("Orders").unwrap().text(2, 1), "Open");

    let written: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("target2") && name.ends_with(".xlsx"))
        .collect();
    assert_eq!(written.len(), 1, "files: {written:?}");
    assert_eq!(written[0].len(), "target".len() + 14 + ".xlsx".len());

    let book = load(&dir.path().join(&written[0]));
    assert_eq!(book.sheet_by_name("Orders").unwrap().text(2, 1), "Done");
}

#[test]
fn target_flag_overrides_config() {
    let (dir, config) = fixture("");
    let other = dir.path().join("other.xlsx");
    std::fs::copy(dir.path().join("target.xlsx"), &other).unwrap();

    let output = sheetsync(dir.path())
        .arg(&config)
        .args(["--target", "other.xlsx"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(load(&other).sheet_by_name("Orders").unwrap().text(2, 1), "Done");
    assert_eq!(
        load(&dir.path().join("target.xlsx")).sheet_by_name("Orders").unwrap().text(2, 1),
        "Open"
    );
}

#[test]
fn missing_sheet_exits_1() {
    let (dir, _) = fixture("");
    let config = dir.path().join("bad-sheet.json");
    std::fs::write(
        &config,
        r#"{"targetFileName": "target.xlsx", "targetSheetName": "Nope",
            "targetColumnName": "Status", "targetIdentifierColumnName": "ID"}"#,
    )
    .unwrap();

    let output = sheetsync(dir.path()).arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'Nope'"));
}

#[test]
fn invalid_config_exits_1() {
    let (dir, _) = fixture("");
    let config = dir.path().join("broken.json");
    std::fs::write(&config, "{ not json").unwrap();

    let output = sheetsync(dir.path()).arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("config parse error"));
}

#[test]
fn missing_config_without_prompt_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = sheetsync(dir.path()).arg("absent.json").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("config file not found"));
}

#[test]
fn missing_source_exits_3() {
    let (dir, config) = fixture("");
    std::fs::remove_file(dir.path().join("source.xlsx")).unwrap();

    let output = sheetsync(dir.path()).arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("source.xlsx"));
}

#[test]
fn unknown_flag_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = sheetsync(dir.path()).arg("--frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
