use std::path::Path;
use std::process::Command;

use sheetlink_sheet::{Formatting, RowStatus, SheetIdentity, SheetModel};
use tempfile::tempdir;

fn people(rows: &[[&str; 2]]) -> SheetModel {
    let mut data = vec![vec!["Id", "Name"]];
    data.extend(rows.iter().map(|r| r.to_vec()));
    SheetModel::with_head_and_key(SheetIdentity::new("1abc", "People").with_gid(0), "Id", data)
        .unwrap()
}

fn write(sheet: &SheetModel, path: &Path) {
    sheet.save_as_json(path, Formatting::Compact).unwrap();
}

fn sheetlink() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sheetlink"));
    command.env("NO_COLOR", "1");
    command
}

#[test]
fn check_head_exit_status() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.json");
    write(&people(&[["1", "Ann"]]), &path);

    let status = sheetlink()
        .arg("check-head")
        .arg(&path)
        .args(["--require", "Id", "--require", "Name"])
        .status()
        .unwrap();
    assert!(status.success(), "expected exit 0, got {status:?}");

    let output = sheetlink()
        .arg("check-head")
        .arg(&path)
        .args(["--require", "Email"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Email"));
}

#[test]
fn show_lists_rows_with_status() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.json");
    let mut sheet = people(&[["1", "Ann"], ["2", "Bob"]]);
    sheet.add_row(vec!["3", "Cid"]);
    write(&sheet, &path);

    let output = sheetlink().arg("show").arg(&path).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("People"));
    assert!(stdout.contains("ToAppend"));
    assert!(stdout.contains("3 | Cid"));
}

#[test]
fn merge_writes_output_file() {
    let dir = tempdir().unwrap();
    let local_path = dir.path().join("local.json");
    let remote_path = dir.path().join("remote.json");
    let merged_path = dir.path().join("merged.json");

    let mut local = people(&[["1", "Ann"], ["2", "Bob"]]);
    let bob = local.rows()[1].id();
    local.set_value(bob, 1, "Bobby").unwrap();
    write(&local, &local_path);
    write(&people(&[["1", "Anna"], ["2", "Bob"], ["3", "Cid"]]), &remote_path);

    let status = sheetlink()
        .arg("merge")
        .arg(&local_path)
        .arg(&remote_path)
        .arg("-o")
        .arg(&merged_path)
        .arg("--pretty")
        .status()
        .unwrap();
    assert!(status.success(), "expected exit 0, got {status:?}");

    let text = std::fs::read_to_string(&merged_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(3));

    let merged = SheetModel::from_json(&merged_path).unwrap();
    assert_eq!(merged.rows()[0].values(), vec!["1", "Anna"]);
    assert_eq!(merged.rows()[1].values(), vec!["2", "Bobby"]);
    assert_eq!(merged.rows()[1].status(), RowStatus::ToChange);
    assert_eq!(merged.rows()[2].status(), RowStatus::Original);
}

#[test]
fn merge_rejects_other_sheet() {
    let dir = tempdir().unwrap();
    let local_path = dir.path().join("local.json");
    let other_path = dir.path().join("other.json");
    write(&people(&[["1", "Ann"]]), &local_path);
    let other = SheetModel::with_head(
        SheetIdentity::new("1abc", "People").with_gid(0),
        vec![vec!["Id", "Name"]],
    )
    .unwrap();
    write(&other, &other_path);

    let output = sheetlink()
        .arg("merge")
        .arg(&local_path)
        .arg(&other_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("mode"));
}
