use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;

fn workplan(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("workplan").expect("binary");
    cmd.env("WORKPLAN_DIR", dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_works() {
    Command::cargo_bin("workplan")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Tabbed work planner"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "init", "tabs", "tab", "list", "add", "edit", "status", "toggle", "rm", "clear",
        "reset-status", "move", "import", "export", "backup", "headers", "reconcile",
        "import-sheet", "allow", "report",
    ];

    for cmd in subcommands {
        Command::cargo_bin("workplan")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn add_list_and_toggle() {
    let dir = tempfile::tempdir().unwrap();

    workplan(dir.path())
        .args(["add", "ATM-01 Jakarta", "--schedule", "5/3/24", "--notes", "cek kaset"])
        .assert()
        .success()
        .stdout(contains("Added"));

    workplan(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("ATM-01 Jakarta"))
        .stdout(contains("05/03/24"))
        .stdout(contains("cek kaset"));

    workplan(dir.path())
        .args(["toggle", "1"])
        .assert()
        .success()
        .stdout(contains("Done"));

    workplan(dir.path())
        .args(["list", "--filter", "outstanding"])
        .assert()
        .success()
        .stdout(contains("(0 of 1 items)"));

    assert!(dir.path().join("work_planner.json").exists());
}

#[test]
fn destructive_commands_need_yes() {
    let dir = tempfile::tempdir().unwrap();
    workplan(dir.path()).args(["add", "S1A01"]).assert().success();

    workplan(dir.path())
        .args(["clear"])
        .assert()
        .code(3)
        .stderr(contains("Confirmation required"));

    workplan(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("S1A01"));

    workplan(dir.path())
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(contains("Deleted 1 items"));
}

#[test]
fn unknown_item_is_a_user_error() {
    let dir = tempfile::tempdir().unwrap();
    workplan(dir.path())
        .args(["toggle", "7"])
        .assert()
        .code(2)
        .stderr(contains("Item not found"));
}

#[test]
fn tab_lifecycle() {
    let dir = tempfile::tempdir().unwrap();

    workplan(dir.path())
        .args(["tab", "add", "Bogor"])
        .assert()
        .success()
        .stdout(contains("Created tab 1 (Bogor)"));

    workplan(dir.path())
        .args(["tabs"])
        .assert()
        .success()
        .stdout(contains("Tab 1"))
        .stdout(contains("Bogor"));

    workplan(dir.path())
        .args(["tab", "delete", "0", "--yes"])
        .assert()
        .success();

    workplan(dir.path())
        .args(["tab", "switch", "0"])
        .assert()
        .code(2)
        .stderr(contains("Tab not found"));
}

#[test]
fn import_then_reconcile_spreadsheet() {
    let dir = tempfile::tempdir().unwrap();
    let items = dir.path().join("items.json");
    fs::write(
        &items,
        r#"[{"wsid": "ATM-01 Jakarta", "status": "outstanding"}, {"machineData": "ATM-02", "status": "Done"}]"#,
    )
    .unwrap();
    let sheet = dir.path().join("sheet.json");
    fs::write(
        &sheet,
        r#"[["Laporan"], [], ["No", "WSID", "Lokasi", "Plan"], [1, "atm-01", "Jakarta", "15/6/24"]]"#,
    )
    .unwrap();

    workplan(dir.path())
        .arg("import")
        .arg(&items)
        .assert()
        .success()
        .stdout(contains("Imported 2 items"));

    workplan(dir.path())
        .arg("headers")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(contains("Header row: 3"))
        .stdout(contains("Suggested identifier column: WSID"));

    workplan(dir.path())
        .arg("reconcile")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(contains("Updated 1 items"));

    workplan(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("15/06/24"));
}

#[test]
fn import_sheet_then_allow_list() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.json");
    fs::write(
        &sheet,
        r#"[["Rekap"], ["No", "WSID", "Lokasi", "Plan"], [1, "S1A01", "Plaza", "15/6/24"], [2, "", "x", ""], [3, "S1A02", "Mall", 44256]]"#,
    )
    .unwrap();

    workplan(dir.path())
        .arg("import-sheet")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(contains("Imported 2 rows into tab 0 (header on row 2)"));

    workplan(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("S1A01  15/06/24  Plaza"))
        .stdout(contains("S1A02  01/03/21  Mall"));

    // Appending to a filled tab needs --yes
    workplan(dir.path()).arg("import-sheet").arg(&sheet).assert().code(3);

    workplan(dir.path())
        .args(["allow", "s1a02"])
        .assert()
        .success()
        .stdout(contains("Showing only 1 identifiers"));

    workplan(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("(1 of 2 items)"))
        .stdout(contains("S1A02"));

    workplan(dir.path())
        .args(["allow"])
        .assert()
        .success()
        .stdout(contains("Showing every item"));
}

#[test]
fn export_and_backup() {
    let dir = tempfile::tempdir().unwrap();
    workplan(dir.path()).args(["add", "S1A01", "--done"]).assert().success();

    workplan(dir.path())
        .args(["export"])
        .assert()
        .success()
        .stdout(contains("\"machineData\": \"S1A01\""))
        .stdout(contains("\"status\": \"Done\""));

    let backup = dir.path().join("backup.json");
    workplan(dir.path())
        .arg("backup")
        .arg("--output")
        .arg(&backup)
        .assert()
        .success();
    assert!(fs::read_to_string(&backup).unwrap().contains("\"currentTabId\""));

    workplan(dir.path())
        .arg("import")
        .arg(&backup)
        .assert()
        .code(3);
}

#[test]
fn report_writes_markdown() {
    let dir = tempfile::tempdir().unwrap();
    workplan(dir.path()).args(["add", "S1A01", "-s", "01/06/24"]).assert().success();

    workplan(dir.path())
        .args(["report", "--date", "2024-06-15"])
        .assert()
        .success()
        .stdout(contains("Report generated"));

    let report = fs::read_to_string(dir.path().join("report-2024-06-15.md")).unwrap();
    assert!(report.contains("### Overdue"));
}
