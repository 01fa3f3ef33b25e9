use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const STATEMENT: &str = "\
Girokonto;DE89370400440532013000
Zeitraum: 01.03.2024 - 31.03.2024;

Buchungsdatum;Betrag (\u{20ac});Zahlungsempf\u{e4}nger*in;Verwendungszweck
01.03.2024;-45,90;Rewe;Einkauf
05.03.2024;-850,00;Stadtwerke;Abschlag 03-24
";

/// Each test gets its own HOME so settings and data never leak between
/// runs or into the real user profile.
fn haushalt(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("haushalt").unwrap();
    cmd.env("HOME", home);
    cmd
}

fn setup(home: &Path) {
    let data_dir = home.join("data");
    haushalt(home)
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized haushalt"));
}

#[test]
fn test_init_creates_inbox_and_db() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    assert!(home.path().join("data").join("haushalt.db").exists());
    assert!(home.path().join("data").join("inbox").is_dir());
}

#[test]
fn test_import_single_file_and_status() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, STATEMENT).unwrap();

    haushalt(home.path())
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported, 0 skipped"));

    // explicit files stay in place
    assert!(csv.exists());

    haushalt(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions:     2"));
}

#[test]
fn test_second_import_skips_duplicates() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, STATEMENT).unwrap();

    haushalt(home.path()).arg("import").arg(&csv).assert().success();
    haushalt(home.path())
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 imported, 2 skipped"));
}

#[test]
fn test_inbox_import_archives_files() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    let inbox = home.path().join("data").join("inbox");
    std::fs::write(inbox.join("march.csv"), STATEMENT).unwrap();

    haushalt(home.path())
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) processed: 2 imported"));

    assert!(!inbox.join("march.csv").exists());
    assert!(inbox.join("imported").join("march.csv").exists());
}

#[test]
fn test_rules_and_categorize_roundtrip() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, STATEMENT).unwrap();
    haushalt(home.path()).arg("import").arg(&csv).assert().success();

    haushalt(home.path())
        .args(["rules", "add", "stadtwerke", "--category", "Nebenkosten"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added rule"));

    haushalt(home.path())
        .arg("categorize")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 updated"));

    haushalt(home.path())
        .args(["transactions", "list", "--category", "Nebenkosten"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stadtwerke"));
}

#[test]
fn test_manual_edit_survives_categorize() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    haushalt(home.path())
        .args([
            "transactions",
            "add",
            "01.03.2024",
            "-12,50",
            "Kino Abend",
        ])
        .assert()
        .success();

    // find the row id via list output is brittle; ids start at 1 in a
    // fresh database
    haushalt(home.path())
        .args(["transactions", "edit", "1", "--category", "Freizeit"])
        .assert()
        .success();

    haushalt(home.path())
        .args(["rules", "add", "kino", "--category", "Kultur"])
        .assert()
        .success();

    haushalt(home.path())
        .arg("categorize")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 manually edited rows untouched"));

    haushalt(home.path())
        .args(["transactions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Freizeit"));
}

#[test]
fn test_unparsable_file_reports_error() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    let csv = home.path().join("noise.csv");
    std::fs::write(&csv, "kein;header\nnur;rauschen\n").unwrap();

    haushalt(home.path())
        .arg("import")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No header row"));
}
