use std::path::Path;
use std::process::{Command, Output};

use symres::source::{DbDriver, RecordSource};

const BIN: &str = env!("CARGO_BIN_EXE_symres");

async fn seed_database(path: &Path, rows: &[(&str, &str, i64)]) {
    let source = RecordSource::connect(DbDriver::Sqlite, &format!("{}?mode=rwc", path.display()))
        .await
        .expect("database file should be created");

    sqlx::query(
        "CREATE TABLE symbols (
            symbol_name TEXT,
            symbol_address TEXT,
            symbol_instance_id_ref INTEGER NOT NULL
        )",
    )
    .execute(source.pool())
    .await
    .expect("create table");

    for (name, address, instance) in rows {
        sqlx::query(
            "INSERT INTO symbols (symbol_name, symbol_address, symbol_instance_id_ref) \
             VALUES (?, ?, ?)",
        )
        .bind(name.to_string())
        .bind(address.to_string())
        .bind(*instance)
        .execute(source.pool())
        .await
        .expect("insert row");
    }

    source.pool().close().await;
}

fn symres(args: &[&str], dir: &Path) -> Output {
    Command::new(BIN).args(args).current_dir(dir).output().expect("Failed to run symres")
}

#[test]
fn test_no_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = symres(&[], dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
    assert!(!dir.path().join("addr2line_Symbols.txt").exists());
}

#[test]
fn test_unknown_driver_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = symres(&["oracle", "dsn", "7"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_run_writes_listing_and_resolves_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("symbols.db");
    seed_database(&db, &[("foo", "zz", 7), ("bar", "0x1", 7), ("elsewhere", "0x2", 8)]).await;

    let listing = dir.path().join("listing.txt");
    let output = symres(
        &[
            "sqlite3",
            db.to_str().unwrap(),
            "7",
            "false",
            "1",
            "--image",
            BIN,
            "--output",
            listing.to_str().unwrap(),
        ],
        dir.path(),
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(std::fs::read_to_string(&listing).unwrap(), "zz : foo\n0x1 : bar\n");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "stdout: {stdout}");
    assert!(lines[0].starts_with("zz : foo Error resolving address"));
    assert!(lines[1].starts_with("0x1 : "));
}
