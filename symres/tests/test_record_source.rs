use symres::domain::{Record, SourceError};
use symres::source::{DbDriver, RecordSource};

async fn seeded_source(rows: &[(Option<&str>, Option<&str>, i64)]) -> RecordSource {
    let source = RecordSource::connect(DbDriver::Sqlite, ":memory:")
        .await
        .expect("in-memory database should open");

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
        .bind(name.map(str::to_string))
        .bind(address.map(str::to_string))
        .bind(*instance)
        .execute(source.pool())
        .await
        .expect("insert row");
    }

    source
}

#[tokio::test]
async fn test_fetch_filters_by_instance_in_row_order() {
    let source = seeded_source(&[
        (Some("foo"), Some("0x1000"), 7),
        (Some("other"), Some("0x9999"), 8),
        (Some("bar"), Some("0x2000"), 7),
    ])
    .await;

    let fetched = source.fetch("7").await.expect("query should succeed");

    assert!(fetched.error.is_none());
    assert_eq!(fetched.records, vec![Record::new("foo", "0x1000"), Record::new("bar", "0x2000")]);
}

#[tokio::test]
async fn test_fetch_unknown_instance_is_empty() {
    let source = seeded_source(&[(Some("foo"), Some("0x1000"), 7)]).await;

    let fetched = source.fetch("42").await.expect("query should succeed");
    assert!(fetched.records.is_empty());
    assert!(fetched.error.is_none());
}

#[tokio::test]
async fn test_fetch_keeps_rows_before_a_bad_row() {
    let source = seeded_source(&[
        (Some("foo"), Some("0x1000"), 7),
        (Some("broken"), None, 7),
        (Some("bar"), Some("0x2000"), 7),
    ])
    .await;

    let fetched = source.fetch("7").await.expect("query should succeed");

    assert_eq!(fetched.records, vec![Record::new("foo", "0x1000")]);
    assert!(matches!(fetched.error, Some(SourceError::Row { row: 1, .. })));
}

#[tokio::test]
async fn test_instance_id_is_not_interpolated() {
    let source = seeded_source(&[(Some("foo"), Some("0x1000"), 7)]).await;

    // Would match every row if spliced into the SQL text
    let fetched = source.fetch("7 OR 1=1").await.expect("query should succeed");
    assert!(fetched.records.is_empty());
}

#[tokio::test]
async fn test_missing_table_is_a_query_error() {
    let source = RecordSource::connect(DbDriver::Sqlite, ":memory:").await.unwrap();

    let result = source.fetch("7").await;
    assert!(matches!(result, Err(SourceError::Query(_))));
}

#[tokio::test]
async fn test_connect_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no/such/dir/symbols.db");

    let result = RecordSource::connect(DbDriver::Sqlite, missing.to_str().unwrap()).await;
    assert!(matches!(result, Err(SourceError::Connect { driver: "sqlite", .. })));
}
