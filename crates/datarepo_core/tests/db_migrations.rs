use datarepo_core::db::migrations::latest_version;
use datarepo_core::db::{open_connection, open_db, open_db_in_memory, DbError};
use datarepo_core::{
    ConnectionConfig, RepoError, Repository, SampleEntity, Session, SqliteRepository,
    DEFAULT_CONNECTION_NAME,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "sample_entity");
}

#[test]
fn opening_same_database_twice_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datarepo.db");

    let first = SqliteRepository::<SampleEntity>::new(Session::new(open_db(&path).unwrap()));
    let added = first.add(SampleEntity::new("Persisted")).unwrap();
    first.close().unwrap();

    let conn = open_connection(&format!("sqlite://{}", path.display())).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let second = SqliteRepository::<SampleEntity>::new(Session::new(conn));
    assert_eq!(second.get(&added.id.unwrap()).unwrap(), Some(added));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_opens_from_named_connection() {
    let config = ConnectionConfig::with_default(":memory:");
    let repo = SqliteRepository::<SampleEntity>::open(&config, DEFAULT_CONNECTION_NAME).unwrap();
    assert_eq!(repo.count().unwrap(), 0);

    let err = SqliteRepository::<SampleEntity>::open(&config, "Reporting").unwrap_err();
    assert!(matches!(err, RepoError::Config(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
