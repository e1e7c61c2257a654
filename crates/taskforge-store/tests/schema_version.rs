//! Schema versioning: a version mismatch drops and recreates the tables
//! instead of limping along with a stale layout.

use taskforge_store::{Database, NewTask, TaskFilter, SCHEMA_VERSION};

#[test]
fn test_reopen_keeps_data_on_same_version() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("taskforge.db");

    {
        let mut db = Database::open(&db_path).unwrap();
        db.insert_task_with_deps(
            &NewTask {
                title: "survives reopen".to_string(),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    let tasks = db.list_tasks(&TaskFilter::default()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "survives reopen");
}

#[test]
fn test_version_mismatch_recreates_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("taskforge.db");

    {
        let mut db = Database::open(&db_path).unwrap();
        db.insert_task_with_deps(
            &NewTask {
                title: "doomed".to_string(),
                ..Default::default()
            },
            &[],
        )
        .unwrap();
    }

    // Simulate a database written by an incompatible build.
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1), [])
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    assert!(db.list_tasks(&TaskFilter::default()).unwrap().is_empty());

    let version: i32 = {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(version, SCHEMA_VERSION);
}
