//! End-to-end DDL/DML scenarios driven through the SQL front-end and
//! the statement executor, against an on-disk environment.

use stratadb::catalog::Catalog;
use stratadb::executor::{Executor, QueryResult};
use stratadb::sql::Parser;
use stratadb::storage::{DbEnv, Value};
use tempfile::tempdir;

fn run(executor: &mut Executor, sql: &str) -> QueryResult {
    let statement = Parser::new(sql)
        .unwrap()
        .parse()
        .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", sql, e));
    executor
        .execute(&statement)
        .unwrap_or_else(|e| panic!("execute failed for {:?}: {}", sql, e))
}

fn open(dir: &tempfile::TempDir) -> Executor {
    let env = DbEnv::open(dir.path()).unwrap();
    Executor::new(Catalog::open(env).unwrap())
}

#[test]
fn create_table_then_show_columns() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
    let result = run(&mut executor, "SHOW COLUMNS FROM foo");

    let rows = result.rows.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("table_name"), Some(&Value::from("foo")));
    assert_eq!(rows[0].get("column_name"), Some(&Value::from("a")));
    assert_eq!(rows[0].get("data_type"), Some(&Value::from("INT")));
    assert_eq!(rows[1].get("column_name"), Some(&Value::from("b")));
    assert_eq!(rows[1].get("data_type"), Some(&Value::from("TEXT")));
}

#[test]
fn insert_then_select_star() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
    run(&mut executor, "INSERT INTO foo VALUES (12, 'Hello!')");

    let result = run(&mut executor, "SELECT * FROM foo");
    let rows = result.rows.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("a"), Some(&Value::Int(12)));
    assert_eq!(rows[0].get("b"), Some(&Value::from("Hello!")));
}

#[test]
fn delete_where_then_select() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
    run(
        &mut executor,
        "INSERT INTO foo VALUES (1, 'x'), (2, 'y'), (3, 'z')",
    );
    run(&mut executor, "DELETE FROM foo WHERE a = 2");

    let result = run(&mut executor, "SELECT * FROM foo");
    let mut remaining: Vec<i32> = result
        .rows
        .unwrap()
        .iter()
        .map(|row| row.get("a").and_then(Value::as_int).unwrap())
        .collect();
    remaining.sort_unstable();
    assert_eq!(remaining, vec![1, 3]);
}

#[test]
fn create_index_then_show_index() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
    run(&mut executor, "CREATE INDEX ix ON foo (a)");

    let result = run(&mut executor, "SHOW INDEX FROM foo");
    let rows = result.rows.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("table_name"), Some(&Value::from("foo")));
    assert_eq!(row.get("index_name"), Some(&Value::from("ix")));
    assert_eq!(row.get("column_name"), Some(&Value::from("a")));
    assert_eq!(row.get("seq_in_index"), Some(&Value::Int(1)));
    assert_eq!(row.get("index_type"), Some(&Value::from("BTREE")));
    assert_eq!(row.get("is_unique"), Some(&Value::Bool(true)));
}

#[test]
fn drop_table_then_show_columns() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
    run(&mut executor, "DROP TABLE foo");

    let result = run(&mut executor, "SHOW COLUMNS FROM foo");
    assert!(result.rows.unwrap().is_empty());
    assert!(!dir.path().join("foo.db").exists());
}

#[test]
fn show_tables_counts_user_tables_only() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT)");
    run(&mut executor, "CREATE TABLE bar (a INT)");

    let result = run(&mut executor, "SHOW TABLES");
    assert_eq!(result.message, "successfully returned 2 rows");
    let mut names: Vec<String> = result
        .rows
        .unwrap()
        .iter()
        .map(|row| row.get("table_name").and_then(Value::as_text).unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["bar", "foo"]);
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut executor = open(&dir);
        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)");
        run(&mut executor, "INSERT INTO foo VALUES (7, 'persisted')");
    }

    // A fresh executor over the same environment sees the same data.
    let mut executor = open(&dir);
    let result = run(&mut executor, "SELECT b FROM foo WHERE a = 7");
    let rows = result.rows.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("b"), Some(&Value::from("persisted")));
}

#[test]
fn inserts_spanning_multiple_blocks_scan_back() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE big (n INT, payload TEXT)");
    // Each row is ~1k, so this fills several 4k blocks.
    let payload = "p".repeat(1000);
    for n in 0..20 {
        run(
            &mut executor,
            &format!("INSERT INTO big VALUES ({}, '{}')", n, payload),
        );
    }

    let result = run(&mut executor, "SELECT n FROM big");
    assert_eq!(result.rows.unwrap().len(), 20);

    run(&mut executor, "DELETE FROM big WHERE n = 13");
    let result = run(&mut executor, "SELECT n FROM big");
    let rows = result.rows.unwrap();
    assert_eq!(rows.len(), 19);
    assert!(rows
        .iter()
        .all(|row| row.get("n") != Some(&Value::Int(13))));
}

#[test]
fn failed_create_leaves_no_catalog_rows() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    // A stray backing file makes the final create step fail after the
    // catalog rows are written; compensation must remove them again.
    std::fs::write(dir.path().join("foo.db"), vec![0u8; 4096]).unwrap();

    let statement = Parser::new("CREATE TABLE foo (a INT)")
        .unwrap()
        .parse()
        .unwrap();
    assert!(executor.execute(&statement).is_err());

    let result = run(&mut executor, "SHOW TABLES");
    assert_eq!(result.message, "successfully returned 0 rows");
    let result = run(&mut executor, "SHOW COLUMNS FROM foo");
    assert!(result.rows.unwrap().is_empty());
}

#[test]
fn select_from_meta_tables() {
    let dir = tempdir().unwrap();
    let mut executor = open(&dir);

    run(&mut executor, "CREATE TABLE foo (a INT)");
    let result = run(
        &mut executor,
        "SELECT table_name FROM _tables WHERE table_name = 'foo'",
    );
    assert_eq!(result.rows.unwrap().len(), 1);
}
