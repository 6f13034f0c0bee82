//! stratadb - SQL shell
//!
//! Reads statements from stdin, one per line, and executes them
//! against the database environment named on the command line.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use stratadb::catalog::Catalog;
use stratadb::executor::Executor;
use stratadb::sql::Parser;
use stratadb::storage::{DataType, DbEnv, HeapFile, HeapTable, Row, SlottedPage, Value};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(envdir) = std::env::args().nth(1) else {
        eprintln!("Usage: stratadb <environment directory>");
        return ExitCode::FAILURE;
    };

    let env = match DbEnv::open(&envdir) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("cannot open environment '{}': {}", envdir, e);
            return ExitCode::FAILURE;
        }
    };
    let catalog = match Catalog::open(env.clone()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("cannot open schema catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut executor = Executor::new(catalog);

    println!(
        "(stratadb: running with database environment at {})",
        env.root().display()
    );

    let stdin = io::stdin();
    loop {
        print!("SQL> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("error reading input: {}", e);
                continue;
            }
        }

        let input = line.trim();
        match input {
            "" => continue,
            "quit" => break,
            "test" => report("heap storage check", check_heap_storage(&env)),
            "slotted" => report("slotted page check", check_slotted_page()),
            "heapfile" => report("heap file check", check_heap_file(&env)),
            sql => execute_sql(&mut executor, sql),
        }
    }

    ExitCode::SUCCESS
}

/// Parse and execute one statement, printing the result or the error
fn execute_sql(executor: &mut Executor, sql: &str) {
    let statement = match Parser::new(sql).and_then(|mut p| p.parse()) {
        Ok(statement) => statement,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };
    match executor.execute(&statement) {
        Ok(result) => println!("{}", result),
        Err(e) => println!("{}", e),
    }
}

fn report(what: &str, outcome: stratadb::Result<()>) {
    match outcome {
        Ok(()) => println!("{}: ok", what),
        Err(e) => println!("{}: failed: {}", what, e),
    }
}

/// Exercise the slotted page in memory: add, replace, delete, re-read
fn check_slotted_page() -> stratadb::Result<()> {
    let mut page = SlottedPage::new(1);
    let id1 = page.add(b"test1")?;
    let id2 = page.add(b"test2")?;
    expect(id1 == 1 && id2 == 2, "record ids should be 1 and 2")?;

    page.put(id2, b"updated record 2")?;
    page.delete(id1)?;
    expect(page.ids() == vec![id2], "only record 2 should remain")?;
    expect(
        page.get(id2) == Some(&b"updated record 2"[..]),
        "record 2 should hold the updated bytes",
    )?;
    Ok(())
}

/// Exercise the heap file against the open environment
fn check_heap_file(env: &DbEnv) -> stratadb::Result<()> {
    let mut file = HeapFile::new(env, "_scratch_heapfile");
    let _ = file.destroy(); // clear any leftover from an aborted run
    file.create()?;

    let outcome = (|| {
        expect(file.last_block_id() == 1, "a new file should hold one block")?;
        let mut page = file.get_new()?;
        let id = page.add(b"spilled")?;
        file.put(&page)?;
        let page = file.get(page.block_id())?;
        expect(
            page.get(id) == Some(&b"spilled"[..]),
            "the record should survive a write-back",
        )?;
        expect(file.block_ids() == vec![1, 2], "the file should hold two blocks")
    })();

    file.destroy()?;
    outcome
}

/// Exercise a heap table end to end against the open environment
fn check_heap_storage(env: &DbEnv) -> stratadb::Result<()> {
    let mut table = HeapTable::new(
        env,
        "_scratch_table",
        vec!["a".to_string(), "b".to_string()],
        vec![DataType::Int, DataType::Text],
    );
    let _ = table.destroy(); // clear any leftover from an aborted run
    table.create()?;

    let outcome = (|| {
        let mut row = Row::new();
        row.insert("a".to_string(), Value::Int(12));
        row.insert("b".to_string(), Value::Text("Hello!".to_string()));
        let handle = table.insert(&row)?;

        let handles = table.select()?;
        expect(handles == vec![handle], "select should return the new handle")?;
        expect(
            table.project(handle)? == row,
            "projection should round-trip the row",
        )?;
        table.delete(handle)?;
        expect(table.select()?.is_empty(), "the table should be empty again")
    })();

    table.destroy()?;
    outcome
}

fn expect(condition: bool, what: &str) -> stratadb::Result<()> {
    if condition {
        Ok(())
    } else {
        Err(stratadb::Error::Storage(what.to_string()))
    }
}
