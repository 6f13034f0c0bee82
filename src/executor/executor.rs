//! Statement execution for stratadb
//!
//! The executor dispatches parsed statements against the schema
//! catalog and the heap tables underneath it. DDL statements follow a
//! compensation discipline: every catalog mutation pushes an undo
//! step, and on failure the steps run in reverse. Undo errors are
//! swallowed so the original cause reaches the caller.

use std::fmt;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::executor::plan::{select_handles, EvalPlan};
use crate::sql::ast::{
    BinaryOperator, CreateIndexStatement, CreateTableStatement, DeleteStatement,
    DropIndexStatement, DropTableStatement, Expr, InsertStatement, Literal, Projection,
    SelectStatement, ShowStatement, Statement,
};
use crate::storage::{DataType, Handle, HeapTable, Identifier, Row, Value};

/// The outcome of one statement: optional result columns and rows,
/// plus a human-readable message
#[derive(Debug)]
pub struct QueryResult {
    pub column_names: Option<Vec<Identifier>>,
    pub column_attributes: Option<Vec<DataType>>,
    pub rows: Option<Vec<Row>>,
    pub message: String,
}

impl QueryResult {
    /// A result that carries only a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            column_names: None,
            column_attributes: None,
            rows: None,
            message: message.into(),
        }
    }

    /// A result with columns and rows
    pub fn with_rows(
        column_names: Vec<Identifier>,
        column_attributes: Vec<DataType>,
        rows: Vec<Row>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column_names: Some(column_names),
            column_attributes: Some(column_attributes),
            rows: Some(rows),
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(column_names) = &self.column_names {
            for name in column_names {
                write!(f, "{} ", name)?;
            }
            writeln!(f)?;
            write!(f, "+")?;
            for _ in column_names {
                write!(f, "----------+")?;
            }
            writeln!(f)?;
            if let Some(rows) = &self.rows {
                for row in rows {
                    for name in column_names {
                        if let Some(value) = row.get(name) {
                            write!(f, "{} ", value)?;
                        }
                    }
                    writeln!(f)?;
                }
            }
        }
        write!(f, "{}", self.message)
    }
}

/// One reversible catalog mutation, recorded while a DDL statement
/// runs
enum UndoOp {
    TablesRow(Handle),
    ColumnsRow(Handle),
    IndicesRow(Handle),
}

/// The statement executor
pub struct Executor {
    catalog: Catalog,
}

impl Executor {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Execute one parsed statement
    pub fn execute(&mut self, statement: &Statement) -> Result<QueryResult> {
        match statement {
            Statement::CreateTable(stmt) => self.create_table(stmt),
            Statement::CreateIndex(stmt) => self.create_index(stmt),
            Statement::DropTable(stmt) => self.drop_table(stmt),
            Statement::DropIndex(stmt) => self.drop_index(stmt),
            Statement::Show(stmt) => self.show(stmt),
            Statement::Insert(stmt) => self.insert(stmt),
            Statement::Delete(stmt) => self.delete(stmt),
            Statement::Select(stmt) => self.select(stmt),
        }
    }

    // ========== CREATE ==========

    fn create_table(&self, statement: &CreateTableStatement) -> Result<QueryResult> {
        let table_name = &statement.table_name;
        if self.catalog.table_exists(table_name)? {
            if statement.if_not_exists {
                return Ok(QueryResult::with_message(format!(
                    "table {} already exists",
                    table_name
                )));
            }
            return Err(Error::Conflict(format!(
                "table '{}' already exists",
                table_name
            )));
        }

        let mut undo = Vec::new();
        match self.create_table_steps(statement, &mut undo) {
            Ok(result) => {
                info!(table = %table_name, "created table");
                Ok(result)
            }
            Err(e) => {
                self.compensate(undo);
                Err(e)
            }
        }
    }

    fn create_table_steps(
        &self,
        statement: &CreateTableStatement,
        undo: &mut Vec<UndoOp>,
    ) -> Result<QueryResult> {
        let table_name = &statement.table_name;

        let mut tables = self.catalog.tables();
        let mut row = Row::new();
        row.insert("table_name".to_string(), Value::from(table_name.as_str()));
        undo.push(UndoOp::TablesRow(tables.insert(&row)?));

        let mut columns = self.catalog.columns();
        for def in &statement.columns {
            let mut row = Row::new();
            row.insert("table_name".to_string(), Value::from(table_name.as_str()));
            row.insert("column_name".to_string(), Value::from(def.name.as_str()));
            row.insert(
                "data_type".to_string(),
                Value::from(def.data_type.as_str()),
            );
            undo.push(UndoOp::ColumnsRow(columns.insert(&row)?));
        }

        // Finally, actually create the relation.
        let mut table = HeapTable::new(
            self.catalog.env(),
            table_name,
            statement.columns.iter().map(|c| c.name.clone()).collect(),
            statement.columns.iter().map(|c| c.data_type).collect(),
        );
        if statement.if_not_exists {
            table.create_if_not_exists()?;
        } else {
            table.create()?;
        }

        Ok(QueryResult::with_message(format!("created {}", table_name)))
    }

    fn create_index(&self, statement: &CreateIndexStatement) -> Result<QueryResult> {
        let table = self.catalog.relation(&statement.table_name)?;

        // Every referenced column must exist on the target table.
        for column in &statement.columns {
            if !table.column_names().contains(column) {
                return Err(Error::NotFound(format!(
                    "column '{}' does not exist in {}",
                    column, statement.table_name
                )));
            }
        }
        if self
            .catalog
            .index_names(&statement.table_name)?
            .contains(&statement.index_name)
        {
            return Err(Error::Conflict(format!(
                "index '{}' already exists on {}",
                statement.index_name, statement.table_name
            )));
        }

        let mut undo = Vec::new();
        match self.create_index_steps(statement, &mut undo) {
            Ok(result) => {
                info!(index = %statement.index_name, table = %statement.table_name, "created index");
                Ok(result)
            }
            Err(e) => {
                self.compensate(undo);
                Err(e)
            }
        }
    }

    fn create_index_steps(
        &self,
        statement: &CreateIndexStatement,
        undo: &mut Vec<UndoOp>,
    ) -> Result<QueryResult> {
        // BTREE indices are unique, anything else is not
        let is_unique = statement.index_type == "BTREE";

        let mut indices = self.catalog.indices();
        for (seq, column) in statement.columns.iter().enumerate() {
            let mut row = Row::new();
            row.insert(
                "table_name".to_string(),
                Value::from(statement.table_name.as_str()),
            );
            row.insert(
                "index_name".to_string(),
                Value::from(statement.index_name.as_str()),
            );
            row.insert("seq_in_index".to_string(), Value::Int(seq as i32 + 1));
            row.insert("column_name".to_string(), Value::from(column.as_str()));
            row.insert(
                "index_type".to_string(),
                Value::from(statement.index_type.as_str()),
            );
            row.insert("is_unique".to_string(), Value::Bool(is_unique));
            undo.push(UndoOp::IndicesRow(indices.insert(&row)?));
        }

        let mut index = self
            .catalog
            .index(&statement.table_name, &statement.index_name);
        if let Err(e) = index.create() {
            let _ = index.destroy();
            return Err(e);
        }

        Ok(QueryResult::with_message(format!(
            "created index {}",
            statement.index_name
        )))
    }

    /// Run recorded undo steps in reverse, swallowing their errors so
    /// the original failure is what surfaces
    fn compensate(&self, undo: Vec<UndoOp>) {
        for op in undo.into_iter().rev() {
            let outcome = match op {
                UndoOp::TablesRow(handle) => self.catalog.tables().delete(handle),
                UndoOp::ColumnsRow(handle) => self.catalog.columns().delete(handle),
                UndoOp::IndicesRow(handle) => self.catalog.indices().delete(handle),
            };
            if let Err(e) = outcome {
                warn!(error = %e, "compensation step failed");
            }
        }
    }

    // ========== DROP ==========

    fn drop_table(&self, statement: &DropTableStatement) -> Result<QueryResult> {
        let table_name = &statement.table_name;
        if Catalog::is_meta_table(table_name) {
            return Err(Error::Conflict("cannot drop a schema table".to_string()));
        }
        let mut table = self.catalog.relation(table_name)?;

        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(table_name.as_str()));

        // Drop any indices first.
        for index_name in self.catalog.index_names(table_name)? {
            self.catalog.index(table_name, &index_name).destroy()?;
        }
        let mut indices = self.catalog.indices();
        for handle in select_handles(&mut indices, &predicate)? {
            indices.delete(handle)?;
        }

        let mut columns = self.catalog.columns();
        for handle in select_handles(&mut columns, &predicate)? {
            columns.delete(handle)?;
        }

        // The data goes away between the _columns and _tables
        // deletions; this order is part of the contract.
        table.destroy()?;

        let mut tables = self.catalog.tables();
        for handle in select_handles(&mut tables, &predicate)? {
            tables.delete(handle)?;
        }

        info!(table = %table_name, "dropped table");
        Ok(QueryResult::with_message(format!("dropped {}", table_name)))
    }

    fn drop_index(&self, statement: &DropIndexStatement) -> Result<QueryResult> {
        if !self
            .catalog
            .index_names(&statement.table_name)?
            .contains(&statement.index_name)
        {
            return Err(Error::NotFound(format!(
                "index '{}' does not exist on {}",
                statement.index_name, statement.table_name
            )));
        }

        self.catalog
            .index(&statement.table_name, &statement.index_name)
            .destroy()?;

        let mut predicate = Row::new();
        predicate.insert(
            "table_name".to_string(),
            Value::from(statement.table_name.as_str()),
        );
        predicate.insert(
            "index_name".to_string(),
            Value::from(statement.index_name.as_str()),
        );
        let mut indices = self.catalog.indices();
        for handle in select_handles(&mut indices, &predicate)? {
            indices.delete(handle)?;
        }

        info!(index = %statement.index_name, "dropped index");
        Ok(QueryResult::with_message(format!(
            "dropped index {}",
            statement.index_name
        )))
    }

    // ========== SHOW ==========

    fn show(&self, statement: &ShowStatement) -> Result<QueryResult> {
        match statement {
            ShowStatement::Tables => self.show_tables(),
            ShowStatement::Columns { table_name } => self.show_columns(table_name),
            ShowStatement::Index { table_name } => self.show_index(table_name),
        }
    }

    fn show_tables(&self) -> Result<QueryResult> {
        let column_names = vec!["table_name".to_string()];
        let column_attributes = vec![DataType::Text];

        let mut tables = self.catalog.tables();
        let handles = tables.select()?;
        let count = handles.len().saturating_sub(3);

        let mut rows = Vec::new();
        for handle in handles {
            let row = tables.project_columns(handle, &column_names)?;
            let keep = row
                .get("table_name")
                .and_then(Value::as_text)
                .is_some_and(|name| !Catalog::is_meta_table(name));
            if keep {
                rows.push(row);
            }
        }
        Ok(QueryResult::with_rows(
            column_names,
            column_attributes,
            rows,
            format!("successfully returned {} rows", count),
        ))
    }

    fn show_columns(&self, table_name: &str) -> Result<QueryResult> {
        let column_names = vec![
            "table_name".to_string(),
            "column_name".to_string(),
            "data_type".to_string(),
        ];
        let column_attributes = vec![DataType::Text, DataType::Text, DataType::Text];

        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(table_name));
        let mut columns = self.catalog.columns();
        let handles = select_handles(&mut columns, &predicate)?;

        let mut rows = Vec::new();
        for handle in &handles {
            rows.push(columns.project_columns(*handle, &column_names)?);
        }
        Ok(QueryResult::with_rows(
            column_names,
            column_attributes,
            rows,
            format!("successfully returned {} rows", handles.len()),
        ))
    }

    fn show_index(&self, table_name: &str) -> Result<QueryResult> {
        let column_names = vec![
            "table_name".to_string(),
            "index_name".to_string(),
            "column_name".to_string(),
            "seq_in_index".to_string(),
            "index_type".to_string(),
            "is_unique".to_string(),
        ];
        let column_attributes = vec![
            DataType::Text,
            DataType::Text,
            DataType::Text,
            DataType::Int,
            DataType::Text,
            DataType::Boolean,
        ];

        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(table_name));
        let mut indices = self.catalog.indices();
        let handles = select_handles(&mut indices, &predicate)?;

        let mut rows = Vec::new();
        for handle in &handles {
            rows.push(indices.project_columns(*handle, &column_names)?);
        }
        Ok(QueryResult::with_rows(
            column_names,
            column_attributes,
            rows,
            format!("successfully returned {} rows", handles.len()),
        ))
    }

    // ========== INSERT ==========

    fn insert(&self, statement: &InsertStatement) -> Result<QueryResult> {
        let table_name = &statement.table_name;
        if !self.catalog.table_exists(table_name)? {
            return Err(Error::NotFound(format!(
                "table '{}' does not exist",
                table_name
            )));
        }
        let mut table = self.catalog.relation(table_name)?;
        let all_columns = table.column_names().to_vec();

        let column_names = match &statement.columns {
            Some(columns) => {
                if columns.len() > all_columns.len() {
                    return Err(Error::ParseShape(format!(
                        "insert lists {} columns but {} has only {}",
                        columns.len(),
                        table_name,
                        all_columns.len()
                    )));
                }
                if columns.len() < all_columns.len() {
                    return Err(Error::Unsupported(
                        "don't know how to handle NULLs, defaults, etc. yet".to_string(),
                    ));
                }
                for column in columns {
                    if !all_columns.contains(column) {
                        return Err(Error::NotFound(format!(
                            "column '{}' does not exist in {}",
                            column, table_name
                        )));
                    }
                }
                columns.clone()
            }
            None => all_columns,
        };

        let mut handles = Vec::new();
        for values in &statement.values {
            if values.len() != column_names.len() {
                return Err(Error::ParseShape(format!(
                    "row has {} values for {} columns",
                    values.len(),
                    column_names.len()
                )));
            }
            let mut row = Row::new();
            for (column, literal) in column_names.iter().zip(values) {
                row.insert(column.clone(), literal_value(literal)?);
            }
            handles.push(table.insert(&row)?);
        }

        let index_names = self.catalog.index_names(table_name)?;
        for index_name in &index_names {
            let mut index = self.catalog.index(table_name, index_name);
            for handle in &handles {
                index.insert(*handle)?;
            }
        }

        Ok(QueryResult::with_message(format!(
            "successfully inserted {} rows into {} and {} indices",
            handles.len(),
            table_name,
            index_names.len()
        )))
    }

    // ========== DELETE ==========

    fn delete(&self, statement: &DeleteStatement) -> Result<QueryResult> {
        let table_name = &statement.table_name;
        if !self.catalog.table_exists(table_name)? {
            return Err(Error::NotFound(format!(
                "table '{}' does not exist",
                table_name
            )));
        }
        let mut table = self.catalog.relation(table_name)?;
        let all_columns = table.column_names().to_vec();

        let mut plan = EvalPlan::TableScan;
        if let Some(expr) = &statement.where_clause {
            plan = plan.select(where_conjunction(expr, &all_columns)?);
        }
        let handles = plan.optimize().pipeline(&mut table)?;

        let index_names = self.catalog.index_names(table_name)?;
        for handle in &handles {
            for index_name in &index_names {
                self.catalog.index(table_name, index_name).delete(*handle)?;
            }
        }
        for handle in &handles {
            table.delete(*handle)?;
        }

        Ok(QueryResult::with_message(format!(
            "successfully deleted {} rows from {} and {} indices",
            handles.len(),
            table_name,
            index_names.len()
        )))
    }

    // ========== SELECT ==========

    fn select(&self, statement: &SelectStatement) -> Result<QueryResult> {
        let table_name = &statement.table_name;
        if !self.catalog.table_exists(table_name)? {
            return Err(Error::NotFound(format!(
                "table '{}' does not exist",
                table_name
            )));
        }
        let mut table = self.catalog.relation(table_name)?;
        let all_columns = table.column_names().to_vec();

        let mut plan = EvalPlan::TableScan;
        // The conjunction may reference any column of the relation,
        // not just the projected ones.
        if let Some(expr) = &statement.where_clause {
            plan = plan.select(where_conjunction(expr, &all_columns)?);
        }

        let column_names = match &statement.projection {
            Projection::Wildcard => all_columns,
            Projection::Columns(columns) => columns.clone(),
        };
        let column_attributes = table.attributes_for(&column_names)?;

        let rows = plan
            .project(column_names.clone())
            .optimize()
            .evaluate(&mut table)?;
        let count = rows.len();
        Ok(QueryResult::with_rows(
            column_names,
            column_attributes,
            rows,
            format!("successfully returned {} rows", count),
        ))
    }
}

/// Fold a where-clause expression into a conjunction of
/// column = literal equalities
fn where_conjunction(expr: &Expr, column_names: &[Identifier]) -> Result<Row> {
    match expr {
        Expr::And(left, right) => {
            let mut row = where_conjunction(left, column_names)?;
            for (column, value) in where_conjunction(right, column_names)? {
                row.insert(column, value);
            }
            Ok(row)
        }
        Expr::Or(_, _) => Err(Error::Unsupported(
            "only AND conjunctions are supported".to_string(),
        )),
        Expr::Comparison { column, op, value } => {
            if *op != BinaryOperator::Eq {
                return Err(Error::Unsupported(
                    "only equality predicates are supported".to_string(),
                ));
            }
            if !column_names.contains(column) {
                return Err(Error::NotFound(format!(
                    "unknown column '{}' in where clause",
                    column
                )));
            }
            let mut row = Row::new();
            row.insert(column.clone(), literal_value(value)?);
            Ok(row)
        }
    }
}

/// Turn a parsed literal into a stored value
fn literal_value(literal: &Literal) -> Result<Value> {
    match literal {
        Literal::Integer(n) => i32::try_from(*n)
            .map(Value::Int)
            .map_err(|_| Error::Unsupported(format!("integer literal {} out of range", n))),
        Literal::String(s) => Ok(Value::Text(s.clone())),
        Literal::Boolean(b) => Ok(Value::Bool(*b)),
        Literal::Float(_) => Err(Error::Unsupported(
            "DOUBLE values are not supported".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Parser;
    use crate::storage::DbEnv;
    use tempfile::tempdir;

    fn executor(dir: &tempfile::TempDir) -> Executor {
        let env = DbEnv::open(dir.path()).unwrap();
        Executor::new(Catalog::open(env).unwrap())
    }

    fn run(executor: &mut Executor, sql: &str) -> Result<QueryResult> {
        let statement = Parser::new(sql).unwrap().parse().unwrap();
        executor.execute(&statement)
    }

    #[test]
    fn test_create_and_show_columns() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        let result = run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        assert_eq!(result.message, "created foo");

        let result = run(&mut executor, "SHOW COLUMNS FROM foo").unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("column_name"), Some(&Value::from("a")));
        assert_eq!(rows[0].get("data_type"), Some(&Value::from("INT")));
        assert_eq!(rows[1].get("column_name"), Some(&Value::from("b")));
        assert_eq!(rows[1].get("data_type"), Some(&Value::from("TEXT")));
    }

    #[test]
    fn test_create_duplicate_conflicts() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        assert!(matches!(
            run(&mut executor, "CREATE TABLE foo (a INT)"),
            Err(Error::Conflict(_))
        ));

        // IF NOT EXISTS tolerates the duplicate.
        let result = run(&mut executor, "CREATE TABLE IF NOT EXISTS foo (a INT)").unwrap();
        assert!(result.message.contains("already exists"));
    }

    #[test]
    fn test_show_tables_hides_meta() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        let result = run(&mut executor, "SHOW TABLES").unwrap();
        assert_eq!(result.message, "successfully returned 0 rows");
        assert!(result.rows.unwrap().is_empty());

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        run(&mut executor, "CREATE TABLE bar (b TEXT)").unwrap();

        let result = run(&mut executor, "SHOW TABLES").unwrap();
        assert_eq!(result.message, "successfully returned 2 rows");
        assert_eq!(result.rows.unwrap().len(), 2);
    }

    #[test]
    fn test_insert_and_select_star() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        let result = run(&mut executor, "INSERT INTO foo VALUES (12, 'Hello!')").unwrap();
        assert_eq!(
            result.message,
            "successfully inserted 1 rows into foo and 0 indices"
        );

        let result = run(&mut executor, "SELECT * FROM foo").unwrap();
        assert_eq!(result.column_names.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(
            result.column_attributes.as_deref(),
            Some(&[DataType::Int, DataType::Text][..])
        );
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&Value::Int(12)));
        assert_eq!(rows[0].get("b"), Some(&Value::from("Hello!")));
    }

    #[test]
    fn test_select_with_where_and_projection() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        run(
            &mut executor,
            "INSERT INTO foo VALUES (1, 'x'), (2, 'y'), (2, 'z')",
        )
        .unwrap();

        let result = run(&mut executor, "SELECT b FROM foo WHERE a = 2").unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), 1);
            assert!(row.contains_key("b"));
        }

        let result = run(&mut executor, "SELECT * FROM foo WHERE a = 2 AND b = 'z'").unwrap();
        assert_eq!(result.rows.unwrap().len(), 1);
    }

    #[test]
    fn test_delete_with_where() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        run(
            &mut executor,
            "INSERT INTO foo VALUES (1, 'x'), (2, 'y'), (3, 'z')",
        )
        .unwrap();

        let result = run(&mut executor, "DELETE FROM foo WHERE a = 2").unwrap();
        assert_eq!(
            result.message,
            "successfully deleted 1 rows from foo and 0 indices"
        );

        let result = run(&mut executor, "SELECT * FROM foo").unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 2);
        let mut remaining: Vec<i32> = rows
            .iter()
            .map(|r| r.get("a").and_then(Value::as_int).unwrap())
            .collect();
        remaining.sort_unstable();
        assert_eq!(remaining, vec![1, 3]);
    }

    #[test]
    fn test_delete_without_where_empties_table() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        run(&mut executor, "INSERT INTO foo VALUES (1), (2)").unwrap();
        run(&mut executor, "DELETE FROM foo").unwrap();

        let result = run(&mut executor, "SELECT * FROM foo").unwrap();
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_create_index_and_show_index() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        let result = run(&mut executor, "CREATE INDEX ix ON foo (a)").unwrap();
        assert_eq!(result.message, "created index ix");

        let result = run(&mut executor, "SHOW INDEX FROM foo").unwrap();
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
    fn test_create_index_multi_column_sequence() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT, c INT)").unwrap();
        run(&mut executor, "CREATE INDEX ix ON foo (c, a)").unwrap();

        let result = run(&mut executor, "SHOW INDEX FROM foo").unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("column_name"), Some(&Value::from("c")));
        assert_eq!(rows[0].get("seq_in_index"), Some(&Value::Int(1)));
        assert_eq!(rows[1].get("column_name"), Some(&Value::from("a")));
        assert_eq!(rows[1].get("seq_in_index"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_create_index_unknown_column() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        assert!(matches!(
            run(&mut executor, "CREATE INDEX ix ON foo (nope)"),
            Err(Error::NotFound(_))
        ));
        // Nothing may be left behind in _indices.
        let result = run(&mut executor, "SHOW INDEX FROM foo").unwrap();
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_drop_index() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        run(&mut executor, "CREATE INDEX ix ON foo (a)").unwrap();
        let result = run(&mut executor, "DROP INDEX ix ON foo").unwrap();
        assert_eq!(result.message, "dropped index ix");

        let result = run(&mut executor, "SHOW INDEX FROM foo").unwrap();
        assert!(result.rows.unwrap().is_empty());

        assert!(matches!(
            run(&mut executor, "DROP INDEX ix ON foo"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_drop_table_removes_everything() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        run(&mut executor, "CREATE INDEX ix ON foo (a)").unwrap();
        run(&mut executor, "INSERT INTO foo VALUES (1, 'x')").unwrap();

        let result = run(&mut executor, "DROP TABLE foo").unwrap();
        assert_eq!(result.message, "dropped foo");

        let result = run(&mut executor, "SHOW COLUMNS FROM foo").unwrap();
        assert!(result.rows.unwrap().is_empty());
        let result = run(&mut executor, "SHOW INDEX FROM foo").unwrap();
        assert!(result.rows.unwrap().is_empty());
        assert!(matches!(
            run(&mut executor, "SELECT * FROM foo"),
            Err(Error::NotFound(_))
        ));
        assert!(!dir.path().join("foo.db").exists());
    }

    #[test]
    fn test_drop_meta_table_rejected() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        assert!(matches!(
            run(&mut executor, "DROP TABLE _tables"),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_insert_unknown_table() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        assert!(matches!(
            run(&mut executor, "INSERT INTO ghost VALUES (1)"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_insert_column_subset_unsupported() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        assert!(matches!(
            run(&mut executor, "INSERT INTO foo (a) VALUES (1)"),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_insert_explicit_columns_reordered() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        run(&mut executor, "INSERT INTO foo (b, a) VALUES ('x', 1)").unwrap();

        let result = run(&mut executor, "SELECT * FROM foo").unwrap();
        let rows = result.rows.unwrap();
        assert_eq!(rows[0].get("a"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get("b"), Some(&Value::from("x")));
    }

    #[test]
    fn test_where_rejects_non_equality() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT)").unwrap();
        assert!(matches!(
            run(&mut executor, "SELECT * FROM foo WHERE a > 1"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            run(&mut executor, "SELECT * FROM foo WHERE a = 1 OR a = 2"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            run(&mut executor, "SELECT * FROM foo WHERE nope = 1"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_query_result_display() {
        let dir = tempdir().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE foo (a INT, b TEXT)").unwrap();
        run(&mut executor, "INSERT INTO foo VALUES (12, 'Hello!')").unwrap();
        let result = run(&mut executor, "SELECT * FROM foo").unwrap();

        let printed = result.to_string();
        assert!(printed.contains("a b "));
        assert!(printed.contains("12 \"Hello!\" "));
        assert!(printed.ends_with("successfully returned 1 rows"));
    }
}
