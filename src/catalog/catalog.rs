//! Schema catalog for stratadb
//!
//! The catalog is self-describing: metadata about every table, column,
//! and index lives in three ordinary heap tables with hard-coded
//! schemas:
//!
//! - `_tables`  (table_name)
//! - `_columns` (table_name, column_name, data_type)
//! - `_indices` (table_name, index_name, seq_in_index, column_name,
//!   index_type, is_unique)
//!
//! On first use the backing files are created and seeded with rows
//! describing the meta tables themselves.

use tracing::info;

use super::index::DbIndex;
use crate::error::{Error, Result};
use crate::executor::plan::select_handles;
use crate::storage::{DataType, DbEnv, HeapTable, Identifier, Row, Value};

/// Name of the tables meta-table
pub const TABLES_TABLE: &str = "_tables";
/// Name of the columns meta-table
pub const COLUMNS_TABLE: &str = "_columns";
/// Name of the indices meta-table
pub const INDICES_TABLE: &str = "_indices";

/// Columns of the meta tables, used both to construct the meta
/// relations and to seed `_columns` at bootstrap
const META_SCHEMA: &[(&str, &str, DataType)] = &[
    (TABLES_TABLE, "table_name", DataType::Text),
    (COLUMNS_TABLE, "table_name", DataType::Text),
    (COLUMNS_TABLE, "column_name", DataType::Text),
    (COLUMNS_TABLE, "data_type", DataType::Text),
    (INDICES_TABLE, "table_name", DataType::Text),
    (INDICES_TABLE, "index_name", DataType::Text),
    (INDICES_TABLE, "seq_in_index", DataType::Int),
    (INDICES_TABLE, "column_name", DataType::Text),
    (INDICES_TABLE, "index_type", DataType::Text),
    (INDICES_TABLE, "is_unique", DataType::Boolean),
];

/// The schema catalog: owns the three meta relations
#[derive(Debug, Clone)]
pub struct Catalog {
    env: DbEnv,
}

impl Catalog {
    /// Open the catalog over a storage environment, creating and
    /// seeding the meta tables on first use. Idempotent.
    pub fn open(env: DbEnv) -> Result<Self> {
        let catalog = Self { env };
        catalog.bootstrap()?;
        Ok(catalog)
    }

    /// The storage environment this catalog manages
    pub fn env(&self) -> &DbEnv {
        &self.env
    }

    /// The `_tables` relation
    pub fn tables(&self) -> HeapTable {
        self.meta_relation(TABLES_TABLE)
    }

    /// The `_columns` relation
    pub fn columns(&self) -> HeapTable {
        self.meta_relation(COLUMNS_TABLE)
    }

    /// The `_indices` relation
    pub fn indices(&self) -> HeapTable {
        self.meta_relation(INDICES_TABLE)
    }

    /// True if the given name is one of the three meta tables
    pub fn is_meta_table(name: &str) -> bool {
        name == TABLES_TABLE || name == COLUMNS_TABLE || name == INDICES_TABLE
    }

    /// True if `_tables` has a row for the given table
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let mut tables = self.tables();
        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(name));
        Ok(!select_handles(&mut tables, &predicate)?.is_empty())
    }

    /// Materialize the relation for the given table from its
    /// `_columns` rows. Fails with `NotFound` for an unknown table.
    pub fn relation(&self, name: &str) -> Result<HeapTable> {
        if Self::is_meta_table(name) {
            return Ok(self.meta_relation(name));
        }

        let mut columns = self.columns();
        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(name));

        let mut column_names = Vec::new();
        let mut column_attributes = Vec::new();
        for handle in select_handles(&mut columns, &predicate)? {
            let row = columns.project(handle)?;
            let column_name = row
                .get("column_name")
                .and_then(Value::as_text)
                .ok_or_else(|| Error::Storage("malformed _columns row".to_string()))?
                .to_string();
            let data_type = row
                .get("data_type")
                .and_then(Value::as_text)
                .and_then(DataType::from_str)
                .ok_or_else(|| Error::Storage("malformed _columns row".to_string()))?;
            column_names.push(column_name);
            column_attributes.push(data_type);
        }

        if column_names.is_empty() {
            return Err(Error::NotFound(format!("table '{}' does not exist", name)));
        }
        Ok(HeapTable::new(
            &self.env,
            name,
            column_names,
            column_attributes,
        ))
    }

    /// Distinct index names declared on the given table, in first
    /// occurrence order
    pub fn index_names(&self, table_name: &str) -> Result<Vec<Identifier>> {
        let mut indices = self.indices();
        let mut predicate = Row::new();
        predicate.insert("table_name".to_string(), Value::from(table_name));

        let mut names: Vec<Identifier> = Vec::new();
        for handle in select_handles(&mut indices, &predicate)? {
            let row = indices.project(handle)?;
            if let Some(name) = row.get("index_name").and_then(Value::as_text) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Materialize an index object for the given table and index name
    pub fn index(&self, table_name: &str, index_name: &str) -> DbIndex {
        DbIndex::new(table_name, index_name)
    }

    fn meta_relation(&self, name: &str) -> HeapTable {
        let (column_names, column_attributes) = META_SCHEMA
            .iter()
            .filter(|(table, _, _)| *table == name)
            .map(|(_, column, data_type)| (column.to_string(), *data_type))
            .unzip();
        HeapTable::new(&self.env, name, column_names, column_attributes)
    }

    /// Ensure the meta-table files exist; on the very first run, seed
    /// them with the rows describing the meta schema itself
    fn bootstrap(&self) -> Result<()> {
        let mut tables = self.tables();
        let mut columns = self.columns();
        let mut indices = self.indices();
        tables.create_if_not_exists()?;
        columns.create_if_not_exists()?;
        indices.create_if_not_exists()?;

        if !tables.select()?.is_empty() {
            return Ok(());
        }

        for name in [TABLES_TABLE, COLUMNS_TABLE, INDICES_TABLE] {
            let mut row = Row::new();
            row.insert("table_name".to_string(), Value::from(name));
            tables.insert(&row)?;
        }
        for (table, column, data_type) in META_SCHEMA {
            let mut row = Row::new();
            row.insert("table_name".to_string(), Value::from(*table));
            row.insert("column_name".to_string(), Value::from(*column));
            row.insert("data_type".to_string(), Value::from(data_type.as_str()));
            columns.insert(&row)?;
        }
        info!(root = %self.env.root().display(), "bootstrapped schema catalog");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bootstrap_creates_meta_tables() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        assert_eq!(catalog.tables().select().unwrap().len(), 3);
        // One _columns row per meta column.
        assert_eq!(catalog.columns().select().unwrap().len(), META_SCHEMA.len());
        assert!(catalog.indices().select().unwrap().is_empty());
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        Catalog::open(env.clone()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        assert_eq!(catalog.tables().select().unwrap().len(), 3);
    }

    #[test]
    fn test_meta_tables_exist() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        for name in [TABLES_TABLE, COLUMNS_TABLE, INDICES_TABLE] {
            assert!(catalog.table_exists(name).unwrap());
        }
        assert!(!catalog.table_exists("nope").unwrap());
    }

    #[test]
    fn test_relation_for_meta_table() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        let indices = catalog.relation(INDICES_TABLE).unwrap();
        assert_eq!(indices.column_names().len(), 6);
        assert_eq!(indices.column_attributes()[2], DataType::Int);
        assert_eq!(indices.column_attributes()[5], DataType::Boolean);
    }

    #[test]
    fn test_relation_unknown_table() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        assert!(matches!(
            catalog.relation("ghost"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_index_names_distinct_in_order() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path()).unwrap();
        let catalog = Catalog::open(env).unwrap();

        let mut indices = catalog.indices();
        for (index, seq, column) in [("ix2", 1, "a"), ("ix1", 1, "b"), ("ix2", 2, "c")] {
            let mut row = Row::new();
            row.insert("table_name".to_string(), Value::from("t"));
            row.insert("index_name".to_string(), Value::from(index));
            row.insert("seq_in_index".to_string(), Value::Int(seq));
            row.insert("column_name".to_string(), Value::from(column));
            row.insert("index_type".to_string(), Value::from("BTREE"));
            row.insert("is_unique".to_string(), Value::Bool(true));
            indices.insert(&row).unwrap();
        }

        assert_eq!(catalog.index_names("t").unwrap(), vec!["ix2", "ix1"]);
        assert!(catalog.index_names("other").unwrap().is_empty());
    }
}
