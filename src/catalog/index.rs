//! Index objects for stratadb
//!
//! The catalog records which indices exist; physical index structures
//! are not maintained. A `DbIndex` is the interface the executor
//! drives for every declared index: creation, removal, and row
//! maintenance are accepted and recorded in the log only.

use tracing::debug;

use crate::error::Result;
use crate::storage::{Handle, Identifier};

/// An index declared on a table
#[derive(Debug, Clone)]
pub struct DbIndex {
    table_name: Identifier,
    index_name: Identifier,
}

impl DbIndex {
    pub fn new(table_name: &str, index_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Build the physical index structure
    pub fn create(&mut self) -> Result<()> {
        debug!(table = %self.table_name, index = %self.index_name, "create index");
        Ok(())
    }

    /// Remove the physical index structure
    pub fn destroy(&mut self) -> Result<()> {
        debug!(table = %self.table_name, index = %self.index_name, "drop index");
        Ok(())
    }

    /// Add the row at the given handle to the index
    pub fn insert(&mut self, handle: Handle) -> Result<()> {
        debug!(index = %self.index_name, %handle, "index insert");
        Ok(())
    }

    /// Remove the row at the given handle from the index
    pub fn delete(&mut self, handle: Handle) -> Result<()> {
        debug!(index = %self.index_name, %handle, "index delete");
        Ok(())
    }
}
