//! System catalog module
//!
//! This module manages metadata about tables, columns, and indices,
//! stored in self-describing heap tables.

#[allow(clippy::module_inception)]
mod catalog;
mod index;

pub use catalog::{Catalog, COLUMNS_TABLE, INDICES_TABLE, TABLES_TABLE};
pub use index::DbIndex;
