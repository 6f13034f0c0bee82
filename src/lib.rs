//! stratadb - A minimal heap-storage relational database engine
//!
//! This library provides the core components for a small SQL database:
//! - SQL parsing (lexer, parser, AST)
//! - Heap storage (slotted pages, block files, heap tables)
//! - A self-describing schema catalog
//! - Query execution (evaluation plans, statement executor)

pub mod catalog;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
