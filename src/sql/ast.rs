//! SQL Abstract Syntax Tree (AST)
//!
//! This module defines the AST nodes for the restricted SQL dialect
//! the engine executes. A parsed statement is already validated in
//! shape; the executor only interprets it.

use crate::storage::{DataType, Identifier};

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// CREATE INDEX statement
    CreateIndex(CreateIndexStatement),
    /// DROP TABLE statement
    DropTable(DropTableStatement),
    /// DROP INDEX statement
    DropIndex(DropIndexStatement),
    /// SHOW statement
    Show(ShowStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// DELETE statement
    Delete(DeleteStatement),
    /// SELECT statement
    Select(SelectStatement),
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name
    pub table_name: Identifier,
    /// Column definitions
    pub columns: Vec<ColumnDef>,
    /// IF NOT EXISTS flag
    pub if_not_exists: bool,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: Identifier,
    /// Data type
    pub data_type: DataType,
}

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Index name
    pub index_name: Identifier,
    /// Table name
    pub table_name: Identifier,
    /// Indexed columns, in index order
    pub columns: Vec<Identifier>,
    /// Index type from USING, defaulting to BTREE
    pub index_type: String,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name
    pub table_name: Identifier,
}

/// DROP INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexStatement {
    /// Index name
    pub index_name: Identifier,
    /// Table the index belongs to
    pub table_name: Identifier,
}

/// SHOW statement
#[derive(Debug, Clone, PartialEq)]
pub enum ShowStatement {
    /// SHOW TABLES
    Tables,
    /// SHOW COLUMNS FROM table
    Columns { table_name: Identifier },
    /// SHOW INDEX FROM table
    Index { table_name: Identifier },
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name
    pub table_name: Identifier,
    /// Column names (optional)
    pub columns: Option<Vec<Identifier>>,
    /// Rows of literal values
    pub values: Vec<Vec<Literal>>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name
    pub table_name: Identifier,
    /// WHERE clause
    pub where_clause: Option<Expr>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Projected columns
    pub projection: Projection,
    /// Source table
    pub table_name: Identifier,
    /// WHERE clause
    pub where_clause: Option<Expr>,
}

/// The select list: either `*` or named columns
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// All columns (*)
    Wildcard,
    /// Named columns
    Columns(Vec<Identifier>),
}

/// A where-clause expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// column op literal
    Comparison {
        column: Identifier,
        op: BinaryOperator,
        value: Literal,
    },
    /// AND conjunction
    And(Box<Expr>, Box<Expr>),
    /// OR connective (parsed, rejected by the executor)
    Or(Box<Expr>, Box<Expr>),
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer
    Integer(i64),
    /// Float (parsed, rejected by the executor)
    Float(f64),
    /// String
    String(String),
    /// TRUE or FALSE
    Boolean(bool),
}
