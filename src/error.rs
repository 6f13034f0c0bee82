//! Error types for stratadb
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for stratadb
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    // ========== Schema Errors ==========
    #[error("Schema error: {0}")]
    NotFound(String),

    #[error("Schema error: {0}")]
    Conflict(String),

    // ========== Relation Errors ==========
    #[error("Relation error: row is missing declared column '{0}'")]
    MissingColumn(String),

    #[error("Relation error: marshalled row of {0} bytes cannot fit in any block")]
    RowTooLarge(usize),

    // ========== Block Errors ==========
    #[error("Block error: not enough room for record of {0} bytes")]
    NoRoom(usize),

    // ========== Statement Errors ==========
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("malformed clause: {0}")]
    ParseShape(String),

    // ========== Storage Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for stratadb operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("table 'users' does not exist".to_string());
        assert_eq!(err.to_string(), "Schema error: table 'users' does not exist");

        let err = Error::NoRoom(512);
        assert_eq!(
            err.to_string(),
            "Block error: not enough room for record of 512 bytes"
        );

        let err = Error::MissingColumn("id".to_string());
        assert_eq!(
            err.to_string(),
            "Relation error: row is missing declared column 'id'"
        );
    }
}
