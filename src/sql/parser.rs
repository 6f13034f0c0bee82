//! SQL Parser
//!
//! This module parses SQL tokens into an AST. Only the restricted
//! dialect the engine executes is accepted; recognized-but-unsupported
//! constructs (DOUBLE columns, float values in DDL) fail here with a
//! descriptive error so the executor never sees them.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::error::{Error, Result};
use crate::storage::DataType;

/// SQL Parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        // Consume optional semicolon, then insist the input is done
        if self.check(&Token::Semicolon) {
            self.advance();
        }
        if !self.check(&Token::Eof) {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: format!("{}", self.current()),
            });
        }

        Ok(stmt)
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            Token::Show => self.parse_show().map(Statement::Show),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            Token::Select => self.parse_select().map(Statement::Select),
            _ => Err(Error::UnexpectedToken {
                expected: "CREATE, DROP, SHOW, INSERT, DELETE, or SELECT".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    // ========== CREATE Statement ==========

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(&Token::Create)?;

        match self.current() {
            Token::Table => self.parse_create_table().map(Statement::CreateTable),
            Token::Index => self.parse_create_index().map(Statement::CreateIndex),
            _ => Err(Error::UnexpectedToken {
                expected: "TABLE or INDEX".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Table)?;

        let if_not_exists = if self.check(&Token::If) {
            self.advance();
            self.expect(&Token::Not)?;
            self.expect(&Token::Exists)?;
            true
        } else {
            false
        };

        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let data_type = self.parse_data_type()?;
            columns.push(ColumnDef { name, data_type });

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
            if_not_exists,
        })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement> {
        self.expect(&Token::Index)?;

        let index_name = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let columns = self.parse_identifier_list()?;
        self.expect(&Token::RParen)?;

        let index_type = if self.check(&Token::Using) {
            self.advance();
            self.expect_identifier()?
        } else {
            "BTREE".to_string()
        };

        Ok(CreateIndexStatement {
            index_name,
            table_name,
            columns,
            index_type,
        })
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let data_type = match self.current() {
            Token::Int | Token::Integer => DataType::Int,
            Token::Text => DataType::Text,
            Token::Double => {
                return Err(Error::Unsupported(
                    "DOUBLE columns are not supported".to_string(),
                ))
            }
            Token::Boolean => {
                return Err(Error::Unsupported(
                    "BOOLEAN columns are not supported".to_string(),
                ))
            }
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "INT or TEXT".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(data_type)
    }

    // ========== DROP Statement ==========

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(&Token::Drop)?;

        match self.current() {
            Token::Table => {
                self.advance();
                let table_name = self.expect_identifier()?;
                Ok(Statement::DropTable(DropTableStatement { table_name }))
            }
            Token::Index => {
                self.advance();
                let index_name = self.expect_identifier()?;
                self.expect(&Token::On)?;
                let table_name = self.expect_identifier()?;
                Ok(Statement::DropIndex(DropIndexStatement {
                    index_name,
                    table_name,
                }))
            }
            _ => Err(Error::UnexpectedToken {
                expected: "TABLE or INDEX".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    // ========== SHOW Statement ==========

    fn parse_show(&mut self) -> Result<ShowStatement> {
        self.expect(&Token::Show)?;

        match self.current().clone() {
            Token::Tables => {
                self.advance();
                Ok(ShowStatement::Tables)
            }
            Token::Columns => {
                self.advance();
                self.expect(&Token::From)?;
                let table_name = self.expect_identifier()?;
                Ok(ShowStatement::Columns { table_name })
            }
            Token::Index => {
                self.advance();
                self.expect(&Token::From)?;
                let table_name = self.expect_identifier()?;
                Ok(ShowStatement::Index { table_name })
            }
            other => Err(Error::UnexpectedToken {
                expected: "TABLES, COLUMNS, or INDEX".to_string(),
                found: format!("{}", other),
            }),
        }
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        // Optional column list
        let columns = if self.check(&Token::LParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;

        // One or more parenthesized rows of literals
        let mut values = Vec::new();
        loop {
            self.expect(&Token::LParen)?;
            let mut row = Vec::new();
            loop {
                row.push(self.parse_literal()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance();
            }
            self.expect(&Token::RParen)?;
            values.push(row);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table_name = self.expect_identifier()?;

        let where_clause = if self.check(&Token::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let projection = if self.check(&Token::Asterisk) {
            self.advance();
            Projection::Wildcard
        } else {
            Projection::Columns(self.parse_identifier_list()?)
        };

        self.expect(&Token::From)?;
        let table_name = self.expect_identifier()?;

        let where_clause = if self.check(&Token::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(SelectStatement {
            projection,
            table_name,
            where_clause,
        })
    }

    // ========== Expression Parsing ==========

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_and_expr()?;

        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            expr = Expr::Or(Box::new(expr), Box::new(right));
        }

        Ok(expr)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_comparison()?;
            expr = Expr::And(Box::new(expr), Box::new(right));
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let column = self.expect_identifier()?;

        let op = match self.current() {
            Token::Eq => BinaryOperator::Eq,
            Token::Neq => BinaryOperator::Neq,
            Token::Lt => BinaryOperator::Lt,
            Token::Gt => BinaryOperator::Gt,
            Token::Lte => BinaryOperator::Lte,
            Token::Gte => BinaryOperator::Gte,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "comparison operator".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();

        let value = self.parse_literal()?;
        Ok(Expr::Comparison { column, op, value })
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current().clone() {
            Token::IntegerLiteral(n) => Literal::Integer(n),
            Token::FloatLiteral(n) => Literal::Float(n),
            Token::StringLiteral(s) => Literal::String(s),
            Token::True => Literal::Boolean(true),
            Token::False => Literal::Boolean(false),
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "literal value".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(literal)
    }

    // ========== Helper functions ==========

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        loop {
            names.push(self.expect_identifier()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(names)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{}", token),
                found: format!("{}", self.current()),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            Token::Eof => Err(Error::UnexpectedEof("identifier".to_string())),
            other => Err(Error::UnexpectedToken {
                expected: "identifier".to_string(),
                found: format!("{}", other),
            }),
        }
    }
}
