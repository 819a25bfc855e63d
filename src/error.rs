//! Error types for rowbase
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for rowbase
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unrecognized token '{lexeme}' at {line}:{column}")]
    InvalidToken {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Lexer error: invalid literal '{lexeme}' of type '{kind}' at {line}:{column}")]
    InvalidLiteral {
        lexeme: String,
        kind: String,
        line: usize,
        column: usize,
    },

    // ========== Parser Errors ==========
    #[error("Parse error: expected clause keyword, but got '{found}' at {line}:{column}")]
    ExpectedClause {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected identifier, but got '{found}' at {line}:{column}")]
    ExpectedIdentifier {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected end of statement, but got nothing")]
    UnexpectedEndOfInput,

    #[error("Parse error: unexpected comma at {line}:{column}")]
    UnexpectedComma { line: usize, column: usize },

    #[error("Parse error: invalid expression at {line}:{column}")]
    InvalidExpression { line: usize, column: usize },

    #[error("Parse error: expected opening parenthesis, but got '{found}' at {line}:{column}")]
    ExpectedOpeningParenthesis {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected column name, but got '{found}' at {line}:{column}")]
    ExpectedColumnName {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected column type, but got '{found}' at {line}:{column}")]
    ExpectedColumnType {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected comma, but got '{found}' at {line}:{column}")]
    ExpectedComma {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: definitions cannot be empty near {line}:{column}")]
    EmptyDefinitions { line: usize, column: usize },

    #[error("Parse error: expected literal, but got '{found}'")]
    ExpectedLiteral { found: String },

    #[error("Parse error: must provide values at {line}:{column}")]
    EmptyValues { line: usize, column: usize },

    #[error("Parse error: expected predicate after 'WHERE', but got nothing")]
    EmptyPredicate,

    #[error("Parse error: unexpected closing parenthesis at {line}:{column}")]
    UnbalancedClosingParenthesis { line: usize, column: usize },

    #[error(
        "Parse error: opening parenthesis at {line}:{column}, but missing its closing parenthesis"
    )]
    UnclosedParenthesis { line: usize, column: usize },

    #[error("Parse error: empty parentheses at {line}:{column}")]
    EmptyParentheses { line: usize, column: usize },

    #[error("Parse error: an operator is not allowed to be positioned at {line}:{column} after an opening parenthesis")]
    OperatorAfterOpeningParenthesis { line: usize, column: usize },

    #[error("Parse error: an operand is not allowed to be positioned at {line}:{column} after a closing parenthesis")]
    OperandAfterClosingParenthesis { line: usize, column: usize },

    #[error("Parse error: can't start expression with operator '{lexeme}' at {line}:{column}")]
    LeadingOperator {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: can't end expression with operator '{lexeme}' at {line}:{column}")]
    TrailingOperator {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected operator after '{lexeme}' at {line}:{column}")]
    ExpectedOperator {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected operand after '{lexeme}' at {line}:{column}")]
    ExpectedOperand {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: '{lexeme}' at {line}:{column} is not valid as part of an expression")]
    NotAPredicateToken {
        lexeme: String,
        line: usize,
        column: usize,
    },

    // ========== Semantic Errors ==========
    #[error("Semantic error: empty batch")]
    EmptyBatch,

    #[error("Semantic error: empty statement #{0}")]
    EmptyStatement(usize),

    #[error("Semantic error: invalid statement #{0}")]
    InvalidStatement(usize),

    #[error("Semantic error: missing {0} clause")]
    MissingClause(&'static str),

    #[error("Semantic error: only column names can be selected")]
    NonIdentifierProjection,

    // ========== Schema Errors ==========
    #[error("Schema error: table with name '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Schema error: table with name '{0}' does not exist")]
    TableNotFound(String),

    #[error("Schema error: duplicate column name '{0}'")]
    DuplicateColumn(String),

    // ========== Type Errors ==========
    #[error("Type error: table has {expected} columns, but {given} values were given")]
    WrongValueCount { expected: usize, given: usize },

    #[error("Type error: column '{column}' data type is {data_type}, value '{value}' is invalid for this column")]
    InvalidColumnValue {
        column: String,
        data_type: String,
        value: String,
    },

    #[error("Type error: value '{0}' does not exist")]
    UnknownIdentifier(String),

    #[error("Type error: both sides of a logical operation must be boolean values")]
    LogicalOperandNotBoolean,

    #[error("Type error: both sides of a comparison operation must be numbers")]
    ComparisonOperandNotNumber,

    #[error("Type error: WHERE clause must evaluate to a boolean result")]
    PredicateNotBoolean,

    // ========== Storage Errors ==========
    #[error("Storage error: read invalid amount of bytes")]
    ShortRead,

    #[error("Storage error: row is missing column '{0}'")]
    MissingColumnValue(String),

    #[error("Storage error: malformed row: {0}")]
    CorruptRow(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Cancellation ==========
    #[error("operation cancelled")]
    Cancelled,

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for rowbase operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(
            err.to_string(),
            "Schema error: table with name 'users' does not exist"
        );

        let err = Error::ExpectedIdentifier {
            found: "end_of_statement".to_string(),
            line: 1,
            column: 15,
        };
        assert_eq!(
            err.to_string(),
            "Parse error: expected identifier, but got 'end_of_statement' at 1:15"
        );

        let err = Error::UnclosedParenthesis { line: 2, column: 7 };
        assert_eq!(
            err.to_string(),
            "Parse error: opening parenthesis at 2:7, but missing its closing parenthesis"
        );
    }
}
