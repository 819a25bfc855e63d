//! Statement and clause model
//!
//! A statement is an ordered list of clauses; each clause pairs a keyword
//! with a typed body. The bodies form a closed enum rather than a dynamic
//! box, so statement handlers match instead of downcasting.

use crate::catalog::ColumnSpec;
use crate::eval::Expr;
use std::fmt;

/// Clause keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Select,
    From,
    Where,
    CreateTable,
    Definitions,
    InsertInto,
    Values,
}

impl ClauseKind {
    /// Map a normalized clause lexeme to its kind
    pub fn from_keyword(keyword: &str) -> Option<ClauseKind> {
        match keyword {
            "select" => Some(ClauseKind::Select),
            "from" => Some(ClauseKind::From),
            "where" => Some(ClauseKind::Where),
            "create table" => Some(ClauseKind::CreateTable),
            "definitions" => Some(ClauseKind::Definitions),
            "insert into" => Some(ClauseKind::InsertInto),
            "values" => Some(ClauseKind::Values),
            _ => None,
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            ClauseKind::Select => "SELECT",
            ClauseKind::From => "FROM",
            ClauseKind::Where => "WHERE",
            ClauseKind::CreateTable => "CREATE TABLE",
            ClauseKind::Definitions => "DEFINITIONS",
            ClauseKind::InsertInto => "INSERT INTO",
            ClauseKind::Values => "VALUES",
        };
        write!(f, "{}", keyword)
    }
}

/// Typed clause body
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseBody {
    /// SELECT: the projection expressions
    Projections(Vec<Expr>),
    /// FROM / CREATE TABLE / INSERT INTO: a table name
    TableName(String),
    /// WHERE: the filter predicate
    Predicate(Expr),
    /// DEFINITIONS: column name/type pairs
    Definitions(Vec<ColumnSpec>),
    /// VALUES: raw literal strings, typed on insert
    Values(Vec<String>),
}

/// A single clause of a statement
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub body: ClauseBody,
}

/// A parsed statement: an ordered list of clauses
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub clauses: Vec<Clause>,
}

impl Statement {
    /// Find the first clause of the given kind
    pub fn clause(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.kind == kind)
    }
}
