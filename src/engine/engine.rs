//! Statement execution engine
//!
//! This module drives a batch from text to effects: parse, validate,
//! dispatch to the CREATE TABLE / INSERT INTO / SELECT handlers. Rows that
//! survive a SELECT predicate are written to the caller's output sink as
//! one JSON object per row.

use log::{debug, info};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;
use std::path::PathBuf;

use crate::catalog::{Catalog, ColumnSpec};
use crate::error::{Error, Result};
use crate::eval::{evaluate, Expr, Value};
use crate::sql::{ClauseBody, ClauseKind, Parser, Statement};
use crate::storage::{CancellationToken, Table};

/// The database engine: a catalog plus statement dispatch
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
}

impl Engine {
    /// Open the database rooted at a directory, creating it if needed
    pub fn initialize(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        std::fs::create_dir_all(&root_dir)?;

        Ok(Self {
            catalog: Catalog::open(root_dir)?,
        })
    }

    /// The engine's catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Persist the catalog; called once when the process is done
    pub fn shutdown(&self) -> Result<()> {
        self.catalog.save()
    }

    /// Parse and execute a batch of statements
    ///
    /// The batch stops at the first failing statement. Errors hit while
    /// reading individual rows of a SELECT are written to `out` instead;
    /// see [`Engine::select_statement`].
    pub fn run(
        &self,
        cancel: &CancellationToken,
        out: &mut impl Write,
        batch: &str,
    ) -> Result<()> {
        let statements = Parser::new(batch)?.parse()?;

        if statements.is_empty() {
            return Err(Error::EmptyBatch);
        }

        for (i, statement) in statements.iter().enumerate() {
            let number = i + 1;
            debug!("executing statement #{}", number);

            let first = statement
                .clauses
                .first()
                .ok_or(Error::EmptyStatement(number))?;

            match first.kind {
                ClauseKind::CreateTable => self.create_table_statement(statement)?,
                ClauseKind::InsertInto => self.insert_statement(statement)?,
                ClauseKind::Select => self.select_statement(cancel, out, statement)?,
                _ => return Err(Error::InvalidStatement(number)),
            }
        }

        Ok(())
    }

    // ========== Statement Handlers ==========

    fn create_table_statement(&self, statement: &Statement) -> Result<()> {
        let mut table_name: Option<&str> = None;
        let mut definitions: Option<&[ColumnSpec]> = None;

        for clause in &statement.clauses {
            match (clause.kind, &clause.body) {
                (ClauseKind::CreateTable, ClauseBody::TableName(name)) => {
                    table_name = Some(name);
                }
                (ClauseKind::Definitions, ClauseBody::Definitions(specs)) => {
                    definitions = Some(specs);
                }
                _ => {}
            }
        }

        let name = table_name.ok_or(Error::MissingClause("CREATE TABLE"))?;
        let specs = definitions.ok_or(Error::MissingClause("DEFINITIONS"))?;

        let def = self.catalog.create_table(name, specs)?;
        info!("created table '{}' ({} columns)", name, def.columns.len());

        Ok(())
    }

    fn insert_statement(&self, statement: &Statement) -> Result<()> {
        let mut table_name: Option<&str> = None;
        let mut values: Option<&[String]> = None;

        for clause in &statement.clauses {
            match (clause.kind, &clause.body) {
                (ClauseKind::InsertInto, ClauseBody::TableName(name)) => {
                    table_name = Some(name);
                }
                (ClauseKind::Values, ClauseBody::Values(v)) => {
                    values = Some(v);
                }
                _ => {}
            }
        }

        let name = table_name.ok_or(Error::MissingClause("INSERT INTO"))?;
        let values = values.ok_or(Error::MissingClause("VALUES"))?;

        let def = self
            .catalog
            .get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;

        Table::new(def, self.catalog.root_dir()).insert(values)
    }

    /// Stream the table, filter by the predicate, and write surviving rows
    ///
    /// Cancellation and I/O failures from the scan abort the batch. A row
    /// that fails to decode or evaluate writes its error message to `out`
    /// and ends this SELECT without failing the batch.
    fn select_statement(
        &self,
        cancel: &CancellationToken,
        out: &mut impl Write,
        statement: &Statement,
    ) -> Result<()> {
        let mut projections: Option<&[Expr]> = None;
        let mut table_name: Option<&str> = None;
        let mut predicate: Option<&Expr> = None;

        for clause in &statement.clauses {
            match (clause.kind, &clause.body) {
                (ClauseKind::Select, ClauseBody::Projections(exprs)) => {
                    projections = Some(exprs);
                }
                (ClauseKind::From, ClauseBody::TableName(name)) => {
                    table_name = Some(name);
                }
                (ClauseKind::Where, ClauseBody::Predicate(expr)) => {
                    predicate = Some(expr);
                }
                _ => {}
            }
        }

        let projections = projections.ok_or(Error::MissingClause("SELECT"))?;
        let name = table_name.ok_or(Error::MissingClause("FROM"))?;

        let columns = projected_columns(projections)?;

        let def = self
            .catalog
            .get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;

        for &column in &columns {
            if def.column(column).is_none() {
                return Err(Error::UnknownIdentifier(column.to_string()));
            }
        }

        let table = Table::new(def, self.catalog.root_dir());

        for item in table.scan(cancel)? {
            let payload = item?;

            match self.filter_row(&table, &payload, predicate, &columns) {
                Ok(Some(line)) => out.write_all(&line)?,
                Ok(None) => {}
                Err(e) => {
                    out.write_all(e.to_string().as_bytes())?;
                    out.write_all(b"\n")?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Decode and filter one row; `Ok(Some)` carries the rendered JSON line
    fn filter_row(
        &self,
        table: &Table,
        payload: &[u8],
        predicate: Option<&Expr>,
        columns: &[&str],
    ) -> Result<Option<Vec<u8>>> {
        let row = table.decode_row(payload)?;
        let env = row.env();

        if let Some(expr) = predicate {
            let keep = evaluate(expr, &env)?
                .as_bool()
                .ok_or(Error::PredicateNotBoolean)?;
            if !keep {
                return Ok(None);
            }
        }

        let projected = ProjectedRow(
            columns
                .iter()
                .filter_map(|&name| row.get(name).map(|c| (c.column.name.as_str(), &c.value)))
                .collect(),
        );

        let mut line =
            serde_json::to_vec(&projected).map_err(|e| Error::Internal(e.to_string()))?;
        line.push(b'\n');

        Ok(Some(line))
    }
}

/// Restrict projections to plain column references
fn projected_columns(projections: &[Expr]) -> Result<Vec<&str>> {
    projections
        .iter()
        .map(|expr| match expr {
            Expr::Identifier(name) => Ok(name.as_str()),
            _ => Err(Error::NonIdentifierProjection),
        })
        .collect()
}

/// One output row: projected column names paired with their values, in
/// projection order
struct ProjectedRow<'a>(Vec<(&'a str, &'a Value)>);

impl Serialize for ProjectedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
