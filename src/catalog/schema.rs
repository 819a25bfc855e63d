//! Table and column metadata
//!
//! This module defines the persisted shape of the catalog: tables and their
//! columns. The serde renames pin the on-disk JSON field names, which are
//! part of the schema file format.

use super::types::DataType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A column definition in a table
///
/// The ID is assigned once at table creation and never changes; the row
/// format refers to columns by ID, not by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub data_type: DataType,
}

/// A column requested by a CREATE TABLE statement, before an ID is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
}

/// Table metadata: ID, name, and the ordered column list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Columns")]
    pub columns: Vec<Column>,
}

impl TableDef {
    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Path of this table's row file under the given root directory
    pub fn file_path(&self, root_dir: &Path) -> PathBuf {
        root_dir.join(self.id.to_string())
    }
}
