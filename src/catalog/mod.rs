//! Catalog module
//!
//! This module contains the system catalog, table/column metadata, and data
//! types.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::Catalog;
pub use schema::{Column, ColumnSpec, TableDef};
pub use types::DataType;
