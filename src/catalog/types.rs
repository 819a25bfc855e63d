//! Column data types
//!
//! This module defines the data types a column can hold and the validation
//! of raw literal strings against them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean
    #[serde(rename = "bool")]
    Bool,
    /// 32-bit signed integer
    #[serde(rename = "int")]
    Int,
    /// UTF-8 string
    #[serde(rename = "string")]
    String,
}

impl DataType {
    /// Try to parse a data type keyword
    pub fn from_keyword(s: &str) -> Option<DataType> {
        match s {
            "bool" => Some(DataType::Bool),
            "int" => Some(DataType::Int),
            "string" => Some(DataType::String),
            _ => None,
        }
    }

    /// Check that a raw literal string is a valid value of this type
    pub fn accepts(&self, raw: &str) -> bool {
        match self {
            DataType::Bool => raw.parse::<bool>().is_ok(),
            DataType::Int => raw.parse::<i32>().is_ok(),
            DataType::String => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "bool"),
            DataType::Int => write!(f, "int"),
            DataType::String => write!(f, "string"),
        }
    }
}
