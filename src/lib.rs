//! rowbase - A minimal relational database engine written in Rust
//!
//! This library provides the core components for a small SQL-like database:
//! - SQL parsing (tokenizer, parser, expression trees)
//! - Expression evaluation over dynamically typed rows
//! - System catalog with JSON persistence
//! - Append-only binary row storage with streaming reads

pub mod catalog;
pub mod engine;
pub mod error;
pub mod eval;
pub mod sql;
pub mod storage;

pub use engine::Engine;
pub use error::{Error, Result};
pub use storage::CancellationToken;
