//! Storage module
//!
//! This module contains the binary row codec and per-table file I/O:
//! - Row framing and value encoding
//! - Append-only writes
//! - Streaming reads with cancellation

pub mod codec;
pub mod table;

pub use codec::{decode_row, encode_row, read_frame, DeserializedColumn, DeserializedRow};
pub use table::{CancellationToken, RowStream, Table};
