//! Table I/O
//!
//! A table is an append-only file of row frames named after the table's ID.
//! Reads stream rows through a bounded channel: a producer thread reads one
//! frame at a time and blocks until the consumer takes it, so a slow
//! consumer never pulls the whole file into memory.

use crossbeam_channel::{bounded, Receiver};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::codec::{self, DeserializedRow};
use crate::catalog::TableDef;
use crate::error::{Error, Result};

/// A cloneable cancellation flag, polled by scans between rows
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; scans observe it before their next row
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Row storage for one table
#[derive(Debug)]
pub struct Table {
    def: Arc<TableDef>,
    path: PathBuf,
}

impl Table {
    pub fn new(def: Arc<TableDef>, root_dir: impl Into<PathBuf>) -> Self {
        let path = def.file_path(&root_dir.into());
        Self { def, path }
    }

    /// Table metadata
    pub fn definition(&self) -> &TableDef {
        &self.def
    }

    /// Append one row, given the raw literal strings of a VALUES clause
    ///
    /// The whole frame goes to the file in a single write.
    pub fn insert(&self, values: &[String]) -> Result<()> {
        let frame = codec::encode_row(&self.def.columns, values)?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        file.write_all(&frame)?;

        debug!(
            "appended {} byte row to table '{}'",
            frame.len(),
            self.def.name
        );

        Ok(())
    }

    /// Stream the table's row payloads
    ///
    /// A missing row file reads as an empty table. The producer thread sends
    /// one `Result` per frame and stops on end of file, error, cancellation,
    /// or a dropped stream.
    pub fn scan(&self, cancel: &CancellationToken) -> Result<RowStream> {
        let file = match File::open(&self.path) {
            Ok(file) => Some(file),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        debug!("scanning table '{}'", self.def.name);

        let (tx, rx) = bounded(1);
        let cancel = cancel.clone();

        let handle = std::thread::spawn(move || {
            let Some(mut file) = file else {
                return;
            };

            loop {
                if cancel.is_cancelled() {
                    let _ = tx.send(Err(Error::Cancelled));
                    return;
                }

                match codec::read_frame(&mut file) {
                    Ok(Some(payload)) => {
                        if tx.send(Ok(payload)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                }
            }
        });

        Ok(RowStream {
            rx: Some(rx),
            handle: Some(handle),
        })
    }

    /// Decode a row payload against this table's columns
    pub fn decode_row(&self, payload: &[u8]) -> Result<DeserializedRow> {
        codec::decode_row(&self.def.columns, payload)
    }
}

/// The consumer side of a table scan
///
/// Yields one `Result` per row frame. Dropping the stream disconnects the
/// channel and joins the producer thread.
#[derive(Debug)]
pub struct RowStream {
    rx: Option<Receiver<Result<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl Iterator for RowStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.as_ref().and_then(|rx| rx.recv().ok())
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        // Disconnect first so a producer blocked on send can exit
        self.rx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
