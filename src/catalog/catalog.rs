//! System catalog
//!
//! This module manages the table registry and its JSON persistence. The
//! registry lives behind a single mutex: table creation takes it
//! exclusively, lookups take a consistent snapshot under the same lock.

use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::schema::{Column, ColumnSpec, TableDef};
use crate::error::{Error, Result};

const SCHEMA_FILE: &str = "schema";

/// The table registry, persisted as JSON under `<root>/schema`
#[derive(Debug)]
pub struct Catalog {
    tables: Mutex<Vec<Arc<TableDef>>>,
    root_dir: PathBuf,
}

/// Serializable proxy for Catalog
#[derive(Default, serde::Serialize, serde::Deserialize)]
struct CatalogData {
    #[serde(rename = "Tables")]
    tables: Vec<TableDef>,
}

impl Catalog {
    /// Load the catalog from `<root>/schema`, or start empty if the file is
    /// absent or empty
    pub fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();

        let tables = match std::fs::read_to_string(root_dir.join(SCHEMA_FILE)) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => {
                let data: CatalogData = serde_json::from_str(&text)
                    .map_err(|e| Error::Internal(format!("malformed schema file: {}", e)))?;
                data.tables.into_iter().map(Arc::new).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "opened catalog at {} with {} table(s)",
            root_dir.display(),
            tables.len()
        );

        Ok(Self {
            tables: Mutex::new(tables),
            root_dir,
        })
    }

    /// The directory holding the schema file and the row files
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Register a new table and assign IDs to it and its columns
    pub fn create_table(&self, name: &str, specs: &[ColumnSpec]) -> Result<Arc<TableDef>> {
        let mut tables = self.tables.lock().unwrap();

        if tables.iter().any(|t| t.name == name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(specs.len());
        for spec in specs {
            if columns.iter().any(|c| c.name == spec.name) {
                return Err(Error::DuplicateColumn(spec.name.clone()));
            }

            let mut id = random_id();
            while columns.iter().any(|c| c.id == id) {
                id = random_id();
            }

            columns.push(Column {
                id,
                name: spec.name.clone(),
                data_type: spec.data_type,
            });
        }

        let def = Arc::new(TableDef {
            id: random_id(),
            name: name.to_string(),
            columns,
        });
        tables.push(def.clone());

        debug!("created table '{}' with id {}", name, def.id);

        Ok(def)
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<Arc<TableDef>> {
        let tables = self.tables.lock().unwrap();
        tables.iter().find(|t| t.name == name).cloned()
    }

    /// List all table names
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.lock().unwrap();
        tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Persist the catalog to `<root>/schema`
    pub fn save(&self) -> Result<()> {
        let data = CatalogData {
            tables: self
                .tables
                .lock()
                .unwrap()
                .iter()
                .map(|t| (**t).clone())
                .collect(),
        };

        let json =
            serde_json::to_string(&data).map_err(|e| Error::Internal(e.to_string()))?;
        std::fs::write(self.root_dir.join(SCHEMA_FILE), json)?;

        debug!("persisted catalog with {} table(s)", data.tables.len());

        Ok(())
    }
}

/// A random non-zero 32-bit identifier (the low 32 bits of a fresh UUID)
fn random_id() -> u32 {
    loop {
        let id = Uuid::new_v4().as_fields().0;
        if id != 0 {
            return id;
        }
    }
}
