//! JSON file persistence for the record store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{error::PersistError, models::RecordKind, store::RecordStore};

/// Default file name for the record document.
pub const DEFAULT_RECORDS_FILE: &str = "records.json";

/// Load-all/save-all contract used by [`crate::session::RecordSession`].
pub trait Persistence {
    /// Read the full store. Absent or unreadable data yields an empty store.
    fn load(&self) -> RecordStore;

    /// Replace the persisted state with `store`.
    fn save(&self, store: &RecordStore) -> Result<(), PersistError>;
}

/// A single pretty-printed JSON document holding all three collections.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    /// Use the document at `path`; nothing is read until [`Persistence::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<RecordStore>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let store = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(store))
    }

    fn io_error(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Persistence for RecordFile {
    fn load(&self) -> RecordStore {
        match self.read() {
            Ok(Some(store)) => {
                info!(
                    path = %self.path.display(),
                    clients = store.len(RecordKind::Client),
                    airlines = store.len(RecordKind::Airline),
                    flights = store.len(RecordKind::Flight),
                    "Records loaded"
                );
                let unrecognised = store.unrecognised_fields();
                if unrecognised > 0 {
                    warn!(
                        path = %self.path.display(),
                        unrecognised,
                        "Records carry unrecognised fields; keeping them as-is"
                    );
                }
                store
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No records file found; starting empty");
                RecordStore::new()
            }
            Err(err) => {
                warn!("Ignoring unreadable records file: {err:#}");
                RecordStore::new()
            }
        }
    }

    fn save(&self, store: &RecordStore) -> Result<(), PersistError> {
        let serialised = serde_json::to_vec_pretty(store)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;

        // Written beside the target, then renamed over it.
        let mut temp = NamedTempFile::new_in(parent).map_err(|err| self.io_error(err))?;
        temp.write_all(&serialised)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        info!(path = %self.path.display(), bytes = serialised.len(), "Records saved");
        Ok(())
    }
}
