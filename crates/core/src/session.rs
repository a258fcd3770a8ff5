//! Shared, persisted access to a [`RecordStore`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    error::{PersistError, RecordError, SessionError},
    models::{NewRecord, Record, RecordKind, RecordPatch},
    storage::{Persistence, RecordFile},
    store::RecordStore,
};

/// The process-wide record store: loaded once, guarded by one lock and
/// written back after every successful mutation when autosave is on.
///
/// A failed write does not roll the change back; the store is marked dirty
/// and the next successful save includes it.
pub struct RecordSession<P = RecordFile> {
    inner: Arc<Mutex<Inner>>,
    persistence: Arc<P>,
    autosave: bool,
}

struct Inner {
    store: RecordStore,
    dirty: bool,
}

impl<P> Clone for RecordSession<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            persistence: Arc::clone(&self.persistence),
            autosave: self.autosave,
        }
    }
}

impl<P: Persistence> RecordSession<P> {
    /// Load the store from `persistence`.
    pub fn open(persistence: P, autosave: bool) -> Self {
        let store = persistence.load();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                store,
                dirty: false,
            })),
            persistence: Arc::new(persistence),
            autosave,
        }
    }

    /// The persistence backend.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Whether mutations are written immediately.
    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// True when the in-memory store has changes not yet written.
    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    /// Copy of the current store.
    pub fn snapshot(&self) -> RecordStore {
        self.inner.lock().store.clone()
    }

    /// Records of one kind, or every record when `kind` is `None`.
    pub fn records(&self, kind: Option<RecordKind>) -> Vec<Record> {
        let inner = self.inner.lock();
        match kind {
            Some(kind) => inner.store.records(kind),
            None => inner.store.all_records(),
        }
    }

    /// See [`RecordStore::create`].
    pub fn create(&self, request: NewRecord) -> Result<Record, SessionError> {
        let mut inner = self.inner.lock();
        let record = inner.store.create(request)?;
        debug!(kind = %record.kind(), "Record created");
        self.commit(&mut inner)?;
        Ok(record)
    }

    /// See [`RecordStore::search`].
    pub fn search(&self, kind: Option<RecordKind>, id: &str) -> Result<Vec<Record>, RecordError> {
        self.inner.lock().store.search(kind, id)
    }

    /// See [`RecordStore::update`].
    pub fn update(
        &self,
        patch: &RecordPatch,
        client_id: Option<&str>,
        airline_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.store.update(patch, client_id, airline_id)?;
        debug!(kind = %patch.kind(), "Record updated");
        self.commit(&mut inner)
    }

    /// See [`RecordStore::delete`].
    pub fn delete(
        &self,
        kind: RecordKind,
        client_id: Option<&str>,
        airline_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.store.delete(kind, client_id, airline_id)?;
        debug!(%kind, "Delete applied");
        self.commit(&mut inner)
    }

    /// Write the current store regardless of the autosave setting.
    pub fn save(&self) -> Result<(), PersistError> {
        let mut inner = self.inner.lock();
        self.persistence.save(&inner.store)?;
        inner.dirty = false;
        Ok(())
    }

    fn commit(&self, inner: &mut Inner) -> Result<(), SessionError> {
        inner.dirty = true;
        if !self.autosave {
            return Ok(());
        }
        match self.persistence.save(&inner.store) {
            Ok(()) => {
                inner.dirty = false;
                Ok(())
            }
            Err(err) => {
                error!("Failed to save records: {err}");
                Err(SessionError::Unsaved(err))
            }
        }
    }
}
