//! Error types returned by the record store and its persistence adapter.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::models::{RecordId, RecordKind};

/// Failures produced by record operations. None of these mutate the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Identifier missing, non-numeric or otherwise not a plain digit string.
    #[error("invalid {field}: {value:?} is not a whole number")]
    InvalidId {
        /// Which identifier was rejected (e.g. `Client ID`).
        field: &'static str,
        /// The raw value as supplied.
        value: String,
    },
    /// Kind name is not one of Client, Airline or Flight.
    #[error("unknown record type {0:?}")]
    UnknownRecordKind(String),
    /// A flight refers to a client or airline that does not exist.
    #[error("flight references {0}")]
    InvalidReference(Reference),
    /// Search or update target is absent.
    #[error("{0} not found")]
    NotFound(String),
    /// Field label is not an editable field of the given kind.
    #[error("{kind} records have no editable field {field:?}")]
    UnknownField {
        /// Kind the field map was applied to.
        kind: RecordKind,
        /// Offending label.
        field: String,
    },
    /// The collection already holds the largest representable ID.
    #[error("no {0} IDs left to assign")]
    IdsExhausted(RecordKind),
}

/// The side of a flight reference that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// No client with this ID.
    Client(RecordId),
    /// No airline with this ID.
    Airline(RecordId),
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Client(id) => write!(f, "unknown client {id}"),
            Reference::Airline(id) => write!(f, "unknown airline {id}"),
        }
    }
}

/// Failures writing the record file.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error while writing or replacing the file.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The store could not be encoded as JSON.
    #[error("failed to encode records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of a session operation that either failed or succeeded without being saved.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation was rejected; nothing changed.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// The change is applied in memory but the file write failed.
    #[error("change applied but not saved: {0}")]
    Unsaved(#[source] PersistError),
}

impl SessionError {
    /// Returns the record error when the operation itself was rejected.
    pub fn as_record_error(&self) -> Option<&RecordError> {
        match self {
            SessionError::Record(err) => Some(err),
            SessionError::Unsaved(_) => None,
        }
    }
}
