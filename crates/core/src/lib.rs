#![warn(clippy::all, missing_docs)]

//! Core record management for clients, airlines and flights.
//!
//! This crate hosts the record models, the in-memory store with its
//! referential-integrity rules, JSON file persistence and configuration
//! used by the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;

pub use config::AppConfig;
pub use error::{PersistError, RecordError, Reference, SessionError};
pub use models::{
    Airline, AirlineDetails, Client, ClientDetails, FieldMap, Flight, FlightDetails, NewRecord,
    Record, RecordId, RecordKind, RecordPatch,
};
pub use session::RecordSession;
pub use storage::{Persistence, RecordFile};
pub use store::RecordStore;
