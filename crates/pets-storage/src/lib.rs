//! SQLite storage engine and record gateway for pet records.
//!
//! # Architecture
//!
//! The crate has two layers:
//! - The **storage engine** ([`StorageEngine`]) owns the `pets` table: DDL,
//!   schema versioning and raw query/insert/update/delete primitives with
//!   bound parameters.
//! - The **record gateway** ([`PetGateway`]) is the addressable entry point:
//!   it resolves logical addresses, validates writes and notifies observers.
//!
//! # Modules
//!
//! - [`error`]: StorageError and GatewayError
//! - [`schema`]: SQL schema constants and upgrade policies
//! - [`engine`]: StorageEngine
//! - [`query`]: Column, Selection, Sort, PetRow, Cursor
//! - [`notify`]: ChangeObserver and ChangeNotifier
//! - [`gateway`]: PetGateway

pub mod engine;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod query;
pub mod schema;

// Re-export key types for ergonomic use.
pub use engine::{DbLocation, StorageEngine};
pub use error::{GatewayError, StorageError};
pub use gateway::{GatewayConfig, PetGateway, UpdateOutcome};
pub use notify::{ChangeNotifier, ChangeObserver, ObserverId};
pub use query::{Column, Cursor, PetRow, Selection, Sort};
pub use schema::{SchemaPolicy, SCHEMA_VERSION};

// Selection arguments are SQLite values.
pub use rusqlite::types::Value;
