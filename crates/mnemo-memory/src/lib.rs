//! `mnemo-memory` – persistence and application layer for memory records.
//!
//! Memories are stored as nodes of an embedded SQLite property graph and may
//! be linked by directed `RELATED_TO` edges.
//!
//! # Modules
//!
//! - [`engine`] – [`GraphEngine`][engine::GraphEngine]: connection settings
//!   plus per-call [`GraphSession`][engine::GraphSession]s that create the
//!   schema on first use.
//! - [`store`] – [`MemoryStore`][store::MemoryStore], the persistence
//!   contract, and [`GraphRecordStore`][store::GraphRecordStore], its graph
//!   implementation built from fixed parameterized queries.
//! - [`service`] – [`MemoryService`][service::MemoryService]: validation,
//!   identifier and timestamp backfill, delegation to a store.
//! - [`error`] – [`PersistenceError`][error::PersistenceError].

pub mod engine;
pub mod error;
pub mod service;
pub mod store;

pub use engine::{GraphConfig, GraphEngine, GraphSession};
pub use error::PersistenceError;
pub use service::{DEFAULT_RELATED_LIMIT, DEFAULT_SEARCH_LIMIT, MemoryService, ServiceError};
pub use store::{GraphRecordStore, MemoryStore};
