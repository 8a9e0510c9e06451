//! `mnemo-server` – HTTP transport for the memory graph.
//!
//! Maps REST calls under `/api/v1/memories` onto a
//! [`MemoryService`](mnemo_memory::MemoryService) and renders outcomes as JSON:
//! records and lists on success, `{"message": ...}` for deletions and edge
//! changes, `{"detail": ...}` for every failure (404 not found, 422 malformed
//! input, 500 engine failure).
//!
//! # Usage
//!
//! ```rust,no_run
//! use mnemo_memory::{GraphConfig, GraphEngine, GraphRecordStore, MemoryService};
//! use mnemo_server::MemoryServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = GraphEngine::new(GraphConfig::local("/var/lib/mnemo/graph.db"));
//!     MemoryServer::new(MemoryService::new(GraphRecordStore::new(engine)))
//!         .run()
//!         .await
//!         .expect("memory server failed");
//! }
//! ```

pub mod api;
pub mod server;

pub use api::ApiError;
pub use server::{API_PREFIX, DEFAULT_HOST, DEFAULT_PORT, MemoryServer, ServerError, router};
