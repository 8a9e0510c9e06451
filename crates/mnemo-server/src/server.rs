//! [`MemoryServer`] – HTTP server for the memory API.
//!
//! Listens on `127.0.0.1:8000` by default (configurable via
//! [`MemoryServer::with_host`] and [`MemoryServer::with_port`]).
//!
//! | Method + path                                   | Handler                 |
//! |-------------------------------------------------|-------------------------|
//! | `GET /`                                         | banner                  |
//! | `GET /health`                                   | liveness probe          |
//! | `POST /api/v1/memories[/]`                      | create                  |
//! | `GET /api/v1/memories[/]`                       | list, newest first      |
//! | `GET`/`PUT`/`DELETE /api/v1/memories/{id}`      | read / overwrite / drop |
//! | `POST /api/v1/memories/search`                  | substring search        |
//! | `GET /api/v1/memories/related/{id}`             | one-hop successors      |
//! | `PUT`/`DELETE /api/v1/memories/{id}/related/{target}` | link / unlink     |

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::Router;
use axum::routing::{get, post, put};
use mnemo_memory::{MemoryService, MemoryStore};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;

/// Default TCP port for the memory API.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address for the memory API.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Mount point of the memory resource.
pub const API_PREFIX: &str = "/api/v1/memories";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Build the complete application router around `service`.
pub fn router<S: MemoryStore + 'static>(service: MemoryService<S>) -> Router {
    Router::new()
        .route("/", get(api::banner))
        .route("/health", get(api::health))
        .route(
            API_PREFIX,
            post(api::create_memory::<S>).get(api::list_memories::<S>),
        )
        .route(
            &format!("{API_PREFIX}/"),
            post(api::create_memory::<S>).get(api::list_memories::<S>),
        )
        .route(&format!("{API_PREFIX}/search"), post(api::search_memories::<S>))
        .route(&format!("{API_PREFIX}/related/{{id}}"), get(api::related_memories::<S>))
        .route(
            &format!("{API_PREFIX}/{{id}}"),
            get(api::get_memory::<S>)
                .put(api::update_memory::<S>)
                .delete(api::delete_memory::<S>),
        )
        .route(
            &format!("{API_PREFIX}/{{id}}/related/{{target}}"),
            put(api::relate_memories::<S>).delete(api::unrelate_memories::<S>),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryServer
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP front end for a [`MemoryService`].
///
/// # Example
///
/// ```rust,no_run
/// use mnemo_memory::{GraphConfig, GraphEngine, GraphRecordStore, MemoryService};
/// use mnemo_server::MemoryServer;
///
/// #[tokio::main]
/// async fn main() {
///     let engine = GraphEngine::new(GraphConfig::default());
///     let service = MemoryService::new(GraphRecordStore::new(engine));
///     MemoryServer::new(service)
///         .with_port(8080)
///         .run()
///         .await
///         .expect("memory server failed");
/// }
/// ```
pub struct MemoryServer<S> {
    service: MemoryService<S>,
    host: IpAddr,
    port: u16,
}

impl<S: MemoryStore + 'static> MemoryServer<S> {
    /// Create a server for `service` on [`DEFAULT_HOST`]:[`DEFAULT_PORT`].
    pub fn new(service: MemoryService<S>) -> Self {
        Self {
            service,
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
        }
    }

    /// Override the bind address (builder-style).
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Serve until the process is killed.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the listener cannot bind.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local = listener.local_addr()?;
        info!(addr = %local, "memory API listening");

        axum::serve(listener, router(self.service))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("memory API stopped");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
