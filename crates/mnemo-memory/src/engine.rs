//! Graph engine handle and per-call sessions.
//!
//! The engine is an embedded SQLite property graph.  Nodes labelled `Memory`
//! live in `memory_nodes`; `RELATED_TO` edges live in `related_to`.  A
//! [`GraphEngine`] holds only connection settings: every store call acquires
//! its own [`GraphSession`] through [`GraphEngine::session`] and drops it when
//! the query finishes.
//!
//! # Storage layout
//!
//! | table          | column    | type | description                                    |
//! |----------------|-----------|------|------------------------------------------------|
//! | `memory_nodes` | id        | TEXT | primary key                                    |
//! |                | content   | TEXT | text body                                      |
//! |                | timestamp | TEXT | fixed-width RFC-3339 (UTC, nanoseconds)        |
//! |                | type      | TEXT | category                                       |
//! |                | tags      | TEXT | JSON array of strings                          |
//! |                | source    | TEXT | origin label                                   |
//! |                | metadata  | TEXT | JSON object                                    |
//! | `related_to`   | from_id   | TEXT | edge tail, cascades on node delete             |
//! |                | to_id     | TEXT | edge head, cascades on node delete             |

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mnemo_types::MEMORY_LABEL;
use rusqlite::Connection;
use tracing::debug;

use crate::error::PersistenceError;

/// URI scheme understood by the embedded engine.
pub const URI_SCHEME: &str = "sqlite://";

/// Local development endpoint used when nothing is configured.
pub const DEFAULT_GRAPH_URI: &str = "sqlite://mnemo-graph.db";

/// Principal used when nothing is configured.
pub const DEFAULT_GRAPH_USER: &str = "mnemo";

/// Call-level deadline for a session waiting on a locked graph.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS memory_nodes (
        id        TEXT NOT NULL PRIMARY KEY,
        content   TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        type      TEXT NOT NULL,
        tags      TEXT NOT NULL,
        source    TEXT NOT NULL,
        metadata  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS memory_nodes_timestamp ON memory_nodes (timestamp);
    CREATE TABLE IF NOT EXISTS related_to (
        from_id TEXT NOT NULL REFERENCES memory_nodes (id) ON DELETE CASCADE,
        to_id   TEXT NOT NULL REFERENCES memory_nodes (id) ON DELETE CASCADE,
        PRIMARY KEY (from_id, to_id)
    );
    CREATE INDEX IF NOT EXISTS related_to_head ON related_to (to_id);
";

// ─────────────────────────────────────────────────────────────────────────────
// GraphConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for the graph engine: endpoint, principal, credential.
#[derive(Clone, PartialEq)]
pub struct GraphConfig {
    /// Endpoint URI, e.g. `sqlite:///var/lib/mnemo/graph.db`.
    pub uri: String,
    /// Principal the sessions are opened as.
    pub user: String,
    /// Credential for `user`.  Never printed.
    pub password: String,
    /// How long a session waits for a write lock before failing.
    pub busy_timeout: Duration,
}

impl GraphConfig {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Settings for a graph file at `path` with the default principal.
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self::new(
            format!("{URI_SCHEME}{}", path.as_ref().display()),
            DEFAULT_GRAPH_USER,
            "",
        )
    }

    /// Override the busy timeout (builder-style).
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Resolve the endpoint URI to the database file it names.
    pub fn database_path(&self) -> Result<PathBuf, PersistenceError> {
        let rest = self
            .uri
            .strip_prefix(URI_SCHEME)
            .ok_or_else(|| self.connect_error(format!("unsupported scheme, expected `{URI_SCHEME}`")))?;
        if rest.is_empty() {
            return Err(self.connect_error("missing database path".to_string()));
        }
        if rest == ":memory:" {
            return Err(self.connect_error(
                "in-memory graphs do not survive per-call sessions".to_string(),
            ));
        }
        Ok(PathBuf::from(rest))
    }

    fn connect_error(&self, reason: String) -> PersistenceError {
        PersistenceError::Connect {
            uri: self.uri.clone(),
            reason,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPH_URI, DEFAULT_GRAPH_USER, "")
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field(
                "password",
                if self.password.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Cheap, cloneable handle to the graph.  Holds settings only; no connection
/// is kept open between calls.
///
/// The settings are fixed for the engine's lifetime: every session reads the
/// same [`GraphConfig`], so configuration changes need a new engine.
#[derive(Debug, Clone)]
pub struct GraphEngine {
    config: Arc<GraphConfig>,
}

impl GraphEngine {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Acquire a fresh session.  The connection closes when the returned
    /// [`GraphSession`] is dropped.
    pub fn session(&self) -> Result<GraphSession, PersistenceError> {
        let path = self.config.database_path()?;
        let conn = Connection::open(&path).map_err(|e| PersistenceError::Connect {
            uri: self.config.uri.clone(),
            reason: e.to_string(),
        })?;
        conn.busy_timeout(self.config.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(
            uri = %self.config.uri,
            user = %self.config.user,
            label = MEMORY_LABEL,
            "graph session opened"
        );
        Ok(GraphSession { conn })
    }

    /// Open and immediately release a session, surfacing any connection or
    /// schema problem up front.
    pub fn verify(&self) -> Result<(), PersistenceError> {
        let session = self.session()?;
        session.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// A scoped connection to the graph, valid for the duration of one query.
pub struct GraphSession {
    conn: Connection,
}

impl GraphSession {
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
