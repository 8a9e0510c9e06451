//! Memory record store.
//!
//! [`MemoryStore`] is the persistence contract: one method per verb, each
//! answered by a single fixed, parameterized statement.  [`GraphRecordStore`]
//! implements it on top of the embedded graph engine, acquiring a
//! [`GraphSession`] per call.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use mnemo_memory::{GraphConfig, GraphEngine, GraphRecordStore, MemoryStore};
//! use mnemo_types::MemoryDraft;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = GraphRecordStore::new(GraphEngine::new(GraphConfig::local(dir.path().join("g.db"))));
//!
//! let record = MemoryDraft::new("buy milk", "observation", "doc")
//!     .with_tags(["errand"])
//!     .into_memory("a".to_string(), Utc::now());
//! let id = store.put(&record).unwrap();
//!
//! assert_eq!(store.get_by_id(&id).unwrap(), Some(record));
//! assert_eq!(store.search("milk", 10).unwrap().len(), 1);
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use mnemo_types::{Memory, Metadata, RELATED_TO};
use rusqlite::{Row, params};
use tracing::debug;

use crate::engine::{GraphEngine, GraphSession};
use crate::error::PersistenceError;

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Persistence contract for memory records.
///
/// Absence is reported through `Option`/`bool`, never through an error.
pub trait MemoryStore: Send + Sync {
    /// Create a new node from `record`; returns the identifier it was stored
    /// under.
    fn put(&self, record: &Memory) -> Result<String, PersistenceError>;

    fn get_by_id(&self, id: &str) -> Result<Option<Memory>, PersistenceError>;

    /// Every record, most recent first.
    fn get_all(&self) -> Result<Vec<Memory>, PersistenceError>;

    /// Overwrite every mutable field of the node `id`.  Returns whether the
    /// node existed.
    fn update(&self, id: &str, record: &Memory) -> Result<bool, PersistenceError>;

    /// Remove the node `id` together with all of its edges.
    fn delete(&self, id: &str) -> Result<bool, PersistenceError>;

    /// Records whose content, or any tag, contains `text` (case-sensitive),
    /// most recent first, at most `limit`.
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError>;

    /// One-hop outbound `RELATED_TO` successors of `id`, most recent first, at
    /// most `limit`.
    fn get_related(&self, id: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError>;

    /// Ensure the edge `from -> to` exists.  Returns `false` when either
    /// endpoint is missing.
    fn relate(&self, from: &str, to: &str) -> Result<bool, PersistenceError>;

    /// Remove the edge `from -> to`.  Returns whether an edge was removed.
    fn unrelate(&self, from: &str, to: &str) -> Result<bool, PersistenceError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Query templates
// ─────────────────────────────────────────────────────────────────────────────

const CREATE_MEMORY: &str = "
    INSERT INTO memory_nodes (id, content, timestamp, type, tags, source, metadata)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    RETURNING id";

const MATCH_MEMORY: &str = "
    SELECT id, content, timestamp, type, tags, source, metadata
    FROM memory_nodes
    WHERE id = ?1";

const MATCH_ALL: &str = "
    SELECT id, content, timestamp, type, tags, source, metadata
    FROM memory_nodes
    ORDER BY timestamp DESC";

const SET_MEMORY: &str = "
    UPDATE memory_nodes
    SET content = ?2, timestamp = ?3, type = ?4, tags = ?5, source = ?6, metadata = ?7
    WHERE id = ?1";

const DETACH_DELETE: &str = "DELETE FROM memory_nodes WHERE id = ?1";

const SEARCH: &str = "
    SELECT id, content, timestamp, type, tags, source, metadata
    FROM memory_nodes AS m
    WHERE instr(m.content, ?1) > 0
       OR EXISTS (SELECT 1 FROM json_each(m.tags) AS tag WHERE instr(tag.value, ?1) > 0)
    ORDER BY m.timestamp DESC
    LIMIT ?2";

const MATCH_RELATED: &str = "
    SELECT m.id AS id, m.content AS content, m.timestamp AS timestamp, m.type AS type,
           m.tags AS tags, m.source AS source, m.metadata AS metadata
    FROM related_to AS r
    JOIN memory_nodes AS m ON m.id = r.to_id
    WHERE r.from_id = ?1
    ORDER BY m.timestamp DESC
    LIMIT ?2";

// The no-op upsert keeps `changes()` at 1 when the edge already exists, so the
// result reflects whether both endpoints matched.
const MERGE_RELATED: &str = "
    INSERT INTO related_to (from_id, to_id)
    SELECT a.id, b.id FROM memory_nodes AS a, memory_nodes AS b
    WHERE a.id = ?1 AND b.id = ?2
    ON CONFLICT (from_id, to_id) DO UPDATE SET to_id = excluded.to_id";

const DELETE_RELATED: &str = "DELETE FROM related_to WHERE from_id = ?1 AND to_id = ?2";

// ─────────────────────────────────────────────────────────────────────────────
// GraphRecordStore
// ─────────────────────────────────────────────────────────────────────────────

/// [`MemoryStore`] backed by the embedded graph engine.
#[derive(Debug, Clone)]
pub struct GraphRecordStore {
    engine: GraphEngine,
}

impl GraphRecordStore {
    pub fn new(engine: GraphEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    fn with_session<T>(
        &self,
        query: impl FnOnce(&GraphSession) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let session = self.engine.session()?;
        query(&session)
    }
}

impl MemoryStore for GraphRecordStore {
    fn put(&self, record: &Memory) -> Result<String, PersistenceError> {
        let fields = EncodedFields::encode(record)?;
        let id = self.with_session(|session| {
            let id = session.conn().query_row(
                CREATE_MEMORY,
                params![
                    record.id,
                    record.content,
                    fields.timestamp,
                    record.kind,
                    fields.tags,
                    record.source,
                    fields.metadata,
                ],
                |row| row.get::<_, String>("id"),
            )?;
            Ok(id)
        })?;
        debug!(id = %id, "memory node created");
        Ok(id)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Memory>, PersistenceError> {
        self.with_session(|session| {
            let mut stmt = session.conn().prepare(MATCH_MEMORY)?;
            let mut rows = stmt.query_map(params![id], RawMemoryRow::read)?;
            rows.next().transpose()?.map(RawMemoryRow::decode).transpose()
        })
    }

    fn get_all(&self) -> Result<Vec<Memory>, PersistenceError> {
        let records = self.with_session(|session| {
            let mut stmt = session.conn().prepare(MATCH_ALL)?;
            let rows = stmt.query_map([], RawMemoryRow::read)?;
            decode_rows(rows)
        })?;
        debug!(count = records.len(), "listed memory nodes");
        Ok(records)
    }

    fn update(&self, id: &str, record: &Memory) -> Result<bool, PersistenceError> {
        let fields = EncodedFields::encode(record)?;
        let changed = self.with_session(|session| {
            let changed = session.conn().execute(
                SET_MEMORY,
                params![
                    id,
                    record.content,
                    fields.timestamp,
                    record.kind,
                    fields.tags,
                    record.source,
                    fields.metadata,
                ],
            )?;
            Ok(changed)
        })?;
        debug!(id = %id, matched = changed > 0, "memory node updated");
        Ok(changed > 0)
    }

    fn delete(&self, id: &str) -> Result<bool, PersistenceError> {
        let deleted =
            self.with_session(|session| Ok(session.conn().execute(DETACH_DELETE, params![id])?))?;
        debug!(id = %id, deleted, "memory node deleted");
        Ok(deleted > 0)
    }

    fn search(&self, text: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError> {
        let records = self.with_session(|session| {
            let mut stmt = session.conn().prepare(SEARCH)?;
            let rows = stmt.query_map(params![text, sql_limit(limit)], RawMemoryRow::read)?;
            decode_rows(rows)
        })?;
        debug!(query = %text, limit, hits = records.len(), "memory search");
        Ok(records)
    }

    fn get_related(&self, id: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError> {
        let records = self.with_session(|session| {
            let mut stmt = session.conn().prepare(MATCH_RELATED)?;
            let rows = stmt.query_map(params![id, sql_limit(limit)], RawMemoryRow::read)?;
            decode_rows(rows)
        })?;
        debug!(id = %id, edge = RELATED_TO, hits = records.len(), "related memories");
        Ok(records)
    }

    fn relate(&self, from: &str, to: &str) -> Result<bool, PersistenceError> {
        let changed =
            self.with_session(|session| Ok(session.conn().execute(MERGE_RELATED, params![from, to])?))?;
        debug!(from = %from, to = %to, edge = RELATED_TO, matched = changed > 0, "edge merged");
        Ok(changed > 0)
    }

    fn unrelate(&self, from: &str, to: &str) -> Result<bool, PersistenceError> {
        let changed =
            self.with_session(|session| Ok(session.conn().execute(DELETE_RELATED, params![from, to])?))?;
        debug!(from = %from, to = %to, edge = RELATED_TO, removed = changed > 0, "edge deleted");
        Ok(changed > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row encoding / decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Store timestamps as fixed-width RFC-3339 so that text order is time order.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Properties that need a textual encoding before they reach the engine.
struct EncodedFields {
    timestamp: String,
    tags: String,
    metadata: String,
}

impl EncodedFields {
    fn encode(record: &Memory) -> Result<Self, PersistenceError> {
        let tags = serde_json::to_string(&record.tags).map_err(|e| PersistenceError::Encode {
            field: "tags",
            reason: e.to_string(),
        })?;
        let metadata =
            serde_json::to_string(&record.metadata).map_err(|e| PersistenceError::Encode {
                field: "metadata",
                reason: e.to_string(),
            })?;
        Ok(Self {
            timestamp: encode_timestamp(&record.timestamp),
            tags,
            metadata,
        })
    }
}

/// A node exactly as the engine returned it, before any interpretation.
struct RawMemoryRow {
    id: Option<String>,
    content: Option<String>,
    timestamp: Option<String>,
    kind: Option<String>,
    tags: Option<String>,
    source: Option<String>,
    metadata: Option<String>,
}

impl RawMemoryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            content: row.get("content")?,
            timestamp: row.get("timestamp")?,
            kind: row.get("type")?,
            tags: row.get("tags")?,
            source: row.get("source")?,
            metadata: row.get("metadata")?,
        })
    }

    fn decode(self) -> Result<Memory, PersistenceError> {
        let timestamp = required("timestamp", self.timestamp)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| PersistenceError::Decode {
                field: "timestamp",
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);
        let tags: Vec<String> = serde_json::from_str(&required("tags", self.tags)?).map_err(|e| {
            PersistenceError::Decode {
                field: "tags",
                reason: e.to_string(),
            }
        })?;
        let metadata: Metadata = serde_json::from_str(&required("metadata", self.metadata)?)
            .map_err(|e| PersistenceError::Decode {
                field: "metadata",
                reason: e.to_string(),
            })?;
        Ok(Memory {
            id: required("id", self.id)?,
            content: required("content", self.content)?,
            timestamp,
            kind: required("type", self.kind)?,
            tags,
            source: required("source", self.source)?,
            metadata,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, PersistenceError> {
    value.ok_or(PersistenceError::Decode {
        field,
        reason: "missing value".to_string(),
    })
}

fn decode_rows(
    rows: impl Iterator<Item = rusqlite::Result<RawMemoryRow>>,
) -> Result<Vec<Memory>, PersistenceError> {
    rows.map(|row| row?.decode()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphConfig;
    use chrono::{Duration, TimeZone};
    use mnemo_types::{MemoryDraft, MetadataValue};
    use tempfile::TempDir;

    fn make_store() -> (TempDir, GraphRecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let engine = GraphEngine::new(GraphConfig::local(dir.path().join("graph.db")));
        (dir, GraphRecordStore::new(engine))
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn record(id: &str, content: &str, tags: &[&str], minutes: i64) -> Memory {
        MemoryDraft::new(content, "observation", "test-source")
            .with_tags(tags.iter().copied())
            .into_memory(id.to_string(), base_time() + Duration::minutes(minutes))
    }

    fn ids(records: &[Memory]) -> Vec<&str> {
        records.iter().map(|m| m.id.as_str()).collect()
    }

    // ── put / get ────────────────────────────────────────────────────────────

    #[test]
    fn put_then_get_returns_identical_record() {
        let (_dir, store) = make_store();
        let mut nested = Metadata::new();
        nested.insert("depth".to_string(), MetadataValue::from(2i64));
        let mut original = record("a", "This is a test memory", &["test", "memory"], 0);
        original.timestamp = Utc::now();
        original.metadata.insert("key".to_string(), MetadataValue::from("value"));
        original.metadata.insert("number".to_string(), MetadataValue::from(42i64));
        original.metadata.insert("nested".to_string(), MetadataValue::Map(nested));

        let id = store.put(&original).unwrap();
        assert_eq!(id, "a");
        assert_eq!(store.get_by_id("a").unwrap(), Some(original));
    }

    #[test]
    fn get_unknown_id_is_none() {
        let (_dir, store) = make_store();
        assert_eq!(store.get_by_id("missing").unwrap(), None);
    }

    #[test]
    fn put_duplicate_id_is_persistence_error() {
        let (_dir, store) = make_store();
        store.put(&record("dup", "first", &[], 0)).unwrap();
        let err = store.put(&record("dup", "second", &[], 1)).unwrap_err();
        assert!(matches!(err, PersistenceError::Sqlite(_)));
        assert_eq!(store.get_by_id("dup").unwrap().unwrap().content, "first");
    }

    // ── get_all ──────────────────────────────────────────────────────────────

    #[test]
    fn get_all_orders_most_recent_first() {
        let (_dir, store) = make_store();
        store.put(&record("old", "old", &[], 0)).unwrap();
        store.put(&record("new", "new", &[], 10)).unwrap();
        store.put(&record("mid", "mid", &[], 5)).unwrap();
        assert_eq!(ids(&store.get_all().unwrap()), vec!["new", "mid", "old"]);
    }

    #[test]
    fn get_all_empty_store_returns_empty_vec() {
        let (_dir, store) = make_store();
        assert!(store.get_all().unwrap().is_empty());
    }

    // ── update ───────────────────────────────────────────────────────────────

    #[test]
    fn update_overwrites_mutable_fields_and_keeps_id() {
        let (_dir, store) = make_store();
        store.put(&record("a", "before", &["x"], 0)).unwrap();

        let mut changed = record("ignored", "after", &["y", "z"], 30);
        changed.kind = "test".to_string();
        changed.source = "editor".to_string();
        changed.metadata.insert("edited".to_string(), MetadataValue::Bool(true));
        assert!(store.update("a", &changed).unwrap());

        let stored = store.get_by_id("a").unwrap().unwrap();
        assert_eq!(stored.id, "a");
        assert_eq!(stored.content, "after");
        assert_eq!(stored.tags, vec!["y", "z"]);
        assert_eq!(stored.kind, "test");
        assert_eq!(stored.source, "editor");
        assert_eq!(stored.timestamp, changed.timestamp);
        assert_eq!(stored.metadata, changed.metadata);
        assert_eq!(store.get_by_id("ignored").unwrap(), None);
    }

    #[test]
    fn update_unknown_id_changes_nothing() {
        let (_dir, store) = make_store();
        store.put(&record("a", "kept", &[], 0)).unwrap();
        assert!(!store.update("missing", &record("missing", "x", &[], 1)).unwrap());
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "kept");
    }

    // ── delete ───────────────────────────────────────────────────────────────

    #[test]
    fn delete_then_get_is_none() {
        let (_dir, store) = make_store();
        store.put(&record("a", "gone soon", &[], 0)).unwrap();
        assert!(store.delete("a").unwrap());
        assert_eq!(store.get_by_id("a").unwrap(), None);
        assert!(!store.delete("a").unwrap());
    }

    #[test]
    fn delete_cascades_incoming_and_outgoing_edges() {
        let (dir, store) = make_store();
        store.put(&record("a", "a", &[], 0)).unwrap();
        store.put(&record("b", "b", &[], 1)).unwrap();
        store.put(&record("c", "c", &[], 2)).unwrap();
        assert!(store.relate("a", "b").unwrap());
        assert!(store.relate("b", "c").unwrap());

        assert!(store.delete("b").unwrap());
        assert!(store.get_related("a", 5).unwrap().is_empty());

        let engine = GraphEngine::new(GraphConfig::local(dir.path().join("graph.db")));
        let session = engine.session().unwrap();
        let edges: i64 = session
            .conn()
            .query_row("SELECT count(*) FROM related_to", [], |row| row.get(0))
            .unwrap();
        assert_eq!(edges, 0);
    }

    // ── search ───────────────────────────────────────────────────────────────

    #[test]
    fn search_matches_content_or_tags() {
        let (_dir, store) = make_store();
        store.put(&record("a", "buy milk", &["errand"], 0)).unwrap();
        store.put(&record("b", "milk run logged", &["memory", "errand"], 1)).unwrap();

        assert_eq!(ids(&store.search("milk", 10).unwrap()), vec!["b", "a"]);
        assert_eq!(ids(&store.search("memory", 10).unwrap()), vec!["b"]);
        assert_eq!(ids(&store.search("rand", 10).unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn search_is_case_sensitive() {
        let (_dir, store) = make_store();
        store.put(&record("a", "Milk", &["Errand"], 0)).unwrap();
        assert!(store.search("milk", 10).unwrap().is_empty());
        assert!(store.search("errand", 10).unwrap().is_empty());
        assert_eq!(store.search("Milk", 10).unwrap().len(), 1);
    }

    #[test]
    fn search_returns_exact_subset_ordered_and_truncated() {
        let (_dir, store) = make_store();
        for i in 0..15 {
            let content = if i % 3 == 0 { format!("plain note {i}") } else { format!("memory note {i}") };
            store.put(&record(&format!("c{i:02}"), &content, &[], i)).unwrap();
        }
        for i in 0..4 {
            store
                .put(&record(&format!("t{i}"), "untagged text", &["episodic-memory"], 100 + i))
                .unwrap();
        }
        store.put(&record("none", "nothing relevant", &["misc"], 200)).unwrap();

        let all = store.get_all().unwrap();
        let expected: Vec<&str> = all
            .iter()
            .filter(|m| m.content.contains("memory") || m.tags.iter().any(|t| t.contains("memory")))
            .map(|m| m.id.as_str())
            .take(10)
            .collect();

        let hits = store.search("memory", 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(ids(&hits), expected);
        assert!(hits.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn search_with_zero_limit_is_empty() {
        let (_dir, store) = make_store();
        store.put(&record("a", "memory", &[], 0)).unwrap();
        assert!(store.search("memory", 0).unwrap().is_empty());
    }

    // ── relationships ────────────────────────────────────────────────────────

    #[test]
    fn related_is_empty_without_edges() {
        let (_dir, store) = make_store();
        store.put(&record("a", "a", &[], 0)).unwrap();
        store.put(&record("b", "b", &[], 1)).unwrap();
        assert!(store.get_related("a", 5).unwrap().is_empty());
    }

    #[test]
    fn related_returns_one_hop_successors_capped() {
        let (_dir, store) = make_store();
        store.put(&record("a", "root", &[], 0)).unwrap();
        for i in 0..7 {
            store.put(&record(&format!("s{i}"), "succ", &[], i + 1)).unwrap();
            assert!(store.relate("a", &format!("s{i}")).unwrap());
        }
        store.put(&record("far", "two hops", &[], 50)).unwrap();
        store.relate("s0", "far").unwrap();
        store.put(&record("back", "incoming only", &[], 60)).unwrap();
        store.relate("back", "a").unwrap();

        let related = store.get_related("a", 5).unwrap();
        assert_eq!(ids(&related), vec!["s6", "s5", "s4", "s3", "s2"]);
        assert_eq!(store.get_related("a", 100).unwrap().len(), 7);
    }

    #[test]
    fn relate_is_idempotent_and_requires_both_endpoints() {
        let (_dir, store) = make_store();
        store.put(&record("a", "a", &[], 0)).unwrap();
        store.put(&record("b", "b", &[], 1)).unwrap();
        assert!(store.relate("a", "b").unwrap());
        assert!(store.relate("a", "b").unwrap());
        assert_eq!(store.get_related("a", 5).unwrap().len(), 1);
        assert!(!store.relate("a", "missing").unwrap());
        assert!(!store.relate("missing", "a").unwrap());
    }

    #[test]
    fn edges_are_directed() {
        let (_dir, store) = make_store();
        store.put(&record("a", "a", &[], 0)).unwrap();
        store.put(&record("b", "b", &[], 1)).unwrap();
        store.relate("a", "b").unwrap();
        assert!(store.get_related("b", 5).unwrap().is_empty());
    }

    #[test]
    fn unrelate_removes_edge() {
        let (_dir, store) = make_store();
        store.put(&record("a", "a", &[], 0)).unwrap();
        store.put(&record("b", "b", &[], 1)).unwrap();
        store.relate("a", "b").unwrap();
        assert!(store.unrelate("a", "b").unwrap());
        assert!(!store.unrelate("a", "b").unwrap());
        assert!(store.get_related("a", 5).unwrap().is_empty());
    }

    // ── decoding ─────────────────────────────────────────────────────────────

    #[test]
    fn malformed_tags_is_decode_error() {
        let (_dir, store) = make_store();
        let session = store.engine().session().unwrap();
        session
            .conn()
            .execute(
                "INSERT INTO memory_nodes (id, content, timestamp, type, tags, source, metadata)
                 VALUES ('bad', 'c', ?1, 't', 'not json', 's', '{}')",
                params![encode_timestamp(&base_time())],
            )
            .unwrap();
        drop(session);

        let err = store.get_by_id("bad").unwrap_err();
        assert!(matches!(err, PersistenceError::Decode { field: "tags", .. }));
        assert!(store.get_all().is_err());
    }

    #[test]
    fn malformed_timestamp_is_decode_error() {
        let (_dir, store) = make_store();
        let session = store.engine().session().unwrap();
        session
            .conn()
            .execute(
                "INSERT INTO memory_nodes (id, content, timestamp, type, tags, source, metadata)
                 VALUES ('bad', 'c', 'yesterday', 't', '[]', 's', '{}')",
                [],
            )
            .unwrap();
        drop(session);

        let err = store.get_by_id("bad").unwrap_err();
        assert!(matches!(err, PersistenceError::Decode { field: "timestamp", .. }));
    }

    #[test]
    fn missing_value_is_decode_error() {
        assert!(matches!(
            required("source", None),
            Err(PersistenceError::Decode { field: "source", .. })
        ));
    }

    #[test]
    fn encoded_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = earlier + Duration::nanoseconds(1);
        assert!(encode_timestamp(&earlier) < encode_timestamp(&later));
        assert_eq!(encode_timestamp(&earlier).len(), encode_timestamp(&later).len());
    }
}
