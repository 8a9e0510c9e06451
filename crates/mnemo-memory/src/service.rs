//! Application layer between the HTTP surface and the record store.
//!
//! [`MemoryService`] validates drafts, fills in identifiers and timestamps the
//! caller left out, and otherwise delegates to its [`MemoryStore`].

use std::sync::Arc;

use chrono::Utc;
use mnemo_types::{Memory, MemoryDraft, ValidationError};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::store::MemoryStore;

/// Number of successors returned by [`MemoryService::get_related`] when the
/// caller does not choose.
pub const DEFAULT_RELATED_LIMIT: usize = 5;

/// Number of hits returned by [`MemoryService::search`] when the caller does
/// not choose.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid memory: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Memory operations over a shared store.
#[derive(Debug)]
pub struct MemoryService<S> {
    store: Arc<S>,
}

impl<S> Clone for MemoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: MemoryStore> MemoryService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Persist a new memory.
    ///
    /// A missing id becomes a fresh UUID v4 and a missing timestamp becomes
    /// the current UTC time.  The returned record carries the identifier the
    /// store reports, which is authoritative.
    pub fn create(&self, draft: MemoryDraft) -> Result<Memory, ServiceError> {
        draft.validate()?;
        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = draft.timestamp.unwrap_or_else(Utc::now);
        let mut memory = draft.into_memory(id, timestamp);

        let stored_id = self.store.put(&memory)?;
        if stored_id != memory.id {
            warn!(requested = %memory.id, stored = %stored_id, "store reassigned memory id");
            memory.id = stored_id;
        }
        info!(id = %memory.id, kind = %memory.kind, "memory created");
        Ok(memory)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Memory>, ServiceError> {
        Ok(self.store.get_by_id(id)?)
    }

    /// Every memory, most recent first.
    pub fn get_all(&self) -> Result<Vec<Memory>, ServiceError> {
        Ok(self.store.get_all()?)
    }

    /// Overwrite the memory `id` with `draft`.  Any id carried by the draft is
    /// ignored; a missing timestamp becomes the current UTC time.
    ///
    /// Returns the record as stored afterwards, or `None` when `id` does not
    /// exist.
    pub fn update(&self, id: &str, draft: MemoryDraft) -> Result<Option<Memory>, ServiceError> {
        draft.validate_content()?;
        let timestamp = draft.timestamp.unwrap_or_else(Utc::now);
        let memory = draft.into_memory(id.to_string(), timestamp);
        if !self.store.update(id, &memory)? {
            return Ok(None);
        }
        info!(id = %id, "memory updated");
        Ok(self.store.get_by_id(id)?)
    }

    pub fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let deleted = self.store.delete(id)?;
        if deleted {
            info!(id = %id, "memory deleted");
        }
        Ok(deleted)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Memory>, ServiceError> {
        Ok(self.store.search(query, limit)?)
    }

    pub fn get_related(&self, id: &str, limit: usize) -> Result<Vec<Memory>, ServiceError> {
        Ok(self.store.get_related(id, limit)?)
    }

    /// Link `from -> to`.  Returns `false` when either memory is missing.
    pub fn relate(&self, from: &str, to: &str) -> Result<bool, ServiceError> {
        let linked = self.store.relate(from, to)?;
        if linked {
            info!(from = %from, to = %to, "memories related");
        }
        Ok(linked)
    }

    pub fn unrelate(&self, from: &str, to: &str) -> Result<bool, ServiceError> {
        Ok(self.store.unrelate(from, to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GraphConfig, GraphEngine};
    use crate::store::GraphRecordStore;
    use chrono::{DateTime, TimeZone};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn make_service() -> (TempDir, MemoryService<GraphRecordStore>) {
        let dir = tempfile::tempdir().unwrap();
        let engine = GraphEngine::new(GraphConfig::local(dir.path().join("graph.db")));
        (dir, MemoryService::new(GraphRecordStore::new(engine)))
    }

    fn draft(content: &str) -> MemoryDraft {
        MemoryDraft::new(content, "observation", "test-source").with_tags(["test"])
    }

    /// Store wrapper that files every record under its own identifier.
    struct ReassigningStore {
        inner: GraphRecordStore,
        counter: AtomicUsize,
    }

    impl MemoryStore for ReassigningStore {
        fn put(&self, record: &Memory) -> Result<String, PersistenceError> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let mut renamed = record.clone();
            renamed.id = format!("store-{n}");
            self.inner.put(&renamed)
        }
        fn get_by_id(&self, id: &str) -> Result<Option<Memory>, PersistenceError> {
            self.inner.get_by_id(id)
        }
        fn get_all(&self) -> Result<Vec<Memory>, PersistenceError> {
            self.inner.get_all()
        }
        fn update(&self, id: &str, record: &Memory) -> Result<bool, PersistenceError> {
            self.inner.update(id, record)
        }
        fn delete(&self, id: &str) -> Result<bool, PersistenceError> {
            self.inner.delete(id)
        }
        fn search(&self, text: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError> {
            self.inner.search(text, limit)
        }
        fn get_related(&self, id: &str, limit: usize) -> Result<Vec<Memory>, PersistenceError> {
            self.inner.get_related(id, limit)
        }
        fn relate(&self, from: &str, to: &str) -> Result<bool, PersistenceError> {
            self.inner.relate(from, to)
        }
        fn unrelate(&self, from: &str, to: &str) -> Result<bool, PersistenceError> {
            self.inner.unrelate(from, to)
        }
    }

    /// Store that fails the test if anything reaches it.
    struct UnreachableStore;

    impl MemoryStore for UnreachableStore {
        fn put(&self, _: &Memory) -> Result<String, PersistenceError> {
            panic!("put reached the store")
        }
        fn get_by_id(&self, _: &str) -> Result<Option<Memory>, PersistenceError> {
            panic!("get_by_id reached the store")
        }
        fn get_all(&self) -> Result<Vec<Memory>, PersistenceError> {
            panic!("get_all reached the store")
        }
        fn update(&self, _: &str, _: &Memory) -> Result<bool, PersistenceError> {
            panic!("update reached the store")
        }
        fn delete(&self, _: &str) -> Result<bool, PersistenceError> {
            panic!("delete reached the store")
        }
        fn search(&self, _: &str, _: usize) -> Result<Vec<Memory>, PersistenceError> {
            panic!("search reached the store")
        }
        fn get_related(&self, _: &str, _: usize) -> Result<Vec<Memory>, PersistenceError> {
            panic!("get_related reached the store")
        }
        fn relate(&self, _: &str, _: &str) -> Result<bool, PersistenceError> {
            panic!("relate reached the store")
        }
        fn unrelate(&self, _: &str, _: &str) -> Result<bool, PersistenceError> {
            panic!("unrelate reached the store")
        }
    }

    // ── create ───────────────────────────────────────────────────────────────

    #[test]
    fn create_assigns_id_and_timestamp() {
        let (_dir, service) = make_service();
        let before = Utc::now();
        let memory = service.create(draft("This is a test memory")).unwrap();
        let after = Utc::now();

        assert!(Uuid::parse_str(&memory.id).is_ok());
        assert!(before <= memory.timestamp && memory.timestamp <= after);
        assert!(memory.metadata.is_empty());
        assert_eq!(service.get_by_id(&memory.id).unwrap(), Some(memory));
    }

    #[test]
    fn create_keeps_caller_id_and_timestamp() {
        let (_dir, service) = make_service();
        let ts: DateTime<Utc> = Utc.with_ymd_and_hms(2023, 3, 4, 5, 6, 7).unwrap();
        let memory = service
            .create(draft("pinned").with_id("chosen").with_timestamp(ts))
            .unwrap();
        assert_eq!(memory.id, "chosen");
        assert_eq!(memory.timestamp, ts);
    }

    #[test]
    fn create_returns_store_assigned_id() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GraphEngine::new(GraphConfig::local(dir.path().join("graph.db")));
        let service = MemoryService::new(ReassigningStore {
            inner: GraphRecordStore::new(engine),
            counter: AtomicUsize::new(0),
        });

        let memory = service.create(draft("renamed").with_id("asked-for")).unwrap();
        assert_eq!(memory.id, "store-0");
        assert_eq!(service.get_by_id("store-0").unwrap().unwrap().content, "renamed");
        assert_eq!(service.get_by_id("asked-for").unwrap(), None);
    }

    #[test]
    fn many_creations_get_distinct_ids() {
        let (_dir, service) = make_service();
        let ids: HashSet<String> = (0..500)
            .map(|i| service.create(draft(&format!("note {i}"))).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(service.get_all().unwrap().len(), 500);
    }

    #[test]
    fn validation_happens_before_the_store() {
        let service = MemoryService::new(UnreachableStore);
        let err = service.create(draft("")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyContent)));

        let err = service.create(draft("body").with_id("")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyId)));

        let err = service.update("x", draft("")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    // ── update ───────────────────────────────────────────────────────────────

    #[test]
    fn update_ignores_draft_id_and_backfills_timestamp() {
        let (_dir, service) = make_service();
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let created = service.create(draft("before").with_timestamp(old)).unwrap();

        let before = Utc::now();
        let updated = service
            .update(&created.id, draft("after").with_id("other"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content, "after");
        assert!(updated.timestamp >= before);
        assert_eq!(service.get_by_id("other").unwrap(), None);
    }

    #[test]
    fn update_tolerates_blank_draft_id() {
        let (_dir, service) = make_service();
        let created = service.create(draft("before")).unwrap();
        let updated = service
            .update(&created.id, draft("after").with_id(""))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content, "after");
    }

    #[test]
    fn update_missing_is_none() {
        let (_dir, service) = make_service();
        service.create(draft("only")).unwrap();
        assert_eq!(service.update("missing", draft("x")).unwrap(), None);
        assert_eq!(service.get_all().unwrap().len(), 1);
    }

    // ── delete / relationships ───────────────────────────────────────────────

    #[test]
    fn delete_reports_existence() {
        let (_dir, service) = make_service();
        let memory = service.create(draft("short-lived")).unwrap();
        assert!(service.delete(&memory.id).unwrap());
        assert!(!service.delete(&memory.id).unwrap());
        assert_eq!(service.get_by_id(&memory.id).unwrap(), None);
    }

    #[test]
    fn relate_then_get_related() {
        let (_dir, service) = make_service();
        let a = service.create(draft("a")).unwrap();
        let b = service.create(draft("b")).unwrap();
        assert!(service.get_related(&a.id, DEFAULT_RELATED_LIMIT).unwrap().is_empty());

        assert!(service.relate(&a.id, &b.id).unwrap());
        let related = service.get_related(&a.id, DEFAULT_RELATED_LIMIT).unwrap();
        assert_eq!(related, vec![b.clone()]);

        assert!(service.unrelate(&a.id, &b.id).unwrap());
        assert!(service.get_related(&a.id, DEFAULT_RELATED_LIMIT).unwrap().is_empty());
        assert!(!service.relate(&a.id, "missing").unwrap());
    }

    #[test]
    fn search_finds_created_memory() {
        let (_dir, service) = make_service();
        service
            .create(draft("buy milk").with_tags(["errand", "memory"]))
            .unwrap();
        assert_eq!(service.search("milk", DEFAULT_SEARCH_LIMIT).unwrap().len(), 1);
        assert_eq!(service.search("memory", DEFAULT_SEARCH_LIMIT).unwrap().len(), 1);
        assert!(service.search("bread", DEFAULT_SEARCH_LIMIT).unwrap().is_empty());
    }

    #[test]
    fn clones_share_the_store() {
        let (_dir, service) = make_service();
        let other = service.clone();
        let memory = service.create(draft("shared")).unwrap();
        assert!(other.get_by_id(&memory.id).unwrap().is_some());
    }
}
