//! `mnemo-types` – shared domain model for the Mnemo memory graph.
//!
//! A [`Memory`] is the single node type stored in the graph.  Callers submit a
//! [`MemoryDraft`] (identifier, timestamp and metadata optional) and receive
//! fully-populated [`Memory`] records back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node label under which memories are stored in the graph.
pub const MEMORY_LABEL: &str = "Memory";

/// The only edge label the graph knows about.
pub const RELATED_TO: &str = "RELATED_TO";

/// Free-form key/value bag attached to a memory.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
///
/// Serialized as plain JSON: `"text"`, `42`, `true` or a nested object.
/// JSON `null` and arrays have no representation and are rejected on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Map(BTreeMap<String, MetadataValue>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

/// A persisted memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Opaque unique identifier; immutable once assigned.
    pub id: String,
    /// Text body, the unit of substring search.
    pub content: String,
    /// Point in time the memory refers to (UTC).
    pub timestamp: DateTime<Utc>,
    /// Free-text category such as `"observation"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    /// Origin label, e.g. the agent that produced the memory.
    pub source: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Input shape for creating or overwriting a memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryDraft {
    /// Caller-chosen identifier.  Generated on create when absent; ignored on
    /// update.
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    /// Defaults to "now" when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    pub source: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl MemoryDraft {
    /// Start a draft with no tags, no metadata and no fixed id or timestamp.
    pub fn new(content: impl Into<String>, kind: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            timestamp: None,
            kind: kind.into(),
            tags: Vec::new(),
            source: source.into(),
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Check the shape rules a draft must satisfy before it reaches storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_content()?;
        if matches!(self.id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ValidationError::EmptyId);
        }
        Ok(())
    }

    /// Rules for an overwrite, where any supplied id is ignored.
    pub fn validate_content(&self) -> Result<(), ValidationError> {
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }

    /// Turn the draft into a record with the given identity and time.
    ///
    /// Missing metadata becomes an empty mapping.
    pub fn into_memory(self, id: String, timestamp: DateTime<Utc>) -> Memory {
        Memory {
            id,
            content: self.content,
            timestamp,
            kind: self.kind,
            tags: self.tags,
            source: self.source,
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}

/// Rejections raised before a draft is handed to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("id, when supplied, must not be blank")]
    EmptyId,
}
