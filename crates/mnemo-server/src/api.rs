//! Route handlers for `/api/v1/memories` and the error envelope they share.
//!
//! Every handler moves its service call onto the blocking pool, since each
//! store call opens its own engine connection and runs one statement
//! synchronously.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mnemo_memory::{
    DEFAULT_RELATED_LIMIT, DEFAULT_SEARCH_LIMIT, MemoryService, MemoryStore, ServiceError,
};
use mnemo_types::{Memory, MemoryDraft};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Error envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Failure of a single request, rendered as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// Malformed body or query, or a draft that failed validation.
    #[error("{0}")]
    Unprocessable(String),

    /// Anything the engine or the runtime refused; prefixed with the action
    /// that was being attempted.
    #[error("{action}: {message}")]
    Internal { action: &'static str, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn memory_not_found() -> Self {
        ApiError::NotFound("Memory not found".to_string())
    }

    fn from_service(action: &'static str, err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::Unprocessable(e.to_string()),
            ServiceError::Persistence(e) => ApiError::Internal {
                action,
                message: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), detail = %self, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response bodies and query strings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query_text: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct RelatedParams {
    #[serde(default = "default_related_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_related_limit() -> usize {
    DEFAULT_RELATED_LIMIT
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocking bridge
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op` against the service on the blocking pool.
///
/// A caller that goes away does not cancel the query already in flight.
async fn run_blocking<S, T, F>(
    service: MemoryService<S>,
    action: &'static str,
    op: F,
) -> Result<T, ApiError>
where
    S: MemoryStore + 'static,
    T: Send + 'static,
    F: FnOnce(&MemoryService<S>) -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| ApiError::Internal {
            action,
            message: format!("worker task failed: {e}"),
        })?
        .map_err(|e| ApiError::from_service(action, e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn create_memory<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    body: Result<Json<MemoryDraft>, JsonRejection>,
) -> Result<Json<Memory>, ApiError> {
    let Json(draft) = body?;
    let memory = run_blocking(service, "Error creating memory", move |s| s.create(draft)).await?;
    Ok(Json(memory))
}

pub async fn list_memories<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    let memories = run_blocking(service, "Error retrieving memories", |s| s.get_all()).await?;
    Ok(Json(memories))
}

pub async fn get_memory<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Memory>, ApiError> {
    let Path(id) = id?;
    run_blocking(service, "Error retrieving memory", move |s| s.get_by_id(&id))
        .await?
        .map(Json)
        .ok_or_else(ApiError::memory_not_found)
}

pub async fn update_memory<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<MemoryDraft>, JsonRejection>,
) -> Result<Json<Memory>, ApiError> {
    let Path(id) = id?;
    let Json(draft) = body?;
    run_blocking(service, "Error updating memory", move |s| s.update(&id, draft))
        .await?
        .map(Json)
        .ok_or_else(ApiError::memory_not_found)
}

pub async fn delete_memory<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path(id) = id?;
    if run_blocking(service, "Error deleting memory", move |s| s.delete(&id)).await? {
        Ok(MessageBody::new("Memory deleted successfully"))
    } else {
        Err(ApiError::memory_not_found())
    }
}

pub async fn search_memories<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    let Query(params) = params?;
    let memories = run_blocking(service, "Error searching memories", move |s| {
        s.search(&params.query_text, params.limit)
    })
    .await?;
    Ok(Json(memories))
}

pub async fn related_memories<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    id: Result<Path<String>, PathRejection>,
    params: Result<Query<RelatedParams>, QueryRejection>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    let Path(id) = id?;
    let Query(params) = params?;
    let memories = run_blocking(service, "Error retrieving related memories", move |s| {
        s.get_related(&id, params.limit)
    })
    .await?;
    Ok(Json(memories))
}

pub async fn relate_memories<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    ids: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path((id, target)) = ids?;
    if run_blocking(service, "Error relating memories", move |s| s.relate(&id, &target)).await? {
        Ok(MessageBody::new("Memories related successfully"))
    } else {
        Err(ApiError::memory_not_found())
    }
}

pub async fn unrelate_memories<S: MemoryStore + 'static>(
    State(service): State<MemoryService<S>>,
    ids: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path((id, target)) = ids?;
    if run_blocking(service, "Error unrelating memories", move |s| s.unrelate(&id, &target)).await? {
        Ok(MessageBody::new("Relationship removed successfully"))
    } else {
        Err(ApiError::NotFound("Relationship not found".to_string()))
    }
}

pub async fn banner() -> Json<MessageBody> {
    MessageBody::new("Mnemo memory graph API")
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
