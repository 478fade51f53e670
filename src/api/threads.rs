//! Thread workspace API
//!
//! Each signed-in user works against their own conversation store. Mutations
//! on unknown thread ids are no-ops and answer with the unchanged listing.

use crate::api::json::AppJson;
use crate::auth::RequireIdentity;
use crate::chat::{ConversationStore, SubmitOutcome, Thread, ThreadId};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Thread entry in a listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    /// Thread unique identifier
    pub id: ThreadId,
    /// Thread title
    pub title: String,
    /// Whether the thread is pinned
    pub pinned: bool,
    /// When the thread was created
    pub created_at: DateTime<Utc>,
    /// Number of messages in the thread
    pub message_count: usize,
}

impl From<&Thread> for ThreadSummary {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id.clone(),
            title: thread.title.clone(),
            pinned: thread.pinned,
            created_at: thread.created_at,
            message_count: thread.messages.len(),
        }
    }
}

/// Threads in presentation order plus the current selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadListResponse {
    /// Pinned first, newest first within each group
    pub threads: Vec<ThreadSummary>,
    /// Currently selected thread
    pub current_thread_id: Option<ThreadId>,
}

impl From<&ConversationStore> for ThreadListResponse {
    fn from(store: &ConversationStore) -> Self {
        Self {
            threads: store
                .sorted_threads()
                .into_iter()
                .map(ThreadSummary::from)
                .collect(),
            current_thread_id: store.current_thread_id().map(str::to_string),
        }
    }
}

/// Response to thread creation
#[derive(Debug, Serialize)]
pub struct CreateThreadResponse {
    /// Identifier of the new thread
    pub id: ThreadId,
}

/// Request to rename a thread
#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    /// New title
    pub title: String,
}

/// Request to submit a message into the current thread
#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    /// Message content
    #[serde(default)]
    pub message: String,
}

/// GET /api/threads - List threads in presentation order
pub async fn list_threads(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
) -> Json<ThreadListResponse> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let store = store.lock().await;
    Json(ThreadListResponse::from(&*store))
}

/// POST /api/threads - Create a thread and make it current
pub async fn create_thread(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
) -> (StatusCode, Json<CreateThreadResponse>) {
    let store = state.workspaces.store_for(identity.sub()).await;
    let id = store.lock().await.create_thread();
    info!(user_id = %identity.sub(), thread_id = %id, "Thread created");
    (StatusCode::CREATED, Json(CreateThreadResponse { id }))
}

/// GET /api/threads/current - The current thread, or null
pub async fn current_thread(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
) -> Json<Option<Thread>> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let store = store.lock().await;
    Json(store.current_thread().cloned())
}

/// GET /api/threads/:id - A thread with its messages
pub async fn get_thread(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Result<Json<Thread>, AppError> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let store = store.lock().await;
    store
        .thread(&id)
        .cloned()
        .map(Json)
        .ok_or(AppError::ThreadNotFound(id))
}

/// POST /api/threads/:id/select - Make a thread current
pub async fn select_thread(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Json<ThreadListResponse> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let mut store = store.lock().await;
    store.select_thread(&id);
    Json(ThreadListResponse::from(&*store))
}

/// POST /api/threads/:id/pin - Toggle a thread's pinned flag
pub async fn toggle_pin(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Json<ThreadListResponse> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let mut store = store.lock().await;
    store.toggle_pin_thread(&id);
    Json(ThreadListResponse::from(&*store))
}

/// DELETE /api/threads/:id - Delete a thread
pub async fn delete_thread(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Json<ThreadListResponse> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let mut store = store.lock().await;
    store.delete_thread(&id);
    info!(user_id = %identity.sub(), thread_id = %id, "Thread deleted");
    Json(ThreadListResponse::from(&*store))
}

/// PUT /api/threads/:id/title - Rename a thread
pub async fn update_title(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateTitleRequest>,
) -> Result<Json<ThreadListResponse>, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }

    let store = state.workspaces.store_for(identity.sub()).await;
    let mut store = store.lock().await;
    store.update_thread_title(&id, title);
    Ok(Json(ThreadListResponse::from(&*store)))
}

/// POST /api/threads/messages - Submit a message into the current thread
pub async fn submit_message(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    AppJson(request): AppJson<SubmitMessageRequest>,
) -> Result<Json<SubmitOutcome>, AppError> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let outcome = state
        .controller
        .submit(
            identity.sub(),
            &store,
            &request.message,
            state.agent_credentials(),
        )
        .await?;
    Ok(Json(outcome))
}
