//! Chat API endpoint
//!
//! Stateless relay to the agent: the caller supplies the history it wants
//! the agent to see.

use crate::api::json::AppJson;
use crate::auth::RequireIdentity;
use crate::chat::controller::validate_message;
use crate::chat::{Message, NewMessage};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request to send a message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Message content
    #[serde(default)]
    pub message: String,
    /// Earlier messages of the conversation, oldest first
    #[serde(default)]
    pub history: Vec<NewMessage>,
}

/// Agent reply
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Display text of the reply
    pub response: String,
}

/// POST /api/chat - Send a message with its history to the agent
pub async fn send_message(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = validate_message(&request.message)?;

    let history: Vec<Message> = request
        .history
        .into_iter()
        .map(|m| Message::new(m.role, m.content))
        .collect();

    info!(
        user_id = %identity.sub(),
        history_len = history.len(),
        "Relaying chat message"
    );

    let credentials = state.agent_credentials();
    let response = state
        .bridge
        .send(message, &history, identity.sub(), credentials.as_ref())
        .await;

    Ok(Json(ChatResponse { response }))
}
