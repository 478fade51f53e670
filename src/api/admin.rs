//! Admin credential endpoints
//!
//! Saves or clears the agent credentials that take precedence over the
//! environment for agent calls.

use crate::api::json::AppJson;
use crate::auth::RequireAdmin;
use crate::chat::AgentCredentials;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::info;

/// Credential store state, without secrets
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// Whether credentials are stored
    pub has_stored_credentials: bool,
    /// Region of the stored credentials
    pub region: Option<String>,
}

/// PUT /admin/api/credentials - Store agent credentials
pub async fn store_credentials(
    State(state): State<SharedState>,
    RequireAdmin(identity): RequireAdmin,
    AppJson(credentials): AppJson<AgentCredentials>,
) -> Result<Json<CredentialStatus>, AppError> {
    credentials.validate().map_err(AppError::InvalidInput)?;
    let region = credentials.region.clone();

    state
        .credentials
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .login(credentials)?;
    info!(user_id = %identity.sub(), region = %region, "Agent credentials stored");

    Ok(Json(CredentialStatus {
        has_stored_credentials: true,
        region: Some(region),
    }))
}

/// DELETE /admin/api/credentials - Clear stored agent credentials
pub async fn clear_credentials(
    State(state): State<SharedState>,
    RequireAdmin(identity): RequireAdmin,
) -> Result<Json<CredentialStatus>, AppError> {
    state
        .credentials
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .logout()?;
    info!(user_id = %identity.sub(), "Agent credentials cleared");

    Ok(Json(CredentialStatus {
        has_stored_credentials: false,
        region: None,
    }))
}
