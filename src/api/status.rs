//! Diagnostic status endpoint
//!
//! Reports the caller's session and which settings are present. Secret
//! values never leave the process; only their presence is reported.

use crate::auth::{IdentityToken, MaybeIdentity, UserProfile};
use crate::state::{AppState, SharedState};
use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session part of the status report
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    /// The signed-in user
    pub user: UserProfile,
    /// When the session expires
    pub expires: DateTime<Utc>,
}

impl From<IdentityToken> for SessionInfo {
    fn from(identity: IdentityToken) -> Self {
        Self {
            user: identity.user,
            expires: identity.expires,
        }
    }
}

/// Presence flags for configuration values
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentFlags {
    /// `AZURE_AD_CLIENT_ID` is set
    pub has_azure_client_id: bool,
    /// `AZURE_AD_CLIENT_SECRET` is set
    pub has_azure_client_secret: bool,
    /// `AZURE_AD_TENANT_ID` is set
    pub has_azure_tenant_id: bool,
    /// `ADMIN_EMAIL` is set
    pub has_admin_email: bool,
    /// `ADMIN_PASSWORD` is set
    pub has_admin_password: bool,
    /// `AWS_ACCESS_KEY_ID` is set
    pub has_aws_access_key: bool,
    /// `AWS_SECRET_ACCESS_KEY` is set
    pub has_aws_secret_key: bool,
    /// `BEDROCK_AGENT_ID` is set
    pub has_agent_id: bool,
    /// `BEDROCK_AGENT_ALIAS_ID` is set
    pub has_agent_alias_id: bool,
    /// `SESSION_SECRET` is set
    pub has_session_secret: bool,
    /// Credentials were saved through the admin endpoint
    pub has_stored_credentials: bool,
    /// Region used for agent calls (not a secret)
    pub agent_region: String,
}

/// Full status report
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Current session, if any
    pub session: Option<SessionInfo>,
    /// Configuration presence flags
    pub environment: EnvironmentFlags,
    /// When the report was produced
    pub timestamp: DateTime<Utc>,
}

impl StatusReport {
    /// Build a report for `identity` against the current state
    pub fn collect(state: &AppState, identity: Option<IdentityToken>) -> Self {
        let config = &state.config;
        let stored = state.stored_credentials();
        Self {
            session: identity.map(SessionInfo::from),
            environment: EnvironmentFlags {
                has_azure_client_id: config.auth.federated.has_client_id,
                has_azure_client_secret: config.auth.federated.has_client_secret,
                has_azure_tenant_id: config.auth.federated.has_tenant_id,
                has_admin_email: config.auth.admin_email_set,
                has_admin_password: config.auth.admin_password_set,
                has_aws_access_key: config.agent.access_key_id.is_some(),
                has_aws_secret_key: config.agent.secret_access_key.is_some(),
                has_agent_id: config.agent.agent_id.is_some(),
                has_agent_alias_id: config.agent.agent_alias_id.is_some(),
                has_session_secret: config.auth.has_session_secret,
                has_stored_credentials: stored.is_some(),
                agent_region: stored
                    .map(|c| c.region)
                    .unwrap_or_else(|| config.agent.region.clone()),
            },
            timestamp: Utc::now(),
        }
    }
}

/// GET /api/auth/debug - Session and configuration presence report
pub async fn debug_status(
    State(state): State<SharedState>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Json<StatusReport> {
    Json(StatusReport::collect(&state, identity))
}
