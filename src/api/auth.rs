//! Sign-in and sign-out endpoints

use crate::api::json::AppJson;
use crate::auth::gate::token_from_headers;
use crate::auth::{UserProfile, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Credential sign-in request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email
    #[serde(default)]
    pub email: String,
    /// Account password
    #[serde(default)]
    pub password: String,
}

/// Successful sign-in
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The signed-in user
    pub user: UserProfile,
    /// When the session expires
    pub expires: DateTime<Utc>,
    /// The session token, also set as a cookie
    pub token: String,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// POST /api/auth/login - Sign in with email and password
pub async fn login(
    State(state): State<SharedState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user) = state.sessions.authorize(request.email.trim(), &request.password) else {
        warn!(email = %request.email.trim(), "Rejected sign-in attempt");
        return Err(AppError::InvalidCredentials);
    };

    let (token, identity) = state.sessions.issue(user);
    let cookie = session_cookie(&token, state.config.auth.session_max_age_secs);
    info!(user_id = %identity.sub(), "User signed in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: identity.user,
            expires: identity.expires,
            token,
        }),
    ))
}

/// POST /api/auth/logout - End the current session
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let revoked = token_from_headers(&headers)
        .map(|token| state.sessions.revoke(&token))
        .unwrap_or(false);
    info!(revoked, "User signed out");

    (
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(serde_json::json!({ "status": "ok" })),
    )
}
