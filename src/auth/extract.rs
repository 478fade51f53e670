//! Identity extractors for handlers
//!
//! API routes sit outside the gate's matcher, so they reject with a JSON
//! error instead of redirecting.

use crate::auth::gate::token_from_headers;
use crate::auth::identity::IdentityToken;
use crate::error::AppError;
use crate::state::SharedState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Identity resolved by the session gate, stored as a request extension
#[derive(Debug, Clone)]
pub struct Session(pub Option<IdentityToken>);

fn resolve(parts: &Parts, state: &SharedState) -> Option<IdentityToken> {
    if let Some(Session(identity)) = parts.extensions.get::<Session>() {
        return identity.clone();
    }
    token_from_headers(&parts.headers).and_then(|t| state.sessions.verify(&t))
}

/// The caller's identity, if they have one
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<IdentityToken>);

/// A signed-in caller; rejects with 401 otherwise
#[derive(Debug, Clone)]
pub struct RequireIdentity(pub IdentityToken);

/// A signed-in admin; rejects with 401 or 403
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub IdentityToken);

#[async_trait]
impl FromRequestParts<SharedState> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(resolve(parts, state)))
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .map(RequireIdentity)
            .ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve(parts, state).ok_or(AppError::Unauthorized)?;
        if !identity.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(RequireAdmin(identity))
    }
}
