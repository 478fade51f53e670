//! API module
//!
//! HTTP handlers and the router that wires them behind the session gate.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod json;
pub mod pages;
pub mod status;
pub mod threads;

use crate::auth::session_gate;
use crate::state::SharedState;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Chat backend is healthy".to_string(),
    })
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        // Gated pages
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/admin", get(pages::admin_dashboard))
        .route(
            "/admin/api/credentials",
            put(admin::store_credentials).delete(admin::clear_credentials),
        )
        // Identity
        .route("/api/health", get(health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/debug", get(status::debug_status))
        // Agent relay
        .route("/api/chat", post(chat::send_message))
        // Thread workspace
        .route(
            "/api/threads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route("/api/threads/current", get(threads::current_thread))
        .route("/api/threads/messages", post(threads::submit_message))
        .route(
            "/api/threads/:id",
            get(threads::get_thread).delete(threads::delete_thread),
        )
        .route("/api/threads/:id/select", post(threads::select_thread))
        .route("/api/threads/:id/pin", post(threads::toggle_pin))
        .route("/api/threads/:id/title", put(threads::update_title))
        // Middleware (innermost first: the gate sees requests after request_id)
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
