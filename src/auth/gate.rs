//! Session gate
//!
//! Access policy for page routes. The gate never creates or checks tokens
//! itself: [`session_gate`] asks the session registry for the identity and
//! [`evaluate`] decides on the already-verified result.

use crate::auth::identity::IdentityToken;
use crate::auth::sessions::SESSION_COOKIE;
use crate::auth::Session;
use crate::state::SharedState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Url;
use tracing::debug;

/// Path of the sign-in page
pub const LOGIN_PATH: &str = "/login";
/// Landing page for signed-in users
pub const HOME_PATH: &str = "/";
/// Prefix reserved for the admin role
pub const ADMIN_PREFIX: &str = "/admin";

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through
    Allow,
    /// Send the caller to the sign-in page, then back to `callback`
    RedirectToLogin {
        /// Where to return after signing in
        callback: String,
    },
    /// Send the caller to the landing page
    RedirectHome,
}

/// Whether `path` falls under the gate at all
pub fn is_gated(path: &str) -> bool {
    path == LOGIN_PATH || path == HOME_PATH || is_admin_path(path)
}

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/admin/")
}

/// Decide what happens to a request for `target` carrying `identity`
///
/// `target` is the path, optionally followed by its query string.
pub fn evaluate(target: &str, identity: Option<&IdentityToken>) -> GateDecision {
    let path = target.split('?').next().unwrap_or(target);
    if !is_gated(path) {
        return GateDecision::Allow;
    }

    match identity {
        None if path == LOGIN_PATH => GateDecision::Allow,
        None => GateDecision::RedirectToLogin {
            callback: target.to_string(),
        },
        Some(_) if path == LOGIN_PATH => GateDecision::RedirectHome,
        Some(token) if is_admin_path(path) && !token.is_admin() => GateDecision::RedirectHome,
        Some(_) => GateDecision::Allow,
    }
}

/// `/login?callbackUrl=<callback>` with the callback form-encoded
pub fn login_url(callback: &str) -> String {
    match Url::parse_with_params("http://gate.local/login", &[("callbackUrl", callback)]) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => LOGIN_PATH.to_string(),
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Middleware resolving the caller's identity and applying the gate
///
/// Every request leaves with a [`Session`] extension so handlers need not
/// look the token up again.
pub async fn session_gate(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = token_from_headers(request.headers()).and_then(|t| state.sessions.verify(&t));

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    match evaluate(&target, identity.as_ref()) {
        GateDecision::Allow => {
            request.extensions_mut().insert(Session(identity));
            next.run(request).await
        }
        GateDecision::RedirectToLogin { callback } => {
            debug!(path = %target, "Unauthenticated request redirected to login");
            Redirect::temporary(&login_url(&callback)).into_response()
        }
        GateDecision::RedirectHome => {
            debug!(
                path = %target,
                user_id = identity.as_ref().map(|i| i.sub()).unwrap_or_default(),
                "Request redirected home"
            );
            Redirect::temporary(HOME_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{Role, UserProfile};
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    fn token(role: Role) -> IdentityToken {
        IdentityToken {
            user: UserProfile {
                id: "42".to_string(),
                name: "Test".to_string(),
                email: "t@example.com".to_string(),
                role,
            },
            issued_at: Utc::now(),
            expires: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn test_matcher() {
        assert!(is_gated("/"));
        assert!(is_gated("/login"));
        assert!(is_gated("/admin"));
        assert!(is_gated("/admin/api/credentials"));
        assert!(!is_gated("/api/chat"));
        assert!(!is_gated("/login/extra"));
        assert!(!is_gated("/administrator"));
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        assert_eq!(
            evaluate("/", None),
            GateDecision::RedirectToLogin {
                callback: "/".to_string()
            }
        );
        assert_eq!(
            evaluate("/admin?tab=1", None),
            GateDecision::RedirectToLogin {
                callback: "/admin?tab=1".to_string()
            }
        );
        assert_eq!(evaluate("/login", None), GateDecision::Allow);
    }

    #[test]
    fn test_non_admin_on_admin_path_goes_home() {
        let user = token(Role::User);
        assert_eq!(evaluate("/admin", Some(&user)), GateDecision::RedirectHome);
        assert_eq!(
            evaluate("/admin/api/credentials", Some(&user)),
            GateDecision::RedirectHome
        );
        assert_eq!(evaluate("/", Some(&user)), GateDecision::Allow);
    }

    #[test]
    fn test_admin_allowed_everywhere_but_login() {
        let admin = token(Role::Admin);
        assert_eq!(evaluate("/admin", Some(&admin)), GateDecision::Allow);
        assert_eq!(evaluate("/", Some(&admin)), GateDecision::Allow);
        assert_eq!(evaluate("/login", Some(&admin)), GateDecision::RedirectHome);
    }

    #[test]
    fn test_ungated_paths_pass() {
        assert_eq!(evaluate("/api/threads", None), GateDecision::Allow);
        assert_eq!(
            evaluate("/api/auth/debug", Some(&token(Role::User))),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_login_url_encodes_callback() {
        assert_eq!(login_url("/"), "/login?callbackUrl=%2F");
        assert_eq!(
            login_url("/admin?tab=1"),
            "/login?callbackUrl=%2Fadmin%3Ftab%3D1"
        );
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc123"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer fromheader"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("fromheader"));
    }
}
