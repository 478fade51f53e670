//! Gated pages
//!
//! These routes sit behind the session gate, so the handlers only see
//! requests the gate already allowed.

use crate::api::status::StatusReport;
use crate::auth::{RequireAdmin, RequireIdentity, UserProfile};
use crate::state::SharedState;
use axum::{
    extract::State,
    response::{Html, Json},
};
use serde::Serialize;

const LOGIN_FORM: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<form id="login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Sign in</button>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (event) => {
  event.preventDefault();
  const form = new FormData(event.target);
  const res = await fetch("/api/auth/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
  });
  if (res.ok) {
    const next = new URLSearchParams(location.search).get("callbackUrl") || "/";
    location.assign(next.startsWith("/") ? next : "/");
  }
});
</script>
</body>
</html>
"#;

/// Landing page payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    /// The signed-in user
    pub user: UserProfile,
    /// Number of threads the user owns
    pub thread_count: usize,
}

/// GET / - Landing page
pub async fn home(
    State(state): State<SharedState>,
    RequireIdentity(identity): RequireIdentity,
) -> Json<HomeResponse> {
    let store = state.workspaces.store_for(identity.sub()).await;
    let thread_count = store.lock().await.threads().len();
    Json(HomeResponse {
        user: identity.user,
        thread_count,
    })
}

/// GET /login - Sign-in form
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_FORM)
}

/// GET /admin - Admin dashboard payload
pub async fn admin_dashboard(
    State(state): State<SharedState>,
    RequireAdmin(identity): RequireAdmin,
) -> Json<StatusReport> {
    Json(StatusReport::collect(&state, Some(identity)))
}
