//! Authentication module
//!
//! Credential sign-in, the session registry that verifies identity tokens,
//! and the session gate applied to page routes.

pub mod extract;
pub mod gate;
pub mod identity;
pub mod sessions;

pub use extract::{MaybeIdentity, RequireAdmin, RequireIdentity, Session};
pub use gate::{evaluate, session_gate, GateDecision};
pub use identity::{IdentityToken, Role, UserProfile};
pub use sessions::{SessionRegistry, SESSION_COOKIE};
