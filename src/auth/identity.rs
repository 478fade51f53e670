//! Identity types
//!
//! What the rest of the application knows about a signed-in caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role claim carried by an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including the admin pages
    Admin,
    /// Any other signed-in user
    #[default]
    User,
}

/// Public profile of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role claim
    pub role: Role,
}

/// A verified identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityToken {
    /// The signed-in user
    pub user: UserProfile,
    /// When the session was issued
    pub issued_at: DateTime<Utc>,
    /// When the session stops being valid
    pub expires: DateTime<Utc>,
}

impl IdentityToken {
    /// Subject identifier (the user id)
    pub fn sub(&self) -> &str {
        &self.user.id
    }

    /// Role claim
    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Whether the identity carries the admin role
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}
