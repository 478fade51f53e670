//! Session registry
//!
//! Issues and verifies opaque session tokens. Sign-in is by email and
//! password against the configured admin account; a verified token maps
//! back to the [`IdentityToken`] it was issued for.

use crate::auth::identity::{IdentityToken, Role, UserProfile};
use crate::config::{AuthConfig, DEFAULT_SESSION_MAX_AGE_SECS, MAX_SESSION_MAX_AGE_SECS};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// An account accepted by credential sign-in
#[derive(Clone)]
struct Account {
    profile: UserProfile,
    password: String,
}

/// Registry of live sessions
pub struct SessionRegistry {
    accounts: Vec<Account>,
    max_age: Duration,
    sessions: RwLock<HashMap<String, IdentityToken>>,
}

impl SessionRegistry {
    /// Build a registry holding the configured admin account
    pub fn from_config(config: &AuthConfig) -> Self {
        let admin = Account {
            profile: UserProfile {
                id: "1".to_string(),
                name: "Administrator".to_string(),
                email: config.admin_email.clone(),
                role: Role::Admin,
            },
            password: config.admin_password.clone(),
        };
        Self {
            accounts: vec![admin],
            max_age: session_lifetime(config.session_max_age_secs),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Check an email/password pair; blank fields never match
    pub fn authorize(&self, email: &str, password: &str) -> Option<UserProfile> {
        if email.is_empty() || password.is_empty() {
            return None;
        }
        let account = self.accounts.iter().find(|a| a.profile.email == email)?;
        if !constant_time_eq(account.password.as_bytes(), password.as_bytes()) {
            debug!(email = %email, "Password mismatch");
            return None;
        }
        Some(account.profile.clone())
    }

    /// Start a session for `user` and return its token
    pub fn issue(&self, user: UserProfile) -> (String, IdentityToken) {
        let now = Utc::now();
        let identity = IdentityToken {
            user,
            issued_at: now,
            expires: now
                .checked_add_signed(self.max_age)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let token = Uuid::new_v4().simple().to_string();

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.retain(|_, held| !held.is_expired_at(now));
        sessions.insert(token.clone(), identity.clone());
        drop(sessions);

        info!(user_id = %identity.sub(), role = ?identity.role(), "Session issued");
        (token, identity)
    }

    /// Resolve a token to its identity; expired tokens are evicted
    pub fn verify(&self, token: &str) -> Option<IdentityToken> {
        let identity = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()?;
        if identity.is_expired_at(Utc::now()) {
            self.revoke(token);
            return None;
        }
        Some(identity)
    }

    /// End a session; returns whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
            .is_some()
    }

    /// Number of sessions currently held
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether no sessions are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn session_lifetime(secs: i64) -> Duration {
    if secs <= 0 || secs > MAX_SESSION_MAX_AGE_SECS {
        warn!(secs, "Session max age out of range, using the default");
        return Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS);
    }
    Duration::seconds(secs)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry_with_max_age(secs: &str) -> SessionRegistry {
        let secs = secs.to_string();
        let config = Config::from_lookup(move |key| match key {
            "ADMIN_EMAIL" => Some("boss@example.com".to_string()),
            "ADMIN_PASSWORD" => Some("correct horse".to_string()),
            "SESSION_MAX_AGE_SECS" => Some(secs.clone()),
            _ => None,
        });
        SessionRegistry::from_config(&config.auth)
    }

    #[test]
    fn test_authorize_admin_account() {
        let registry = registry_with_max_age("60");

        let user = registry.authorize("boss@example.com", "correct horse").unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.id, "1");

        assert!(registry.authorize("boss@example.com", "wrong").is_none());
        assert!(registry.authorize("other@example.com", "correct horse").is_none());
        assert!(registry.authorize("", "").is_none());
    }

    #[test]
    fn test_issue_verify_revoke() {
        let registry = registry_with_max_age("60");
        let user = registry.authorize("boss@example.com", "correct horse").unwrap();

        let (token, identity) = registry.issue(user);
        assert_eq!(registry.verify(&token), Some(identity));
        assert_eq!(registry.len(), 1);

        assert!(registry.revoke(&token));
        assert!(registry.verify(&token).is_none());
        assert!(!registry.revoke(&token));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let registry = registry_with_max_age("60");
        assert!(registry.verify("not-a-token").is_none());
    }

    #[test]
    fn test_expired_session_is_evicted() {
        let registry = registry_with_max_age("60");
        let user = registry.authorize("boss@example.com", "correct horse").unwrap();
        let (token, _) = registry.issue(user);

        registry
            .sessions
            .write()
            .unwrap()
            .get_mut(&token)
            .unwrap()
            .expires = Utc::now() - Duration::seconds(1);

        assert!(registry.verify(&token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_issue_reclaims_expired_sessions() {
        let registry = registry_with_max_age("60");
        let user = registry.authorize("boss@example.com", "correct horse").unwrap();

        for _ in 0..100 {
            registry.issue(user.clone());
        }
        for held in registry.sessions.write().unwrap().values_mut() {
            held.expires = Utc::now() - Duration::seconds(1);
        }

        let (fresh, _) = registry.issue(user);
        assert_eq!(registry.len(), 1);
        assert!(registry.verify(&fresh).is_some());
    }

    #[test]
    fn test_out_of_range_max_age_does_not_panic() {
        let mut config = Config::from_lookup(|key| match key {
            "ADMIN_EMAIL" => Some("boss@example.com".to_string()),
            "ADMIN_PASSWORD" => Some("correct horse".to_string()),
            _ => None,
        });

        for secs in [99_999_999_999_999_999, 100_000_000_000_000, i64::MAX, -1] {
            config.auth.session_max_age_secs = secs;
            let registry = SessionRegistry::from_config(&config.auth);
            let user = registry.authorize("boss@example.com", "correct horse").unwrap();

            let (token, identity) = registry.issue(user);
            assert!(identity.expires > identity.issued_at);
            let lifetime = identity.expires - identity.issued_at;
            assert!(lifetime <= Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS));
            assert!(registry.verify(&token).is_some());
        }
    }

    #[test]
    fn test_session_lifetime_bounds() {
        assert_eq!(session_lifetime(60), Duration::seconds(60));
        assert_eq!(
            session_lifetime(MAX_SESSION_MAX_AGE_SECS),
            Duration::seconds(MAX_SESSION_MAX_AGE_SECS)
        );
        assert_eq!(
            session_lifetime(MAX_SESSION_MAX_AGE_SECS + 1),
            Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS)
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
