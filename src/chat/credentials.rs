//! Agent credential store
//!
//! Holds credentials entered through the credential-entry flow. They are kept
//! under their own durable key and take precedence over environment credentials.

use crate::state::{PersistenceError, Storage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Storage key holding the serialized credentials
pub const CREDENTIALS_KEY: &str = "agent-credentials";

/// Credentials used to authenticate calls to the remote agent
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret paired with the access key id
    pub secret_access_key: String,
    /// Region the credentials are scoped to
    pub region: String,
}

impl std::fmt::Debug for AgentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl AgentCredentials {
    /// Check that no field is blank
    pub fn validate(&self) -> Result<(), String> {
        if self.access_key_id.trim().is_empty() {
            return Err("Access key id cannot be empty".to_string());
        }
        if self.secret_access_key.trim().is_empty() {
            return Err("Secret access key cannot be empty".to_string());
        }
        if self.region.trim().is_empty() {
            return Err("Region cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Durable holder of at most one set of credentials
pub struct CredentialStore {
    credentials: Option<AgentCredentials>,
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    /// Open the store, restoring saved credentials
    ///
    /// Malformed saved data is treated as "signed out".
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let credentials: Option<AgentCredentials> = match storage.get_item(CREDENTIALS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json)
                .map_err(|e| warn!(error = %e, "Failed to parse stored credentials"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                None
            }
        };
        Self {
            credentials,
            storage,
        }
    }

    /// Whether credentials are present
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// The stored credentials, if any
    pub fn credentials(&self) -> Option<&AgentCredentials> {
        self.credentials.as_ref()
    }

    /// Store new credentials, replacing any previous ones
    ///
    /// The in-memory credentials change only once the write succeeded.
    pub fn login(&mut self, credentials: AgentCredentials) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(&credentials)
            .map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        self.storage.set_item(CREDENTIALS_KEY, &json)?;
        self.credentials = Some(credentials);
        Ok(())
    }

    /// Forget the stored credentials
    ///
    /// On a failed removal the previous credentials stay in effect.
    pub fn logout(&mut self) -> Result<(), PersistenceError> {
        self.storage.remove_item(CREDENTIALS_KEY)?;
        self.credentials = None;
        Ok(())
    }
}
