// Application state management
// Shared by every handler: configuration, identity sessions, the agent bridge,
// per-user conversation stores and the agent credential store

use crate::agent::{AgentBridge, AgentClient, AgentRoute};
use crate::auth::SessionRegistry;
use crate::chat::{AgentCredentials, ChatController, ConversationStore, CredentialStore};
use crate::config::Config;
use crate::state::persistence::{FileStorage, MemoryStorage, Storage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::debug;

/// Handle shared with every request handler
pub type SharedState = Arc<AppState>;

/// Main application state
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    /// Signed-in identities
    pub sessions: SessionRegistry,
    /// Bridge to the remote agent
    pub bridge: AgentBridge,
    /// One conversation store per user
    pub workspaces: ThreadWorkspaces,
    /// Submit flow driver
    pub controller: ChatController,
    /// Credentials entered through the credential-entry flow
    pub credentials: Mutex<CredentialStore>,
}

impl AppState {
    /// Create state persisted under `config.persistence.data_dir`
    pub fn new(config: Config, client: Arc<dyn AgentClient>) -> Self {
        let data_dir = config.persistence.data_dir.clone();
        let credential_storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&data_dir));
        Self::build(
            config,
            client,
            ThreadWorkspaces::on_disk(data_dir.join("users")),
            credential_storage,
        )
    }

    /// Create state that keeps everything in memory
    pub fn in_memory(config: Config, client: Arc<dyn AgentClient>) -> Self {
        Self::build(
            config,
            client,
            ThreadWorkspaces::in_memory(),
            Arc::new(MemoryStorage::new()),
        )
    }

    fn build(
        config: Config,
        client: Arc<dyn AgentClient>,
        workspaces: ThreadWorkspaces,
        credential_storage: Arc<dyn Storage>,
    ) -> Self {
        let bridge = AgentBridge::new(
            client,
            AgentRoute {
                agent_id: config.agent.agent_id.clone(),
                agent_alias_id: config.agent.agent_alias_id.clone(),
            },
        );
        Self {
            sessions: SessionRegistry::from_config(&config.auth),
            controller: ChatController::new(bridge.clone()),
            bridge,
            workspaces,
            credentials: Mutex::new(CredentialStore::open(credential_storage)),
            config,
        }
    }

    /// Credentials for agent calls
    ///
    /// Stored credentials win over the environment; `None` when neither is complete.
    pub fn agent_credentials(&self) -> Option<AgentCredentials> {
        if let Some(stored) = self.stored_credentials() {
            return Some(stored);
        }
        let agent = &self.config.agent;
        match (&agent.access_key_id, &agent.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AgentCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                region: agent.region.clone(),
            }),
            _ => None,
        }
    }

    /// Credentials saved through the credential-entry flow, if any
    pub fn stored_credentials(&self) -> Option<AgentCredentials> {
        self.credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .credentials()
            .cloned()
    }
}

/// Lazily opened conversation stores keyed by user id
pub struct ThreadWorkspaces {
    /// Root directory for per-user storage; `None` keeps stores in memory
    root: Option<PathBuf>,
    stores: RwLock<HashMap<String, Arc<AsyncMutex<ConversationStore>>>>,
}

impl ThreadWorkspaces {
    /// Workspaces persisted under `root/<user>/`
    pub fn on_disk(root: PathBuf) -> Self {
        Self {
            root: Some(root),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Workspaces that live only as long as the process
    pub fn in_memory() -> Self {
        Self {
            root: None,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// The store owned by `user_id`, opening it on first use
    pub async fn store_for(&self, user_id: &str) -> Arc<AsyncMutex<ConversationStore>> {
        if let Some(store) = self.stores.read().await.get(user_id) {
            return store.clone();
        }

        let mut stores = self.stores.write().await;
        // Another request may have opened it while we waited for the write lock
        if let Some(store) = stores.get(user_id) {
            return store.clone();
        }

        let storage: Arc<dyn Storage> = match &self.root {
            Some(root) => Arc::new(FileStorage::new(root.join(user_dir_name(user_id)))),
            None => Arc::new(MemoryStorage::new()),
        };
        debug!(user_id = %user_id, "Opening conversation store");
        let store = Arc::new(AsyncMutex::new(ConversationStore::open(storage)));
        stores.insert(user_id.to_string(), store.clone());
        store
    }
}

/// Directory name for a user id
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `_XX`
/// (uppercase hex). `_` is only ever an escape, so distinct ids never share
/// a directory. The empty id maps to a lone `_`, which no encoding produces.
pub fn user_dir_name(user_id: &str) -> String {
    if user_id.is_empty() {
        return "_".to_string();
    }
    let mut name = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("_{:02X}", byte));
        }
    }
    name
}
