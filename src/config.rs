//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Missing agent or identity settings never fail
//! startup; they surface later as degraded chat replies and status flags.

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Remote agent configuration
    pub agent: AgentConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Base directory for per-user thread and credential storage
    pub data_dir: PathBuf,
}

/// Remote conversational agent configuration
#[derive(Clone)]
pub struct AgentConfig {
    /// Region the agent runs in
    pub region: String,
    /// Base URL of the agent runtime
    pub endpoint: String,
    /// Agent identifier
    pub agent_id: Option<String>,
    /// Agent alias identifier
    pub agent_alias_id: Option<String>,
    /// Access key id used to authenticate agent calls
    pub access_key_id: Option<String>,
    /// Secret paired with `access_key_id`
    pub secret_access_key: Option<String>,
    /// HTTP timeout for a single agent call (in seconds)
    pub timeout_secs: u64,
}

// Secrets stay out of `{:?}` output because main logs the loaded config.
impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("agent_id", &self.agent_id)
            .field("agent_alias_id", &self.agent_alias_id)
            .field("has_access_key_id", &self.access_key_id.is_some())
            .field("has_secret_access_key", &self.secret_access_key.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Email of the built-in admin account
    pub admin_email: String,
    /// Password of the built-in admin account
    pub admin_password: String,
    /// Whether `ADMIN_EMAIL` was set explicitly
    pub admin_email_set: bool,
    /// Whether `ADMIN_PASSWORD` was set explicitly
    pub admin_password_set: bool,
    /// Session lifetime (in seconds)
    pub session_max_age_secs: i64,
    /// Whether a session secret is configured
    pub has_session_secret: bool,
    /// Federated identity provider settings (presence only)
    pub federated: FederatedProviderFlags,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_password_set", &self.admin_password_set)
            .field("session_max_age_secs", &self.session_max_age_secs)
            .field("has_session_secret", &self.has_session_secret)
            .field("federated", &self.federated)
            .finish()
    }
}

/// Presence flags for the federated identity provider settings
#[derive(Debug, Clone, Copy, Default)]
pub struct FederatedProviderFlags {
    /// `AZURE_AD_CLIENT_ID` is set
    pub has_client_id: bool,
    /// `AZURE_AD_CLIENT_SECRET` is set
    pub has_client_secret: bool,
    /// `AZURE_AD_TENANT_ID` is set
    pub has_tenant_id: bool,
}

const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "adminpassword";
const DEFAULT_REGION: &str = "us-east-1";
/// Default session lifetime, 30 days
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;
/// Longest accepted session lifetime, 10 years
pub const MAX_SESSION_MAX_AGE_SECS: i64 = 10 * 365 * 24 * 60 * 60;

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let region = get("AWS_REGION")
            .or_else(|| get("REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = get("AGENT_ENDPOINT")
            .unwrap_or_else(|| format!("https://bedrock-agent-runtime.{}.amazonaws.com", region));

        let admin_email = get("ADMIN_EMAIL");
        let admin_password = get("ADMIN_PASSWORD");

        Self {
            server: ServerConfig {
                port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| {
                    if let Some(home) = get("HOME") {
                        PathBuf::from(home).join(".agent-chat")
                    } else {
                        PathBuf::from(".agent-chat")
                    }
                }),
            },
            agent: AgentConfig {
                region,
                endpoint: endpoint.trim_end_matches('/').to_string(),
                agent_id: get("BEDROCK_AGENT_ID"),
                agent_alias_id: get("BEDROCK_AGENT_ALIAS_ID"),
                access_key_id: get("AWS_ACCESS_KEY_ID"),
                secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
                timeout_secs: get("AGENT_TIMEOUT_SECS")
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
            auth: AuthConfig {
                admin_email_set: admin_email.is_some(),
                admin_password_set: admin_password.is_some(),
                admin_email: admin_email.unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
                admin_password: admin_password
                    .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
                session_max_age_secs: get("SESSION_MAX_AGE_SECS")
                    .and_then(|t| t.parse().ok())
                    .filter(|t: &i64| *t > 0 && *t <= MAX_SESSION_MAX_AGE_SECS)
                    .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS),
                has_session_secret: get("SESSION_SECRET").is_some(),
                federated: FederatedProviderFlags {
                    has_client_id: get("AZURE_AD_CLIENT_ID").is_some(),
                    has_client_secret: get("AZURE_AD_CLIENT_SECRET").is_some(),
                    has_tenant_id: get("AZURE_AD_TENANT_ID").is_some(),
                },
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
