//! Agent bridge error types
//!
//! Errors that can occur while talking to the remote agent. None of them
//! leave the bridge: they are logged and replaced by fixed reply text.

use thiserror::Error;

/// Errors that can occur while invoking the remote agent
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Agent identifiers or credentials are missing
    #[error("Agent is not configured: {0}")]
    NotConfigured(String),

    /// The HTTP request could not be sent or its body could not be read
    #[error("Failed to reach agent: {0}")]
    Transport(#[from] reqwest::Error),

    /// The agent answered with a non-success status
    #[error("Agent returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The response body was not valid agent JSON
    #[error("Failed to decode agent response: {0}")]
    Decode(String),
}
