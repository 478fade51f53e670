//! Agent module
//!
//! Talks to the remote conversational agent and normalizes its replies.

pub mod bridge;
pub mod client;
pub mod error;
pub mod types;

pub use bridge::{AgentBridge, AgentRoute, BridgeReply, ReplyKind};
pub use client::{AgentClient, AgentTarget, HttpAgentClient};
pub use error::BridgeError;
