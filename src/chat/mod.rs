//! Chat module
//!
//! Conversation threads, their durable store, the agent credential store and
//! the submit flow that ties a thread to the agent bridge.

pub mod controller;
pub mod credentials;
pub mod models;
pub mod store;

pub use controller::{ChatController, SubmitOutcome, SystemStatus};
pub use credentials::{AgentCredentials, CredentialStore};
pub use models::{Message, MessageId, MessageRole, NewMessage, Thread, ThreadId};
pub use store::ConversationStore;
