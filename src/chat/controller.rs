//! Chat submit flow
//!
//! Drives one user submission end to end: make sure a thread is current,
//! record the user message, ask the agent bridge, record the reply.
//! At most one submission per user is in flight; a concurrent one is
//! rejected with [`AppError::Busy`].

use crate::agent::{AgentBridge, ReplyKind};
use crate::chat::{AgentCredentials, ConversationStore, Message, NewMessage, ThreadId};
use crate::error::AppError;
use anyhow::anyhow;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

/// Maximum message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Validate a chat message and return it trimmed
pub fn validate_message(message: &str) -> Result<&str, AppError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Message cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Connectivity indicator shown next to the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    /// The agent answered normally
    Ready,
    /// The agent is unconfigured or unreachable; replies are degraded
    Warning,
    /// The reply could not be recorded
    Error,
}

/// Result of one submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Thread the exchange was recorded in
    pub thread_id: ThreadId,
    /// The recorded user message
    pub user_message: Message,
    /// The recorded assistant message; `None` if the thread vanished meanwhile
    pub reply: Option<Message>,
    /// Indicator derived from how the reply was obtained
    pub system_status: SystemStatus,
}

/// Submit flow driver
pub struct ChatController {
    bridge: AgentBridge,
    in_flight: Mutex<HashSet<String>>,
}

/// Releases a user's in-flight slot when dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    user_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.user_id);
    }
}

impl ChatController {
    /// Create a controller sending through `bridge`
    pub fn new(bridge: AgentBridge) -> Self {
        Self {
            bridge,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether `user_id` has a submission awaiting its reply
    pub fn is_busy(&self, user_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(user_id)
    }

    fn begin(&self, user_id: &str) -> Result<InFlightGuard<'_>, AppError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(user_id.to_string()) {
            return Err(AppError::Busy);
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            user_id: user_id.to_string(),
        })
    }

    /// Submit `text` on behalf of `user_id` into their store
    pub async fn submit(
        &self,
        user_id: &str,
        store: &AsyncMutex<ConversationStore>,
        text: &str,
        credentials: Option<AgentCredentials>,
    ) -> Result<SubmitOutcome, AppError> {
        let text = validate_message(text)?;
        let _guard = self.begin(user_id)?;

        // The store is not locked while the agent call is outstanding
        let (thread_id, history, user_message) = {
            let mut store = store.lock().await;
            if store.current_thread().is_none() {
                store.create_thread();
            }
            let thread = store
                .current_thread()
                .ok_or_else(|| AppError::Internal(anyhow!("no current thread after creation")))?;
            let thread_id = thread.id.clone();
            let history = thread.messages.clone();
            let user_message = store
                .add_message(NewMessage::user(text))
                .ok_or_else(|| AppError::Internal(anyhow!("failed to record user message")))?;
            (thread_id, history, user_message)
        };

        let reply = self
            .bridge
            .reply(text, &history, user_id, credentials.as_ref())
            .await;

        let recorded = store
            .lock()
            .await
            .add_message_to(&thread_id, NewMessage::assistant(reply.text));

        let system_status = match (&recorded, reply.kind) {
            (None, _) => {
                warn!(thread_id = %thread_id, "Thread deleted before the reply arrived");
                SystemStatus::Error
            }
            (Some(_), ReplyKind::Answered | ReplyKind::Empty) => SystemStatus::Ready,
            (Some(_), ReplyKind::NotConfigured | ReplyKind::Unavailable) => SystemStatus::Warning,
        };

        info!(
            thread_id = %thread_id,
            reply_kind = ?reply.kind,
            status = ?system_status,
            "Chat submission completed"
        );

        Ok(SubmitOutcome {
            thread_id,
            user_message,
            reply: recorded,
            system_status,
        })
    }
}
