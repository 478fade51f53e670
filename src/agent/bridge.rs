//! Agent bridge
//!
//! Forwards a user message and the recent history to the remote agent and
//! flattens whatever comes back into a single display string.
//!
//! Failure handling:
//! - Missing agent identifiers or credentials produce [`NOT_CONFIGURED_MESSAGE`]
//!   without contacting the agent
//! - Any transport, status or decode failure produces [`APOLOGY_MESSAGE`]
//! - A response with no usable content produces [`FALLBACK_MESSAGE`]
//!
//! Callers therefore never observe an error from this path.

use crate::agent::client::{AgentClient, AgentTarget};
use crate::agent::error::BridgeError;
use crate::agent::types::{
    AgentReply, ChunkPayload, Citation, ContentBlock, ConversationHistory, HistoryMessage,
    InvokeAgentRequest, SessionState,
};
use crate::chat::{AgentCredentials, Message};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Maximum number of history entries forwarded with a message
pub const MAX_HISTORY: usize = 10;

/// Reply used when the agent returned nothing displayable
pub const FALLBACK_MESSAGE: &str =
    "I'm sorry, I couldn't generate a response. Please try rephrasing your question.";

/// Reply used when the agent could not be reached
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I can't connect to the AI service right now. Please try again in a moment.";

/// Reply used when the agent is not configured
pub const NOT_CONFIGURED_MESSAGE: &str =
    "The AI agent is not configured yet, so only basic responses are available. Please contact an administrator.";

const REFERENCES_HEADER: &str = "**References:**";
const REFERENCE_PLACEHOLDER: &str = "(reference text unavailable)";

/// How a reply was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The agent produced usable content
    Answered,
    /// The agent responded but without usable content
    Empty,
    /// Agent identifiers or credentials are missing
    NotConfigured,
    /// The agent could not be reached or failed
    Unavailable,
}

/// A normalized reply plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReply {
    /// Display text
    pub text: String,
    /// Outcome classification
    pub kind: ReplyKind,
}

impl BridgeReply {
    fn new(text: &str, kind: ReplyKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }
}

/// Agent identifiers the bridge routes to
#[derive(Debug, Clone, Default)]
pub struct AgentRoute {
    /// Agent identifier
    pub agent_id: Option<String>,
    /// Agent alias identifier
    pub agent_alias_id: Option<String>,
}

/// Bridge between chat handlers and the remote agent
#[derive(Clone)]
pub struct AgentBridge {
    client: Arc<dyn AgentClient>,
    route: AgentRoute,
}

impl AgentBridge {
    /// Create a bridge over `client`, routing to `route`
    pub fn new(client: Arc<dyn AgentClient>, route: AgentRoute) -> Self {
        Self { client, route }
    }

    /// Whether agent identifiers are configured
    pub fn is_configured(&self) -> bool {
        self.route.agent_id.is_some() && self.route.agent_alias_id.is_some()
    }

    /// Send a message and return the display text
    pub async fn send(
        &self,
        message: &str,
        history: &[Message],
        session_key: &str,
        credentials: Option<&AgentCredentials>,
    ) -> String {
        self.reply(message, history, session_key, credentials)
            .await
            .text
    }

    /// Send a message and return the display text with its classification
    pub async fn reply(
        &self,
        message: &str,
        history: &[Message],
        session_key: &str,
        credentials: Option<&AgentCredentials>,
    ) -> BridgeReply {
        match self.invoke(message, history, session_key, credentials).await {
            Ok(reply) => match normalize(reply) {
                Some(text) => BridgeReply { text, kind: ReplyKind::Answered },
                None => {
                    warn!(session_key = %session_key, "Agent response had no usable content");
                    BridgeReply::new(FALLBACK_MESSAGE, ReplyKind::Empty)
                }
            },
            Err(BridgeError::NotConfigured(missing)) => {
                warn!(missing = %missing, "Agent call skipped, configuration incomplete");
                BridgeReply::new(NOT_CONFIGURED_MESSAGE, ReplyKind::NotConfigured)
            }
            Err(e) => {
                error!(session_key = %session_key, error = %e, "Agent call failed");
                BridgeReply::new(APOLOGY_MESSAGE, ReplyKind::Unavailable)
            }
        }
    }

    async fn invoke(
        &self,
        message: &str,
        history: &[Message],
        session_key: &str,
        credentials: Option<&AgentCredentials>,
    ) -> Result<AgentReply, BridgeError> {
        let (agent_id, agent_alias_id) = match (&self.route.agent_id, &self.route.agent_alias_id) {
            (Some(id), Some(alias)) => (id.clone(), alias.clone()),
            (None, _) => return Err(BridgeError::NotConfigured("agent id".to_string())),
            (_, None) => return Err(BridgeError::NotConfigured("agent alias id".to_string())),
        };
        let credentials = credentials
            .ok_or_else(|| BridgeError::NotConfigured("agent credentials".to_string()))?;

        let target = AgentTarget {
            agent_id,
            agent_alias_id,
            session_id: session_id_for(session_key),
        };
        let request = build_request(message, history);

        let response = self.client.invoke(&target, &request, credentials).await?;
        let reply = AgentReply::from(response);

        info!(
            session_id = %target.session_id,
            history_len = request.session_state.conversation_history.messages.len(),
            "Agent response received"
        );
        Ok(reply)
    }
}

/// Build the agent request, keeping only the last [`MAX_HISTORY`] history entries
pub fn build_request(message: &str, history: &[Message]) -> InvokeAgentRequest {
    let start = history.len().saturating_sub(MAX_HISTORY);
    let messages = history[start..]
        .iter()
        .map(|m| HistoryMessage {
            role: m.role.as_str().to_string(),
            content: vec![ContentBlock {
                text: m.content.clone(),
            }],
        })
        .collect();

    InvokeAgentRequest {
        input_text: message.to_string(),
        session_state: SessionState {
            conversation_history: ConversationHistory { messages },
        },
    }
}

/// Flatten a decoded reply into display text
///
/// Returns `None` when there is nothing to show.
pub fn normalize(reply: AgentReply) -> Option<String> {
    let (body, citations) = match reply {
        AgentReply::Direct { text, citations } => (text, citations),
        AgentReply::Chunked { segments } => (join_segments(&segments), Vec::new()),
        AgentReply::ChunkedWithCitations {
            segments,
            citations,
        } => (join_segments(&segments), citations),
        AgentReply::Unrecognized => return None,
    };

    if body.trim().is_empty() {
        return None;
    }
    Some(format!("{}{}", body, format_references(&citations)))
}

fn join_segments(segments: &[Vec<u8>]) -> String {
    segments
        .iter()
        .filter_map(|bytes| {
            serde_json::from_slice::<ChunkPayload>(bytes)
                .map_err(|e| warn!(error = %e, "Skipping undecodable chunk"))
                .ok()
        })
        .map(|payload| payload.text)
        .collect()
}

fn format_references(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let entries: Vec<String> = citations
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {}",
                i + 1,
                c.first_reference_text().unwrap_or(REFERENCE_PLACEHOLDER)
            )
        })
        .collect();
    format!("\n\n{}\n{}", REFERENCES_HEADER, entries.join("\n"))
}

/// Map an identity to a session id accepted by the agent service
pub fn session_id_for(session_key: &str) -> String {
    let id: String = session_key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if id.is_empty() {
        "anonymous".to_string()
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::{InvokeAgentResponse, ReferenceContent, RetrievedReference};
    use crate::chat::MessageRole;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::sync::Mutex;

    /// Client returning a canned body and recording what it was asked
    struct StubClient {
        body: Option<String>,
        seen: Mutex<Vec<(AgentTarget, InvokeAgentRequest)>>,
    }

    impl StubClient {
        fn answering(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Some(body.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AgentClient for StubClient {
        async fn invoke(
            &self,
            target: &AgentTarget,
            request: &InvokeAgentRequest,
            _credentials: &AgentCredentials,
        ) -> Result<InvokeAgentResponse, BridgeError> {
            self.seen
                .lock()
                .unwrap()
                .push((target.clone(), request.clone()));
            match &self.body {
                Some(body) => {
                    serde_json::from_str(body).map_err(|e| BridgeError::Decode(e.to_string()))
                }
                None => Err(BridgeError::Status {
                    status: 502,
                    body: "connection reset".to_string(),
                }),
            }
        }
    }

    fn route() -> AgentRoute {
        AgentRoute {
            agent_id: Some("AGENT1".to_string()),
            agent_alias_id: Some("ALIAS1".to_string()),
        }
    }

    fn creds() -> AgentCredentials {
        AgentCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn chunk(text: &str) -> Vec<u8> {
        serde_json::json!({ "text": text }).to_string().into_bytes()
    }

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                Message::new(role, format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn test_chunks_concatenate_in_order_without_separator() {
        let reply = AgentReply::Chunked {
            segments: vec![chunk("Hel"), chunk("lo, "), chunk("world")],
        };
        assert_eq!(normalize(reply), Some("Hello, world".to_string()));
    }

    #[test]
    fn test_undecodable_chunk_is_skipped() {
        let reply = AgentReply::Chunked {
            segments: vec![chunk("A"), b"\xff\xfe".to_vec(), chunk("B")],
        };
        assert_eq!(normalize(reply), Some("AB".to_string()));
    }

    #[test]
    fn test_references_are_numbered() {
        let cited = Citation {
            retrieved_references: vec![RetrievedReference {
                content: Some(ReferenceContent {
                    text: Some("Policy section 2".to_string()),
                }),
            }],
        };
        let reply = AgentReply::ChunkedWithCitations {
            segments: vec![chunk("See policy.")],
            citations: vec![cited, Citation::default()],
        };

        assert_eq!(
            normalize(reply).unwrap(),
            "See policy.\n\n**References:**\n1. Policy section 2\n2. (reference text unavailable)"
        );
    }

    #[test]
    fn test_unrecognized_and_blank_replies_have_no_text() {
        assert_eq!(normalize(AgentReply::Unrecognized), None);
        assert_eq!(
            normalize(AgentReply::Chunked {
                segments: vec![chunk("  ")]
            }),
            None
        );
    }

    #[test]
    fn test_build_request_keeps_last_ten_history_entries() {
        let request = build_request("next", &history(14));
        let messages = &request.session_state.conversation_history.messages;

        assert_eq!(messages.len(), MAX_HISTORY);
        assert_eq!(messages[0].content[0].text, "message 4");
        assert_eq!(messages[9].content[0].text, "message 13");
        assert_eq!(messages[0].role, "user");
        assert_eq!(request.input_text, "next");
    }

    #[test]
    fn test_build_request_short_history_untouched() {
        let request = build_request("hi", &history(3));
        assert_eq!(request.session_state.conversation_history.messages.len(), 3);
    }

    #[test]
    fn test_session_id_sanitized() {
        assert_eq!(session_id_for("user@example.com"), "user-example.com");
        assert_eq!(session_id_for("abc-123_x:y"), "abc-123_x:y");
        assert_eq!(session_id_for(""), "anonymous");
    }

    #[tokio::test]
    async fn test_send_chunked_response() {
        let body = serde_json::json!({
            "chunks": [
                { "bytes": STANDARD.encode(chunk("The answer ")) },
                { "bytes": STANDARD.encode(chunk("is 42.")) }
            ]
        })
        .to_string();
        let client = StubClient::answering(&body);
        let bridge = AgentBridge::new(client.clone(), route());

        let text = bridge
            .send("question", &history(12), "user@example.com", Some(&creds()))
            .await;

        assert_eq!(text, "The answer is 42.");
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].0.session_id, "user-example.com");
        assert_eq!(seen[0].1.session_state.conversation_history.messages.len(), 10);
    }

    #[tokio::test]
    async fn test_send_transport_failure_returns_apology() {
        let bridge = AgentBridge::new(StubClient::failing(), route());
        let reply = bridge.reply("hi", &[], "u1", Some(&creds())).await;

        assert_eq!(reply.text, APOLOGY_MESSAGE);
        assert_eq!(reply.kind, ReplyKind::Unavailable);
    }

    #[tokio::test]
    async fn test_send_empty_response_returns_fallback() {
        let bridge = AgentBridge::new(StubClient::answering("{}"), route());
        let reply = bridge.reply("hi", &[], "u1", Some(&creds())).await;

        assert_eq!(reply.text, FALLBACK_MESSAGE);
        assert_eq!(reply.kind, ReplyKind::Empty);
    }

    #[tokio::test]
    async fn test_missing_configuration_skips_agent() {
        let client = StubClient::answering(r#"{"completion":"unused"}"#);

        let unrouted = AgentBridge::new(client.clone(), AgentRoute::default());
        assert!(!unrouted.is_configured());
        let reply = unrouted.reply("hi", &[], "u1", Some(&creds())).await;
        assert_eq!(reply.kind, ReplyKind::NotConfigured);
        assert_eq!(reply.text, NOT_CONFIGURED_MESSAGE);

        let routed = AgentBridge::new(client.clone(), route());
        let reply = routed.reply("hi", &[], "u1", None).await;
        assert_eq!(reply.kind, ReplyKind::NotConfigured);

        assert!(client.seen.lock().unwrap().is_empty());
    }
}
