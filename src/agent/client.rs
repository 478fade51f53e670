//! Remote agent HTTP client
//!
//! [`AgentClient`] is the seam between the bridge and the managed agent
//! service; [`HttpAgentClient`] is the production implementation.

use crate::agent::error::BridgeError;
use crate::agent::types::{InvokeAgentRequest, InvokeAgentResponse};
use crate::chat::AgentCredentials;
use async_trait::async_trait;
use std::time::Duration;

/// Where a request is routed on the agent service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTarget {
    /// Agent identifier
    pub agent_id: String,
    /// Agent alias identifier
    pub agent_alias_id: String,
    /// Session correlation key
    pub session_id: String,
}

/// A client able to invoke the remote agent
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send one request and return the raw decoded response body
    async fn invoke(
        &self,
        target: &AgentTarget,
        request: &InvokeAgentRequest,
        credentials: &AgentCredentials,
    ) -> Result<InvokeAgentResponse, BridgeError>;
}

/// reqwest-backed agent client
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAgentClient {
    /// Create a client for `endpoint` with the given request timeout
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create a client reusing an existing connection pool
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, target: &AgentTarget) -> String {
        format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.endpoint, target.agent_id, target.agent_alias_id, target.session_id
        )
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(
        &self,
        target: &AgentTarget,
        request: &InvokeAgentRequest,
        credentials: &AgentCredentials,
    ) -> Result<InvokeAgentResponse, BridgeError> {
        let url = self.url_for(target);

        tracing::debug!(
            url = %url,
            region = %credentials.region,
            history_len = request.session_state.conversation_history.messages.len(),
            input_len = request.input_text.len(),
            "Invoking agent"
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.access_key_id, Some(&credentials.secret_access_key))
            .header("x-agent-region", &credentials.region)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(BridgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BridgeError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::{ConversationHistory, SessionState};
    use mockito::{Matcher, Server};

    fn target() -> AgentTarget {
        AgentTarget {
            agent_id: "AGENT1".to_string(),
            agent_alias_id: "ALIAS1".to_string(),
            session_id: "user-42".to_string(),
        }
    }

    fn credentials() -> AgentCredentials {
        AgentCredentials {
            access_key_id: "AKIDTEST".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    fn request(text: &str) -> InvokeAgentRequest {
        InvokeAgentRequest {
            input_text: text.to_string(),
            session_state: SessionState {
                conversation_history: ConversationHistory { messages: vec![] },
            },
        }
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/agents/AGENT1/agentAliases/ALIAS1/sessions/user-42/text")
            .match_header("content-type", "application/json")
            .match_header("x-agent-region", "us-west-2")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "inputText": "hello"
            })))
            .with_status(200)
            .with_body(r#"{"completion":"Hi there"}"#)
            .create_async()
            .await;

        let client = HttpAgentClient::new(server.url(), 5).unwrap();
        let response = client
            .invoke(&target(), &request("hello"), &credentials())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.completion.as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_invoke_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let client = HttpAgentClient::new(server.url(), 5).unwrap();
        let err = client
            .invoke(&target(), &request("hello"), &credentials())
            .await
            .unwrap_err();

        match err {
            BridgeError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "service unavailable");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_invalid_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = HttpAgentClient::new(server.url(), 5).unwrap();
        let err = client
            .invoke(&target(), &request("hello"), &credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_invoke_unreachable_host() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = HttpAgentClient::new("http://127.0.0.1:9", 2).unwrap();
        let err = client
            .invoke(&target(), &request("hello"), &credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Transport(_)));
    }
}
