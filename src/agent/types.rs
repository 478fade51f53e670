//! Agent wire types
//!
//! Structs that mirror the remote agent's JSON request and response format,
//! plus [`AgentReply`], the decoded form of a response.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Request body for a single agent invocation
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvokeAgentRequest {
    /// The new user message
    pub input_text: String,
    /// Prior conversation passed along with the message
    pub session_state: SessionState,
}

/// Session state sent with a request
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Trimmed conversation history
    pub conversation_history: ConversationHistory,
}

/// Conversation history sent with a request
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    /// History entries, oldest first
    pub messages: Vec<HistoryMessage>,
}

/// A single history entry
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Message content blocks (always one text block)
    pub content: Vec<ContentBlock>,
}

/// A text content block
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContentBlock {
    /// Block text
    pub text: String,
}

/// Raw agent response body
///
/// Every field is optional; [`AgentReply::from`] decides which shape arrived.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvokeAgentResponse {
    /// Direct completion text
    #[serde(default)]
    pub completion: Option<String>,
    /// Chunked output
    #[serde(default)]
    pub chunks: Option<Vec<ResponseChunk>>,
    /// Citations not attached to a chunk
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
}

/// One chunk of agent output
#[derive(Deserialize, Debug)]
pub struct ResponseChunk {
    /// Base64-encoded UTF-8 JSON of the form `{"text": ...}`
    pub bytes: String,
    /// Citations attached to this chunk
    #[serde(default)]
    pub attribution: Option<Attribution>,
}

/// Citation data attached to a chunk
#[derive(Deserialize, Debug, Default)]
pub struct Attribution {
    /// Citations for this chunk
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// A source citation
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// References backing the cited passage
    #[serde(default)]
    pub retrieved_references: Vec<RetrievedReference>,
}

/// A reference retrieved from a knowledge source
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RetrievedReference {
    /// Reference content
    #[serde(default)]
    pub content: Option<ReferenceContent>,
}

/// Text content of a reference
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ReferenceContent {
    /// Reference text
    #[serde(default)]
    pub text: Option<String>,
}

impl Citation {
    /// Text of the first retrieved reference, if it has any
    pub fn first_reference_text(&self) -> Option<&str> {
        self.retrieved_references
            .first()
            .and_then(|r| r.content.as_ref())
            .and_then(|c| c.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Decoded chunk payload
#[derive(Deserialize, Debug)]
pub struct ChunkPayload {
    /// Text carried by the chunk
    pub text: String,
}

/// The known shapes of an agent response
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// A non-empty completion string
    Direct {
        /// Completion text
        text: String,
        /// Citations carried alongside the completion
        citations: Vec<Citation>,
    },
    /// Chunked output without citation data
    Chunked {
        /// Decoded chunk bytes, in arrival order
        segments: Vec<Vec<u8>>,
    },
    /// Chunked output with citation data
    ChunkedWithCitations {
        /// Decoded chunk bytes, in arrival order
        segments: Vec<Vec<u8>>,
        /// Citations, chunk-attached ones first
        citations: Vec<Citation>,
    },
    /// Nothing usable was present
    Unrecognized,
}

impl From<InvokeAgentResponse> for AgentReply {
    fn from(response: InvokeAgentResponse) -> Self {
        let mut citations = Vec::new();
        let mut segments = Vec::new();

        for chunk in response.chunks.unwrap_or_default() {
            match STANDARD.decode(chunk.bytes.as_bytes()) {
                Ok(bytes) => segments.push(bytes),
                Err(e) => warn!(error = %e, "Skipping chunk with invalid base64"),
            }
            if let Some(attribution) = chunk.attribution {
                citations.extend(attribution.citations);
            }
        }
        citations.extend(response.citations.unwrap_or_default());

        match response.completion {
            Some(text) if !text.is_empty() => AgentReply::Direct { text, citations },
            _ if segments.is_empty() => AgentReply::Unrecognized,
            _ if citations.is_empty() => AgentReply::Chunked { segments },
            _ => AgentReply::ChunkedWithCitations {
                segments,
                citations,
            },
        }
    }
}
