//! Oracle wire protocol
//!
//! Request/response DTOs for the Ollama-style chat endpoint the HTTP oracle
//! talks to. The engine depends on the oracle only through
//! `generate(prompt, structured) -> text`; these types are the one place the
//! provider's wire shape appears.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    /// "json" requests structured output from the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}
