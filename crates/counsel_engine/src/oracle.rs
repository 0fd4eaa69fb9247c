//! Inference oracle
//!
//! The single seam through which the engine talks to a language model.
//! `HttpOracle` speaks the Ollama chat API; `FakeOracle` replays scripted
//! responses for tests and records every prompt it was given.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use counsel_common::protocol::{ChatMessage, ChatRequest, ChatResponse};
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::error::OracleError;

/// A model the engine can ask for text or structured JSON
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one prompt and return the raw completion text.
    /// `structured` requests JSON-constrained output when the backend
    /// supports it; callers still parse defensively.
    async fn generate(&self, prompt: &str, structured: bool) -> Result<String, OracleError>;
}

/// Oracle backed by an Ollama-compatible HTTP endpoint
pub struct HttpOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn generate(&self, prompt: &str, structured: bool) -> Result<String, OracleError> {
        let url = format!("{}/api/chat", self.config.base_url);

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            format: structured.then(|| "json".to_string()),
        };

        debug!("[>] oracle prompt ({} chars)", prompt.len());

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("[-] oracle error {}: {}", status, body);
            return Err(OracleError::Status { status, body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        debug!("[<] oracle response ({} chars)", chat.message.content.len());

        Ok(chat.message.content)
    }
}

/// Scripted oracle for tests
///
/// Responses are consumed in FIFO order; running out of script is an error
/// so a test that makes more calls than it scripted fails loudly.
pub struct FakeOracle {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeOracle {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All prompts seen so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn generate(&self, prompt: &str, _structured: bool) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OracleError::Malformed("fake oracle script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_oracle_replays_in_order() {
        let oracle = FakeOracle::new(vec!["first", "second"]);
        assert_eq!(oracle.generate("a", false).await.unwrap(), "first");
        assert_eq!(oracle.generate("b", true).await.unwrap(), "second");
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(oracle.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_fake_oracle_exhaustion_is_an_error() {
        let oracle = FakeOracle::new(vec![]);
        let err = oracle.generate("a", false).await.unwrap_err();
        assert!(err.to_string().contains("exhausted"));
    }
}
