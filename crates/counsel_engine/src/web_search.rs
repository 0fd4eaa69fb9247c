//! Web-search capability
//!
//! Queries a SearxNG-compatible JSON endpoint and condenses the top results
//! into text the interpreter can judge. Result objects are parsed tolerantly;
//! a result missing its title or snippet is kept with what it has, a result
//! missing its URL is dropped.

use std::time::Duration;

use async_trait::async_trait;
use counsel_common::capability::CapabilitySpec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::capability::{Capability, CapabilityCall, CapabilityOutput};
use crate::error::CapabilityError;

pub const WEB_SEARCH_NAME: &str = "web_search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    pub endpoint: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8888/search".to_string(),
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

pub struct WebSearchCapability {
    spec: CapabilitySpec,
    client: reqwest::Client,
    config: WebSearchConfig,
}

impl WebSearchCapability {
    pub fn new(config: WebSearchConfig) -> Self {
        Self {
            spec: CapabilitySpec::web_search(
                WEB_SEARCH_NAME,
                "Search the public web for current information",
            ),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    /// Flatten one raw results array into (rendered text, cited urls)
    fn render_results(&self, results: &[Value]) -> (String, Vec<String>) {
        let mut text = String::new();
        let mut urls = Vec::new();

        for result in results.iter().take(self.config.max_results) {
            let url = match result.get("url").and_then(Value::as_str) {
                Some(u) if !u.is_empty() => u,
                _ => continue,
            };
            let title = result
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(untitled)");
            let snippet = result
                .get("content")
                .or_else(|| result.get("snippet"))
                .and_then(Value::as_str)
                .unwrap_or("");

            text.push_str(&format!("- {}: {} ({})\n", title, snippet, url));
            urls.push(url.to_string());
        }

        (text, urls)
    }
}

#[async_trait]
impl Capability for WebSearchCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn gather(&self, call: &CapabilityCall) -> Result<CapabilityOutput, CapabilityError> {
        debug!("[>] web search: {}", call.query.text);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("q", call.query.text.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| CapabilityError::Fetch(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Fetch(format!(
                "search endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CapabilityError::Fetch(format!("search response not JSON: {}", e)))?;

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let (text, urls) = self.render_results(results);
        if urls.is_empty() {
            return Err(CapabilityError::Fetch("search returned no results".to_string()));
        }

        debug!("[<] web search: {} results kept", urls.len());
        Ok(CapabilityOutput::cited(text, json!({ "urls": urls })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_results_drops_urlless_entries() {
        let cap = WebSearchCapability::new(WebSearchConfig::default());
        let results = vec![
            json!({"title": "Tenancy law", "content": "Notice rules.", "url": "https://a.example"}),
            json!({"title": "No link here", "content": "orphan"}),
            json!({"url": "https://b.example", "snippet": "alt snippet field"}),
        ];

        let (text, urls) = cap.render_results(&results);
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
        assert!(text.contains("Tenancy law: Notice rules."));
        assert!(text.contains("(untitled): alt snippet field"));
        assert!(!text.contains("orphan"));
    }

    #[test]
    fn test_render_results_caps_at_max() {
        let cap = WebSearchCapability::new(WebSearchConfig {
            max_results: 2,
            ..Default::default()
        });
        let results: Vec<Value> = (0..5)
            .map(|i| json!({"title": format!("r{}", i), "url": format!("https://e{}.example", i)}))
            .collect();

        let (_, urls) = cap.render_results(&results);
        assert_eq!(urls.len(), 2);
    }
}
