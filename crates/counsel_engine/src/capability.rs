//! Capability trait and registry
//!
//! A capability is one way of obtaining information for a question. The
//! engine never knows which concrete capabilities exist; it works off the
//! registry's catalog and calls through the trait. `FakeCapability` lets
//! tests script outcomes and count calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use counsel_common::capability::{CapabilityCatalog, CapabilitySpec};
use counsel_common::query::Query;

use crate::error::CapabilityError;

/// Why a capability is being consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Normal consultation as part of working through the plan
    Standard,
    /// Forced last-resort synthesis; the result will be the final answer
    FinalSynthesis,
}

/// Everything a capability may look at when consulted.
/// Owned so parallel tasks can carry their own copy.
#[derive(Debug, Clone)]
pub struct CapabilityCall {
    pub query: Query,
    /// Accumulated context rendered as text, empty when none
    pub context_render: String,
    /// Names of capabilities not yet consulted after this one
    pub remaining: Vec<String>,
    pub mode: CallMode,
}

/// What a capability produced
#[derive(Debug, Clone)]
pub struct CapabilityOutput {
    pub content: String,
    /// Structured reference to where the content came from, when one exists
    pub citation: Option<serde_json::Value>,
}

impl CapabilityOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            citation: None,
        }
    }

    pub fn cited(content: impl Into<String>, citation: serde_json::Value) -> Self {
        Self {
            content: content.into(),
            citation: Some(citation),
        }
    }
}

/// A source of information the engine can consult
#[async_trait]
pub trait Capability: Send + Sync {
    fn spec(&self) -> &CapabilitySpec;

    /// Fetch this capability's contribution for the call
    async fn gather(&self, call: &CapabilityCall) -> Result<CapabilityOutput, CapabilityError>;
}

/// Ordered set of registered capabilities
///
/// Registration order is the order capabilities appear in the catalog and
/// therefore in ranking prompts and default plans.
#[derive(Default)]
pub struct CapabilityRegistry {
    ordered: Vec<Arc<dyn Capability>>,
    by_name: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.spec().name.clone();
        if self.by_name.contains_key(&name) {
            bail!("capability '{}' registered twice", name);
        }
        self.by_name.insert(name, self.ordered.len());
        self.ordered.push(capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.ordered[i]))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Catalog view for planning and validation
    pub fn catalog(&self) -> CapabilityCatalog {
        CapabilityCatalog::new(self.ordered.iter().map(|c| c.spec().clone()).collect())
    }
}

/// Scripted capability for tests
///
/// Plays back a fixed sequence of outcomes; after the script runs out the
/// last outcome repeats. An optional delay makes timeout paths testable.
pub struct FakeCapability {
    spec: CapabilitySpec,
    outcomes: Mutex<Vec<Result<CapabilityOutput, String>>>,
    calls: AtomicUsize,
    modes: Mutex<Vec<CallMode>>,
    delay: Option<Duration>,
}

impl FakeCapability {
    pub fn new(spec: CapabilitySpec, outcomes: Vec<Result<CapabilityOutput, String>>) -> Self {
        Self {
            spec,
            outcomes: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
            modes: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A capability that always succeeds with the same content
    pub fn ok(spec: CapabilitySpec, content: &str) -> Self {
        Self::new(spec, vec![Ok(CapabilityOutput::text(content))])
    }

    /// A capability that always fails with the same message
    pub fn failing(spec: CapabilitySpec, error: &str) -> Self {
        Self::new(spec, vec![Err(error.to_string())])
    }

    /// Sleep this long before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Modes seen so far, in call order
    pub fn modes_seen(&self) -> Vec<CallMode> {
        self.modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Capability for FakeCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn gather(&self, call: &CapabilityCall) -> Result<CapabilityOutput, CapabilityError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().push(call.mode);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcomes = self.outcomes.lock().unwrap();
        let outcome = outcomes
            .get(index)
            .or_else(|| outcomes.last())
            .cloned()
            .ok_or_else(|| CapabilityError::Fetch("fake capability has no outcomes".to_string()))?;

        outcome.map_err(CapabilityError::Fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> CapabilityCall {
        CapabilityCall {
            query: Query::new("test question"),
            context_render: String::new(),
            remaining: vec![],
            mode: CallMode::Standard,
        }
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = CapabilityRegistry::new();
        let spec = CapabilitySpec::direct_answer("direct_answer", "Answer directly");
        registry
            .register(Arc::new(FakeCapability::ok(spec.clone(), "x")))
            .unwrap();
        let err = registry
            .register(Arc::new(FakeCapability::ok(spec, "y")))
            .unwrap_err();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn test_registry_catalog_preserves_order() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Arc::new(FakeCapability::ok(
                CapabilitySpec::web_search("web_search", "Search"),
                "x",
            )))
            .unwrap();
        registry
            .register(Arc::new(FakeCapability::ok(
                CapabilitySpec::direct_answer("direct_answer", "Answer"),
                "y",
            )))
            .unwrap();

        let names = registry.catalog().names();
        assert_eq!(names, vec!["web_search", "direct_answer"]);
        assert!(registry.get("web_search").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_fake_capability_replays_then_repeats_last() {
        let spec = CapabilitySpec::web_search("web_search", "Search");
        let fake = FakeCapability::new(
            spec,
            vec![
                Ok(CapabilityOutput::text("first")),
                Err("down".to_string()),
            ],
        );

        assert_eq!(fake.gather(&call()).await.unwrap().content, "first");
        assert!(fake.gather(&call()).await.is_err());
        assert!(fake.gather(&call()).await.is_err());
        assert_eq!(fake.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fake_capability_records_mode() {
        let spec = CapabilitySpec::direct_answer("direct_answer", "Answer");
        let fake = FakeCapability::ok(spec, "x");
        let mut c = call();
        c.mode = CallMode::FinalSynthesis;
        fake.gather(&c).await.unwrap();
        assert_eq!(fake.modes_seen(), vec![CallMode::FinalSynthesis]);
    }
}
