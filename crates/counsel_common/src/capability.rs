//! Capability catalog
//!
//! Every way the engine can produce information is a registered capability
//! with a fixed kind. The ranking oracle only ever sees this catalog; any
//! name it emits that is not in here gets rejected.

use serde::{Deserialize, Serialize};

/// Closed set of capability variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Answer from the oracle's own knowledge, no external lookup
    DirectAnswer,
    /// Query an external web search endpoint
    WebSearch,
    /// Query one structured source (a loaded legal database)
    SourceQuery { source_id: String },
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::DirectAnswer => "direct_answer",
            CapabilityKind::WebSearch => "web_search",
            CapabilityKind::SourceQuery { .. } => "source_query",
        }
    }
}

/// Capability definition in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Unique capability name (e.g., "web_search", "source.family_law")
    pub name: String,
    /// Human-readable description, shown to the ranking oracle
    pub description: String,
    /// Fixed variant
    pub kind: CapabilityKind,
}

impl CapabilitySpec {
    pub fn direct_answer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CapabilityKind::DirectAnswer,
        }
    }

    pub fn web_search(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CapabilityKind::WebSearch,
        }
    }

    pub fn source_query(
        name: impl Into<String>,
        description: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CapabilityKind::SourceQuery {
                source_id: source_id.into(),
            },
        }
    }
}

/// Ordered, name-unique capability catalog
///
/// Construction order is preserved; it is the order capabilities are listed
/// in prompts and the order trailing plan groups are appended in.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    specs: Vec<CapabilitySpec>,
}

impl CapabilityCatalog {
    /// Build a catalog, keeping the first spec for any duplicated name
    pub fn new(specs: Vec<CapabilitySpec>) -> Self {
        let mut unique: Vec<CapabilitySpec> = Vec::with_capacity(specs.len());
        for spec in specs {
            if !unique.iter().any(|s| s.name == spec.name) {
                unique.push(spec);
            }
        }
        Self { specs: unique }
    }

    pub fn get(&self, name: &str) -> Option<&CapabilitySpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    pub fn specs(&self) -> &[CapabilitySpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// First registered direct-answer capability, if any
    pub fn direct_answer_name(&self) -> Option<&str> {
        self.specs
            .iter()
            .find(|s| s.kind == CapabilityKind::DirectAnswer)
            .map(|s| s.name.as_str())
    }

    /// First registered web-search capability, if any
    pub fn web_search_name(&self) -> Option<&str> {
        self.specs
            .iter()
            .find(|s| s.kind == CapabilityKind::WebSearch)
            .map(|s| s.name.as_str())
    }

    /// All source-query capability names, in catalog order
    pub fn source_query_names(&self) -> Vec<String> {
        self.specs
            .iter()
            .filter(|s| matches!(s.kind, CapabilityKind::SourceQuery { .. }))
            .map(|s| s.name.clone())
            .collect()
    }
}
