//! Curated legal source store
//!
//! Loads one legal database (chapters of articles) from JSON and serves
//! keyword lookups. Each loaded database is exposed to the engine as its own
//! source-query capability, so the planner can rank databases independently.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use counsel_common::capability::CapabilitySpec;
use counsel_common::prompts;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::capability::{Capability, CapabilityCall, CapabilityOutput};
use crate::error::CapabilityError;

/// One article of a legal database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceArticle {
    pub id: String,
    #[serde(rename = "fullText")]
    pub full_text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChapter {
    #[serde(default)]
    pub title: String,
    pub articles: Vec<SourceArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceFile {
    chapters: Vec<SourceChapter>,
}

/// Extract lookup terms from free text: lowercased words longer than 4
/// chars, deduplicated so a repeated word cannot inflate a match score
pub fn extract_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.len() > 4 {
            let term = word.to_lowercase();
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

/// In-memory legal database with keyword lookup
#[derive(Debug)]
pub struct SourceStore {
    source_id: String,
    articles: Vec<SourceArticle>,
}

impl SourceStore {
    pub fn load(path: &Path, source_id: impl Into<String>) -> Result<Self> {
        let source_id = source_id.into();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source database {}", path.display()))?;
        let file: SourceFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse source database {}", path.display()))?;

        let articles: Vec<SourceArticle> = file
            .chapters
            .into_iter()
            .flat_map(|c| c.articles)
            .collect();

        info!("[+] loaded source '{}': {} articles", source_id, articles.len());
        Ok(Self { source_id, articles })
    }

    pub fn from_articles(source_id: impl Into<String>, articles: Vec<SourceArticle>) -> Self {
        Self {
            source_id: source_id.into(),
            articles,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Articles whose keywords or tags overlap the question's terms,
    /// best match first
    pub fn search(&self, question: &str, limit: usize) -> Vec<&SourceArticle> {
        let terms = extract_terms(question);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &SourceArticle)> = self
            .articles
            .iter()
            .filter_map(|article| {
                let score = terms
                    .iter()
                    .filter(|t| {
                        article.keywords.iter().any(|k| k == *t)
                            || article.tags.iter().any(|g| g.eq_ignore_ascii_case(t))
                    })
                    .count();
                (score > 0).then_some((score, article))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, a)| a).collect()
    }
}

/// Capability backed by one source store
pub struct SourceQueryCapability {
    spec: CapabilitySpec,
    store: Arc<SourceStore>,
    max_hits: usize,
    excerpt_chars: usize,
}

impl SourceQueryCapability {
    pub fn new(store: Arc<SourceStore>, description: impl Into<String>) -> Self {
        let name = format!("source.{}", store.source_id());
        Self {
            spec: CapabilitySpec::source_query(name, description, store.source_id()),
            store,
            max_hits: 3,
            excerpt_chars: 2000,
        }
    }
}

#[async_trait]
impl Capability for SourceQueryCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn gather(&self, call: &CapabilityCall) -> Result<CapabilityOutput, CapabilityError> {
        let hits = self.store.search(&call.query.text, self.max_hits);
        if hits.is_empty() {
            return Err(CapabilityError::Fetch(format!(
                "no matching articles in source '{}'",
                self.store.source_id()
            )));
        }

        let mut content = String::new();
        let mut ids = Vec::new();
        for article in &hits {
            content.push_str(&format!(
                "Article {}:\n{}\n\n",
                article.id,
                prompts::truncate(&article.full_text, self.excerpt_chars)
            ));
            ids.push(article.id.clone());
        }

        Ok(CapabilityOutput::cited(
            content,
            json!({ "source": self.store.source_id(), "articles": ids }),
        ))
    }
}
