//! Accumulated context
//!
//! Cross-attempt memory for one run: an append-only, provenance-tagged entry
//! log plus a single last-writer-wins citation slot. Owned exclusively by one
//! run's orchestrator; concurrent queries never share an instance, so no
//! locking is needed. Size is bounded by plan length, so no eviction either.

use serde::{Deserialize, Serialize};

/// One preserved piece of context, tagged with the capability it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub capability: String,
    pub text: String,
    /// RFC 3339 append timestamp
    pub recorded_at: String,
}

/// Append-only context log plus citation slot, scoped to one run
#[derive(Debug, Clone, Default)]
pub struct AccumulatedContext {
    entries: Vec<ContextEntry>,
    citation: Option<serde_json::Value>,
}

impl AccumulatedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Blank text is dropped; entries are never edited or
    /// removed afterwards.
    pub fn append(&mut self, capability: impl Into<String>, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        self.entries.push(ContextEntry {
            capability: capability.into(),
            text,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Overwrite the citation slot (last writer wins)
    pub fn set_citation(&mut self, payload: serde_json::Value) {
        self.citation = Some(payload);
    }

    pub fn current_citation(&self) -> Option<&serde_json::Value> {
        self.citation.as_ref()
    }

    /// Take the citation for the terminal result
    pub fn citation_cloned(&self) -> Option<serde_json::Value> {
        self.citation.clone()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every entry with a provenance header, for prompt inclusion
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("[from ");
            out.push_str(&entry.capability);
            out.push_str("]\n");
            out.push_str(&entry.text);
            out.push_str("\n\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_render() {
        let mut ctx = AccumulatedContext::new();
        ctx.append("source.tax", "Article 12 covers withholding.");
        ctx.append("web_search", "Recent amendment in 2024.");

        assert_eq!(ctx.entry_count(), 2);
        let rendered = ctx.render();
        assert!(rendered.contains("[from source.tax]"));
        assert!(rendered.contains("Article 12 covers withholding."));
        assert!(rendered.contains("[from web_search]"));
    }

    #[test]
    fn test_blank_append_is_noop() {
        let mut ctx = AccumulatedContext::new();
        ctx.append("web_search", "");
        ctx.append("web_search", "   \n ");
        assert!(ctx.is_empty());
        assert!(ctx.render().is_empty());
    }

    #[test]
    fn test_citation_last_writer_wins() {
        let mut ctx = AccumulatedContext::new();
        assert!(ctx.current_citation().is_none());

        ctx.set_citation(serde_json::json!({"article": "art_1"}));
        ctx.set_citation(serde_json::json!({"article": "art_7"}));
        assert_eq!(
            ctx.current_citation().unwrap()["article"],
            serde_json::json!("art_7")
        );
    }

    #[test]
    fn test_entries_grow_monotonically() {
        let mut ctx = AccumulatedContext::new();
        let mut last = 0;
        for i in 0..5 {
            ctx.append("cap", format!("entry {}", i));
            assert!(ctx.entry_count() > last);
            last = ctx.entry_count();
        }
        assert_eq!(ctx.entry_count(), 5);
    }
}
