//! Fallback finalizer
//!
//! The hard termination guarantee: once the plan is exhausted, something is
//! still returned. With enough accumulated context the direct-answer
//! capability is forced into a final synthesis; otherwise, or when even that
//! fails, a generic no-answer message goes out. Either way the run's last
//! citation survives into the result.

use counsel_common::context::AccumulatedContext;
use counsel_common::decision::FinalResult;
use counsel_common::query::Query;
use tracing::{info, warn};

use crate::capability::{CallMode, CapabilityCall, CapabilityRegistry};
use crate::config::EngineConfig;

pub const NO_ANSWER_MESSAGE: &str =
    "I could not find a specific answer to your question in the available sources. \
     Please try rephrasing it or asking about a more specific situation.";

/// Produce the terminal result for an exhausted plan. Never fails.
pub async fn finalize(
    registry: &CapabilityRegistry,
    query: &Query,
    context: &AccumulatedContext,
    config: &EngineConfig,
) -> FinalResult {
    let rendered = context.render();

    if rendered.len() >= config.fallback_min_chars {
        if let Some(name) = registry.catalog().direct_answer_name().map(str::to_string) {
            if let Some(capability) = registry.get(&name) {
                info!("[+] fallback: forcing final synthesis over {} chars", rendered.len());
                let call = CapabilityCall {
                    query: query.clone(),
                    context_render: rendered,
                    remaining: vec![],
                    mode: CallMode::FinalSynthesis,
                };
                match capability.gather(&call).await {
                    Ok(output) if !output.content.trim().is_empty() => {
                        let citation = output.citation.or_else(|| context.citation_cloned());
                        return FinalResult::from_capability(name, output.content, citation);
                    }
                    Ok(_) => warn!("[-] fallback synthesis returned empty content"),
                    Err(e) => warn!("[-] fallback synthesis failed: {}", e),
                }
            }
        }
    }

    info!("[+] fallback: generic no-answer message");
    FinalResult {
        sources: vec![],
        content: NO_ANSWER_MESSAGE.to_string(),
        citation: context.citation_cloned(),
    }
}
