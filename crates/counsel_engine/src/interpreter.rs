//! Decision interpreter
//!
//! Classifies one capability's raw output into a Decision. The oracle's JSON
//! is parsed through a ladder: strict typed parse, then brace extraction,
//! then field-by-field salvage from a loose Value. Anything that still fails
//! becomes TRY_NEXT_TOOL; a parse failure must never be promoted into a
//! final answer. A salvage backstop keeps substantial raw output alive even
//! when the verdict would discard it.

use std::sync::Arc;

use counsel_common::decision::{Decision, ResponseType};
use counsel_common::prompts;
use counsel_common::query::Query;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::oracle::Oracle;

/// Classify one capability attempt. Never fails; degraded paths all land on
/// a TRY_NEXT_TOOL verdict.
pub async fn interpret(
    oracle: &Arc<dyn Oracle>,
    query: &Query,
    capability: &str,
    raw_output: Option<&str>,
    remaining: &[String],
    context_render: &str,
    config: &EngineConfig,
) -> Decision {
    let prompt = prompts::decision_prompt(query, capability, raw_output, remaining, context_render);

    let response = match oracle.generate(&prompt, true).await {
        Ok(text) => text,
        Err(e) => {
            warn!("[-] interpreter oracle failed for '{}': {}", capability, e);
            return Decision::try_next(format!("oracle unavailable: {}", e));
        }
    };

    let mut decision = match parse_decision(&response) {
        Some(d) => d,
        None => {
            warn!("[-] interpreter response unparsable for '{}'", capability);
            Decision::try_next("verdict unparsable")
        }
    };

    // A final answer with nothing in it is a malformed verdict, not an answer
    if decision.response_type == ResponseType::FinalAnswer && decision.content.trim().is_empty() {
        warn!("[-] empty FINAL_ANSWER from interpreter, downgrading");
        decision = Decision::try_next("final answer had no content");
    }

    apply_salvage(decision, raw_output, config)
}

/// Backstop: when the verdict would discard substantial raw output, keep a
/// truncated summary of it as context instead
fn apply_salvage(mut decision: Decision, raw_output: Option<&str>, config: &EngineConfig) -> Decision {
    let Some(raw) = raw_output else {
        return decision;
    };
    if raw.len() < config.salvage_min_chars {
        return decision;
    }

    let discards = match decision.response_type {
        ResponseType::TryNextTool => true,
        ResponseType::TryNextToolAndAddContext => decision
            .context_to_preserve
            .as_deref()
            .map(str::trim)
            .map_or(true, str::is_empty),
        ResponseType::FinalAnswer => false,
    };

    if discards {
        debug!("[+] salvaging {} chars of discarded output", raw.len());
        decision.response_type = ResponseType::TryNextToolAndAddContext;
        decision.context_to_preserve =
            Some(prompts::truncate(raw, config.salvage_summary_chars));
    }
    decision
}

/// Strict parse, then brace extraction, then loose-Value salvage
fn parse_decision(text: &str) -> Option<Decision> {
    if let Ok(d) = serde_json::from_str::<Decision>(text) {
        return Some(d);
    }

    if let Some(inner) = extract_json(text) {
        if let Ok(d) = serde_json::from_str::<Decision>(inner) {
            return Some(d);
        }
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return decision_from_value(&value);
        }
    }

    None
}

/// Pull the outermost {...} span out of surrounding prose
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Rebuild a Decision from a loose JSON object. The verdict string must
/// still be one of the known three; everything else gets a default.
fn decision_from_value(value: &Value) -> Option<Decision> {
    let response_type = ResponseType::parse(value.get("response_type")?.as_str()?)?;

    let content = value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let context_to_preserve = value
        .get("context_to_preserve")
        .and_then(Value::as_str)
        .map(String::from);

    Some(Decision {
        response_type,
        content,
        reasoning,
        context_to_preserve,
    })
}
