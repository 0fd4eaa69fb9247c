//! Parallel synthesizer
//!
//! Merges a parallel group's raw fetches into one answer. Failed fetches are
//! presented to the oracle with their error labels so the merged answer can
//! acknowledge gaps instead of inventing data. Unlike the interpreter this
//! stage is fallible: a group that cannot be merged simply advances the loop.

use std::sync::Arc;

use counsel_common::fetch::RawFetch;
use counsel_common::prompts;
use counsel_common::query::Query;
use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{OracleError, SynthesisError};
use crate::oracle::Oracle;

/// Merge one parallel group's fetches into a single answer
pub async fn synthesize(
    oracle: &Arc<dyn Oracle>,
    query: &Query,
    fetches: &[RawFetch],
    context_render: &str,
    config: &EngineConfig,
) -> Result<String, SynthesisError> {
    let prompt = prompts::synthesis_prompt(query, fetches, context_render, config.synthesis_snippet_chars);

    let response = oracle.generate(&prompt, true).await?;
    let answer = parse_answer(&response)?;

    if answer.trim().is_empty() {
        return Err(SynthesisError::EmptyAnswer);
    }

    debug!("[+] synthesized {} fetches into {} chars", fetches.len(), answer.len());
    Ok(answer.trim().to_string())
}

/// The response must carry an object with an "answer" string; anything else
/// is rejected rather than passed through as an answer
fn parse_answer(text: &str) -> Result<String, SynthesisError> {
    let candidate = if serde_json::from_str::<Value>(text).is_ok() {
        text
    } else {
        extract_json(text).ok_or_else(|| {
            SynthesisError::Oracle(OracleError::Malformed("no JSON in synthesis response".to_string()))
        })?
    };

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| SynthesisError::Oracle(OracleError::Malformed(e.to_string())))?;

    value
        .get("answer")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            SynthesisError::Oracle(OracleError::Malformed(
                "synthesis response missing 'answer' field".to_string(),
            ))
        })
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FakeOracle;

    fn fetches() -> Vec<RawFetch> {
        vec![
            RawFetch::ok("source.tax", "Article 7 sets the rate.", None),
            RawFetch::error("source.labor", "timed out"),
        ]
    }

    async fn run(response: &str) -> Result<String, SynthesisError> {
        let oracle: Arc<dyn Oracle> = Arc::new(FakeOracle::new(vec![response]));
        synthesize(&oracle, &Query::new("q"), &fetches(), "", &EngineConfig::default()).await
    }

    #[tokio::test]
    async fn test_merges_clean_response() {
        let answer = run(r#"{"answer": "Article 7 applies; labor data unavailable."}"#)
            .await
            .unwrap();
        assert_eq!(answer, "Article 7 applies; labor data unavailable.");
    }

    #[tokio::test]
    async fn test_accepts_prose_wrapped_json() {
        let answer = run("Sure:\n{\"answer\": \"Merged.\"}").await.unwrap();
        assert_eq!(answer, "Merged.");
    }

    #[tokio::test]
    async fn test_rejects_missing_answer_field() {
        let err = run(r#"{"summary": "wrong shape"}"#).await.unwrap_err();
        assert!(err.to_string().contains("missing 'answer'"));
    }

    #[tokio::test]
    async fn test_rejects_empty_answer() {
        let err = run(r#"{"answer": "   "}"#).await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyAnswer));
    }

    #[tokio::test]
    async fn test_rejects_non_json() {
        assert!(run("I could not merge these.").await.is_err());
    }

    #[tokio::test]
    async fn test_oracle_error_propagates() {
        let oracle: Arc<dyn Oracle> = Arc::new(FakeOracle::new(vec![]));
        let err = synthesize(&oracle, &Query::new("q"), &fetches(), "", &EngineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Oracle(_)));
    }

    #[tokio::test]
    async fn test_prompt_labels_failed_fetch() {
        let oracle = Arc::new(FakeOracle::new(vec![r#"{"answer": "ok"}"#]));
        let dynamic: Arc<dyn Oracle> = oracle.clone();
        synthesize(&dynamic, &Query::new("q"), &fetches(), "", &EngineConfig::default())
            .await
            .unwrap();
        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("source.labor (FAILED: timed out)"));
        assert!(prompt.contains("Article 7 sets the rate."));
    }
}
