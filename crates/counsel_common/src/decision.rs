//! Decision and final-result model
//!
//! A Decision is the interpreter's classified verdict on one capability's
//! raw output. A FinalResult is the single terminal output of a run.

use serde::{Deserialize, Serialize};

/// How the interpreter classified a capability's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    /// The content is the final user-facing answer; stop the loop
    FinalAnswer,
    /// Nothing usable; advance to the next group
    TryNextTool,
    /// Advance, but keep the preserved context for later attempts
    TryNextToolAndAddContext,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::FinalAnswer => "FINAL_ANSWER",
            ResponseType::TryNextTool => "TRY_NEXT_TOOL",
            ResponseType::TryNextToolAndAddContext => "TRY_NEXT_TOOL_AND_ADD_CONTEXT",
        }
    }

    /// Parse the oracle's verdict string. Unknown verdicts are a parse
    /// failure, never silently coerced into an answer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "FINAL_ANSWER" => Some(ResponseType::FinalAnswer),
            "TRY_NEXT_TOOL" => Some(ResponseType::TryNextTool),
            "TRY_NEXT_TOOL_AND_ADD_CONTEXT" => Some(ResponseType::TryNextToolAndAddContext),
            _ => None,
        }
    }
}

/// The interpreter's verdict on one sequential capability attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub response_type: ResponseType,
    /// User-facing only when `response_type` is FINAL_ANSWER
    pub content: String,
    /// Diagnostic only, never shown to the user
    pub reasoning: String,
    /// Text to append to the accumulated context, if any
    #[serde(default)]
    pub context_to_preserve: Option<String>,
}

impl Decision {
    /// The recoverable default when oracle output cannot be trusted
    pub fn try_next(reasoning: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::TryNextTool,
            content: String::new(),
            reasoning: reasoning.into(),
            context_to_preserve: None,
        }
    }
}

/// The single terminal output of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    /// Capability name(s) the answer came from; empty for the generic
    /// exhaustion message
    pub sources: Vec<String>,
    pub content: String,
    /// Last citation payload carried through the run, if any capability
    /// produced one
    #[serde(default)]
    pub citation: Option<serde_json::Value>,
}

impl FinalResult {
    pub fn from_capability(
        source: impl Into<String>,
        content: impl Into<String>,
        citation: Option<serde_json::Value>,
    ) -> Self {
        Self {
            sources: vec![source.into()],
            content: content.into(),
            citation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_type_roundtrip() {
        for rt in [
            ResponseType::FinalAnswer,
            ResponseType::TryNextTool,
            ResponseType::TryNextToolAndAddContext,
        ] {
            assert_eq!(ResponseType::parse(rt.as_str()), Some(rt));
        }
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        assert_eq!(ResponseType::parse("APPROVE"), None);
        assert_eq!(ResponseType::parse(""), None);
        assert_eq!(ResponseType::parse("final_answer"), None);
    }

    #[test]
    fn test_try_next_default() {
        let d = Decision::try_next("parse error");
        assert_eq!(d.response_type, ResponseType::TryNextTool);
        assert!(d.content.is_empty());
        assert!(d.context_to_preserve.is_none());
    }
}
