//! Query model
//!
//! The current user request plus the ordered prior turns of the session.
//! Immutable for the duration of one run; the engine never writes back.

use serde::{Deserialize, Serialize};

/// Who produced a history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// The current user request plus read-only session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The question being answered in this run
    pub text: String,
    /// Prior turns, oldest first. Supplied by the caller, never mutated.
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(text: impl Into<String>, history: Vec<HistoryTurn>) -> Self {
        Self {
            text: text.into(),
            history,
        }
    }

    /// Render the history as a plain transcript for prompt inclusion
    pub fn history_transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.history {
            out.push_str(turn.speaker.as_str());
            out.push_str(": ");
            out.push_str(&turn.text);
            out.push('\n');
        }
        out
    }
}
