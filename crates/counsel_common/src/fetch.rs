//! Raw-fetch model for parallel groups
//!
//! In a parallel group every member runs in raw-data mode: it returns content
//! or an error, never a verdict. One member's failure is captured as data and
//! never aborts its siblings; the synthesizer sees the whole join result.

use serde::{Deserialize, Serialize};

/// Outcome of one raw-data fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Ok,
    Error,
    Timeout,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Error => "error",
            FetchStatus::Timeout => "timeout",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FetchStatus::Ok)
    }
}

/// One member's contribution to a parallel group's join result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFetch {
    pub capability: String,
    pub status: FetchStatus,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Citation payload, preserved even when the verdict later discards the
    /// content itself
    #[serde(default)]
    pub citation: Option<serde_json::Value>,
    /// RFC 3339 completion timestamp
    pub fetched_at: String,
}

impl RawFetch {
    pub fn ok(
        capability: impl Into<String>,
        content: impl Into<String>,
        citation: Option<serde_json::Value>,
    ) -> Self {
        Self {
            capability: capability.into(),
            status: FetchStatus::Ok,
            content: Some(content.into()),
            error: None,
            citation,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(capability: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            status: FetchStatus::Error,
            content: None,
            error: Some(error.into()),
            citation: None,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn timeout(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            status: FetchStatus::Timeout,
            content: None,
            error: Some("fetch timed out".to_string()),
            citation: None,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ok = RawFetch::ok("web_search", "three results", None);
        assert!(ok.status.is_ok());
        assert_eq!(ok.content.as_deref(), Some("three results"));
        assert!(ok.error.is_none());

        let err = RawFetch::error("source.tax", "connection refused");
        assert_eq!(err.status, FetchStatus::Error);
        assert!(err.content.is_none());
        assert_eq!(err.error.as_deref(), Some("connection refused"));

        let to = RawFetch::timeout("web_search");
        assert_eq!(to.status, FetchStatus::Timeout);
        assert!(!to.status.is_ok());
    }
}
