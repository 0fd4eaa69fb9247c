//! Engine and oracle configuration

use serde::{Deserialize, Serialize};

/// Tunables for the query engine loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-capability wall clock budget in seconds
    pub capability_timeout_secs: u64,
    /// Minimum raw output length before a bare TRY_NEXT_TOOL verdict is
    /// upgraded to preserve a summary of the output
    pub salvage_min_chars: usize,
    /// Length of the summary preserved by a salvage upgrade
    pub salvage_summary_chars: usize,
    /// Minimum accumulated context length for the fallback to attempt a
    /// synthesized answer instead of the generic apology
    pub fallback_min_chars: usize,
    /// Per-source snippet length in synthesis prompts
    pub synthesis_snippet_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capability_timeout_secs: 30,
            salvage_min_chars: 80,
            salvage_summary_chars: 500,
            fallback_min_chars: 40,
            synthesis_snippet_chars: 4000,
        }
    }
}

/// Connection settings for the HTTP inference oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.capability_timeout_secs > 0);
        assert!(cfg.salvage_summary_chars > cfg.salvage_min_chars);

        let oracle = OracleConfig::default();
        assert!(oracle.base_url.starts_with("http"));
    }
}
