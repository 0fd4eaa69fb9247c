//! Ranking stage
//!
//! Asks the oracle to order the catalog into priority groups and repairs
//! whatever comes back into a valid execution plan. Ranking can degrade but
//! never fail: oracle errors and unparsable output both land on a fixed
//! default plan.

use std::sync::Arc;

use counsel_common::capability::CapabilityCatalog;
use counsel_common::plan::{ExecutionPlan, ToolGroup};
use counsel_common::prompts;
use counsel_common::query::Query;
use regex::Regex;
use tracing::{debug, warn};

use crate::oracle::Oracle;

/// Produce an execution plan for the query. Never fails.
pub async fn rank(oracle: &Arc<dyn Oracle>, query: &Query, catalog: &CapabilityCatalog) -> ExecutionPlan {
    let prompt = prompts::ranking_prompt(query, catalog);

    let response = match oracle.generate(&prompt, false).await {
        Ok(text) => text,
        Err(e) => {
            warn!("[-] ranking oracle failed, using default plan: {}", e);
            return default_plan(catalog);
        }
    };

    let plan = parse_ranking(&response, catalog);
    if plan.groups.is_empty() {
        warn!("[-] ranking response unparsable, using default plan");
        return default_plan(catalog);
    }

    debug!(
        "[+] ranked plan: {} groups, immediate answer: {}",
        plan.groups.len(),
        plan.immediate_answer.is_some()
    );
    plan
}

/// Fixed plan used when ranking degrades:
/// web search, then all source databases together, then direct answer
pub fn default_plan(catalog: &CapabilityCatalog) -> ExecutionPlan {
    let mut groups = Vec::new();

    if let Some(web) = catalog.web_search_name() {
        groups.push(ToolGroup::singleton(web));
    }
    let sources = catalog.source_query_names();
    if !sources.is_empty() {
        groups.push(ToolGroup::new(sources));
    }
    if let Some(direct) = catalog.direct_answer_name() {
        groups.push(ToolGroup::singleton(direct));
    }

    ExecutionPlan {
        groups,
        immediate_answer: None,
    }
}

/// Parse the oracle's ranking text into a plan, repairing as needed
fn parse_ranking(response: &str, catalog: &CapabilityCatalog) -> ExecutionPlan {
    // "1.", "[2]", "3)" followed by comma-separated names
    let marker = Regex::new(r"^\s*(?:\[(\d+)\]|(\d+)[.)])\s*(.+)$").unwrap();

    let mut groups: Vec<ToolGroup> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut ready_answer: Option<String> = None;

    for line in response.lines() {
        if let Some(rest) = line.trim().strip_prefix("ANSWER:") {
            let text = rest.trim();
            if !text.is_empty() && ready_answer.is_none() {
                ready_answer = Some(text.to_string());
            }
            continue;
        }

        let Some(caps) = marker.captures(line) else {
            continue;
        };
        let Some(body) = caps.get(3) else { continue };

        let members: Vec<String> = body
            .as_str()
            .split(',')
            .map(|t| t.trim().trim_matches(|c| c == '`' || c == '"').to_string())
            .filter(|name| {
                if !catalog.is_valid(name) {
                    if !name.is_empty() {
                        debug!("[-] ranking named unknown capability '{}', discarded", name);
                    }
                    return false;
                }
                // first occurrence wins across the whole plan
                if seen.contains(name) {
                    return false;
                }
                seen.push(name.clone());
                true
            })
            .collect();

        if !members.is_empty() {
            groups.push(ToolGroup::new(members));
        }
    }

    if groups.is_empty() {
        return ExecutionPlan::default();
    }

    // Complete coverage: unranked capabilities become trailing singletons,
    // direct answer always last among them
    let direct = catalog.direct_answer_name().map(str::to_string);
    let mut missing: Vec<String> = catalog
        .names()
        .into_iter()
        .filter(|n| !seen.contains(n))
        .collect();
    if let Some(ref d) = direct {
        if let Some(pos) = missing.iter().position(|n| n == d) {
            let d = missing.remove(pos);
            missing.push(d);
        }
    }
    for name in missing {
        groups.push(ToolGroup::singleton(name));
    }

    // A ready answer only helps when the plan starts with the direct-answer
    // capability alone; otherwise it would preempt better sources
    let first_is_direct = match (&direct, groups.first()) {
        (Some(d), Some(first)) => first.members.len() == 1 && first.members[0] == *d,
        _ => false,
    };

    ExecutionPlan {
        groups,
        immediate_answer: ready_answer.filter(|_| first_is_direct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FakeOracle;
    use counsel_common::capability::CapabilitySpec;

    fn catalog() -> CapabilityCatalog {
        CapabilityCatalog::new(vec![
            CapabilitySpec::web_search("web_search", "Search the web"),
            CapabilitySpec::source_query("source.tax", "Tax law", "tax"),
            CapabilitySpec::source_query("source.labor", "Labor law", "labor"),
            CapabilitySpec::direct_answer("direct_answer", "Answer directly"),
        ])
    }

    fn group_names(plan: &ExecutionPlan) -> Vec<Vec<String>> {
        plan.groups.iter().map(|g| g.members.clone()).collect()
    }

    #[test]
    fn test_parse_bracket_and_dot_markers() {
        let plan = parse_ranking(
            "[1] source.tax, source.labor\n2. web_search\n3) direct_answer",
            &catalog(),
        );
        assert_eq!(
            group_names(&plan),
            vec![
                vec!["source.tax".to_string(), "source.labor".to_string()],
                vec!["web_search".to_string()],
                vec!["direct_answer".to_string()],
            ]
        );
        assert!(plan.validate(&catalog()).is_empty());
    }

    #[test]
    fn test_unknown_names_discarded_duplicates_dropped() {
        let plan = parse_ranking(
            "1. web_search, hallucinated_tool\n2. web_search, source.tax",
            &catalog(),
        );
        assert_eq!(plan.groups[0].members, vec!["web_search"]);
        assert_eq!(plan.groups[1].members, vec!["source.tax"]);
        assert!(plan.validate(&catalog()).is_empty());
    }

    #[test]
    fn test_missing_capabilities_appended_direct_answer_last() {
        let plan = parse_ranking("1. direct_answer\n2. source.labor", &catalog());
        // direct_answer and source.labor ranked; web_search and source.tax
        // were not, and direct_answer was already placed so only the two
        // missing ones trail, in catalog order
        assert_eq!(
            group_names(&plan),
            vec![
                vec!["direct_answer".to_string()],
                vec!["source.labor".to_string()],
                vec!["web_search".to_string()],
                vec!["source.tax".to_string()],
            ]
        );

        let plan = parse_ranking("1. web_search", &catalog());
        let flat = group_names(&plan);
        assert_eq!(flat.last().unwrap(), &vec!["direct_answer".to_string()]);
        assert!(plan.validate(&catalog()).is_empty());
    }

    #[test]
    fn test_unparsable_gives_empty_plan() {
        assert!(parse_ranking("I think you should search the web.", &catalog())
            .groups
            .is_empty());
    }

    #[test]
    fn test_answer_kept_only_when_direct_answer_leads_alone() {
        let plan = parse_ranking(
            "1. direct_answer\nANSWER: Yes, notice is required.",
            &catalog(),
        );
        assert_eq!(plan.immediate_answer.as_deref(), Some("Yes, notice is required."));

        let plan = parse_ranking("1. web_search\nANSWER: Yes.", &catalog());
        assert!(plan.immediate_answer.is_none());

        let plan = parse_ranking(
            "1. direct_answer, web_search\nANSWER: Yes.",
            &catalog(),
        );
        assert!(plan.immediate_answer.is_none());
    }

    #[test]
    fn test_default_plan_shape() {
        let plan = default_plan(&catalog());
        assert_eq!(
            group_names(&plan),
            vec![
                vec!["web_search".to_string()],
                vec!["source.tax".to_string(), "source.labor".to_string()],
                vec!["direct_answer".to_string()],
            ]
        );
        assert!(plan.validate(&catalog()).is_empty());

        // absent kinds are skipped
        let tiny = CapabilityCatalog::new(vec![CapabilitySpec::direct_answer(
            "direct_answer",
            "Answer",
        )]);
        assert_eq!(default_plan(&tiny).groups.len(), 1);
    }

    #[tokio::test]
    async fn test_rank_falls_back_on_oracle_error() {
        let oracle: Arc<dyn Oracle> = Arc::new(FakeOracle::new(vec![]));
        let plan = rank(&oracle, &Query::new("q"), &catalog()).await;
        assert_eq!(plan.groups.len(), 3);
        assert!(plan.immediate_answer.is_none());
    }

    #[tokio::test]
    async fn test_rank_falls_back_on_unparsable_output() {
        let oracle: Arc<dyn Oracle> = Arc::new(FakeOracle::new(vec!["no structure here"]));
        let plan = rank(&oracle, &Query::new("q"), &catalog()).await;
        assert_eq!(group_names(&plan)[0], vec!["web_search".to_string()]);
    }
}
