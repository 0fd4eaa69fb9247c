//! Prompt builders for the inference oracle
//!
//! One builder per oracle role: ranking, decision, synthesis, direct answer,
//! final synthesis. Exact wording is an interface detail the engine does not
//! depend on; only the response contracts described in each prompt are load
//! bearing, and those are parsed defensively on the other side.

use crate::capability::CapabilityCatalog;
use crate::fetch::RawFetch;
use crate::query::Query;

/// Truncate text for prompt inclusion, marking the cut
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    }
}

/// Prompt asking the oracle to rank all capabilities into priority groups
pub fn ranking_prompt(query: &Query, catalog: &CapabilityCatalog) -> String {
    let mut tools = String::new();
    for spec in catalog.specs() {
        tools.push_str(&format!("- {}: {}\n", spec.name, spec.description));
    }

    format!(
        r#"You plan how to answer a user's question using the tools below.

AVAILABLE TOOLS (use ONLY these exact names):
{tools}
CONVERSATION SO FAR:
{history}
USER QUESTION:
{question}

Rank the tools into priority groups, best first. One group per line, in the
form "[1] tool_a, tool_b" or "1. tool_a". Tools in the same group are
consulted together. Every tool must appear in exactly one group.

If the best first step is answering directly from your own knowledge, put
that tool alone in group 1 and add one line "ANSWER: <your answer>"."#,
        tools = tools,
        history = query.history_transcript(),
        question = query.text,
    )
}

/// Prompt asking the oracle to classify one capability's raw output
pub fn decision_prompt(
    query: &Query,
    capability: &str,
    raw_output: Option<&str>,
    remaining: &[String],
    context_render: &str,
) -> String {
    let output_block = match raw_output {
        Some(text) => text.to_string(),
        None => "(the tool produced no data - its data fetch failed)".to_string(),
    };

    format!(
        r#"A tool was consulted to help answer a user's question. Decide what to do
with its output.

USER QUESTION:
{question}

TOOL CONSULTED: {capability}

TOOL OUTPUT:
{output}

TOOLS NOT YET TRIED: {remaining}

CONTEXT FROM EARLIER TOOLS:
{context}

Respond with ONLY valid JSON:
{{
  "response_type": "FINAL_ANSWER" | "TRY_NEXT_TOOL" | "TRY_NEXT_TOOL_AND_ADD_CONTEXT",
  "content": "<the answer text when FINAL_ANSWER, else empty>",
  "reasoning": "<one sentence, diagnostic only>",
  "context_to_preserve": "<text worth keeping for later tools, or null>"
}}

FINAL_ANSWER only when the output fully answers the question.
TRY_NEXT_TOOL_AND_ADD_CONTEXT when the output is partial but useful.
TRY_NEXT_TOOL when the output does not help at all."#,
        question = query.text,
        capability = capability,
        output = output_block,
        remaining = remaining.join(", "),
        context = context_render,
    )
}

/// Prompt asking the oracle to merge a parallel group's raw fetches
pub fn synthesis_prompt(
    query: &Query,
    fetches: &[RawFetch],
    context_render: &str,
    snippet_max: usize,
) -> String {
    let mut sources = String::new();
    for fetch in fetches {
        match &fetch.content {
            Some(content) => {
                sources.push_str(&format!(
                    "### {} (ok)\n{}\n\n",
                    fetch.capability,
                    truncate(content, snippet_max)
                ));
            }
            None => {
                sources.push_str(&format!(
                    "### {} (FAILED: {})\n\n",
                    fetch.capability,
                    fetch.error.as_deref().unwrap_or("no data")
                ));
            }
        }
    }

    format!(
        r#"Several tools were consulted in parallel for a user's question. Merge their
results into one answer. Failed tools are marked; do not invent data for them.

USER QUESTION:
{question}

CONVERSATION SO FAR:
{history}

TOOL RESULTS:
{sources}
CONTEXT FROM EARLIER TOOLS:
{context}

Respond with ONLY valid JSON:
{{"answer": "<the merged answer>"}}"#,
        question = query.text,
        history = query.history_transcript(),
        sources = sources,
        context = context_render,
    )
}

/// Prompt for the direct-answer capability in standard mode
pub fn direct_answer_prompt(query: &Query, context_render: &str) -> String {
    format!(
        r#"Answer the user's question from your own knowledge. Context gathered from
other sources during this conversation is included; use it when relevant.

CONVERSATION SO FAR:
{history}

CONTEXT FROM OTHER SOURCES:
{context}

USER QUESTION:
{question}"#,
        history = query.history_transcript(),
        context = context_render,
        question = query.text,
    )
}

/// Prompt for the forced final synthesis when the plan is exhausted
pub fn final_synthesis_prompt(query: &Query, context_render: &str) -> String {
    format!(
        r#"Every information source has been consulted without producing a complete
answer. Summarize everything gathered below into the best possible answer to
the user's question. Be explicit about what remains uncertain.

USER QUESTION:
{question}

EVERYTHING GATHERED:
{context}"#,
        question = query.text,
        context = context_render,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySpec;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        let long = "a".repeat(200);
        let cut = truncate(&long, 50);
        assert!(cut.ends_with("... [truncated]"));
        assert!(cut.len() < 200);
    }

    #[test]
    fn test_ranking_prompt_lists_tools() {
        let catalog = CapabilityCatalog::new(vec![
            CapabilitySpec::web_search("web_search", "Search the web"),
            CapabilitySpec::direct_answer("direct_answer", "Answer directly"),
        ]);
        let prompt = ranking_prompt(&Query::new("what is the statute of limitations?"), &catalog);
        assert!(prompt.contains("- web_search: Search the web"));
        assert!(prompt.contains("- direct_answer: Answer directly"));
        assert!(prompt.contains("statute of limitations"));
    }

    #[test]
    fn test_decision_prompt_failure_note() {
        let prompt = decision_prompt(
            &Query::new("q"),
            "web_search",
            None,
            &["direct_answer".to_string()],
            "",
        );
        assert!(prompt.contains("data fetch failed"));
        assert!(prompt.contains("TOOLS NOT YET TRIED: direct_answer"));
    }

    #[test]
    fn test_synthesis_prompt_labels_failures() {
        let fetches = vec![
            RawFetch::ok("source.tax", "Article 3 applies.", None),
            RawFetch::error("source.labor", "timeout"),
        ];
        let prompt = synthesis_prompt(&Query::new("q"), &fetches, "", 4000);
        assert!(prompt.contains("### source.tax (ok)"));
        assert!(prompt.contains("Article 3 applies."));
        assert!(prompt.contains("### source.labor (FAILED: timeout)"));
    }
}
