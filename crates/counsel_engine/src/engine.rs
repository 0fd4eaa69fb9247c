//! Query engine orchestrator
//!
//! One `answer` call is one run: rank the catalog, walk the groups strictly
//! in order, stop at the first final answer, and fall back when the plan is
//! exhausted. Singleton groups go through the decision interpreter; larger
//! groups fan out concurrently and go through the synthesizer. The public
//! contract is infallible: there is always exactly one FinalResult.

use std::sync::Arc;
use std::time::Duration;

use counsel_common::context::AccumulatedContext;
use counsel_common::decision::{FinalResult, ResponseType};
use counsel_common::fetch::RawFetch;
use counsel_common::plan::{ExecutionPlan, ToolGroup};
use counsel_common::query::Query;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{CallMode, CapabilityCall, CapabilityRegistry};
use crate::config::EngineConfig;
use crate::error::CapabilityError;
use crate::oracle::Oracle;
use crate::{fallback, interpreter, ranking, synthesizer};

pub struct QueryEngine {
    oracle: Arc<dyn Oracle>,
    registry: CapabilityRegistry,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(oracle: Arc<dyn Oracle>, registry: CapabilityRegistry, config: EngineConfig) -> Self {
        Self {
            oracle,
            registry,
            config,
        }
    }

    /// Answer one query. Always returns exactly one result.
    pub async fn answer(&self, query: &Query) -> FinalResult {
        let run_id = Uuid::new_v4();
        let catalog = self.registry.catalog();
        info!("[>] run {}: {}", run_id, query.text);

        let plan = ranking::rank(&self.oracle, query, &catalog).await;
        debug_assert!(plan.validate(&catalog).is_empty());

        // Latency shortcut: ranking already produced the answer and placed
        // the direct-answer capability first
        if let Some(answer) = &plan.immediate_answer {
            if let Some(direct) = catalog.direct_answer_name() {
                info!("[<] run {}: immediate answer from ranking", run_id);
                return FinalResult::from_capability(direct, answer, None);
            }
        }

        let mut context = AccumulatedContext::new();

        for (index, group) in plan.groups.iter().enumerate() {
            let outcome = if group.is_parallel() {
                self.run_parallel_group(query, group, &mut context).await
            } else {
                self.run_single(query, &plan, index, &mut context).await
            };

            if let Some(result) = outcome {
                info!("[<] run {}: answered by group {}", run_id, index + 1);
                return result;
            }
        }

        info!("[<] run {}: plan exhausted, finalizing", run_id);
        fallback::finalize(&self.registry, query, &context, &self.config).await
    }

    /// One sequential attempt. Some(result) halts the loop.
    async fn run_single(
        &self,
        query: &Query,
        plan: &ExecutionPlan,
        index: usize,
        context: &mut AccumulatedContext,
    ) -> Option<FinalResult> {
        let name = &plan.groups[index].members[0];
        let Some(capability) = self.registry.get(name) else {
            warn!("[-] '{}' not in registry, skipping", name);
            return None;
        };

        let remaining = plan.remaining_after(index);
        let call = CapabilityCall {
            query: query.clone(),
            context_render: context.render(),
            remaining: remaining.clone(),
            mode: CallMode::Standard,
        };

        let timeout = Duration::from_secs(self.config.capability_timeout_secs);
        let gathered = match tokio::time::timeout(timeout, capability.gather(&call)).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(self.config.capability_timeout_secs)),
        };

        // Citations outlive verdicts: record before interpreting
        let raw_output = match gathered {
            Ok(output) => {
                if let Some(citation) = output.citation {
                    context.set_citation(citation);
                }
                Some(output.content)
            }
            Err(e) => {
                warn!("[-] '{}' failed: {}", name, e);
                None
            }
        };

        let decision = interpreter::interpret(
            &self.oracle,
            query,
            name,
            raw_output.as_deref(),
            &remaining,
            &context.render(),
            &self.config,
        )
        .await;

        debug!("[+] '{}' verdict: {}", name, decision.response_type.as_str());

        match decision.response_type {
            ResponseType::FinalAnswer => Some(FinalResult::from_capability(
                name,
                decision.content,
                context.citation_cloned(),
            )),
            ResponseType::TryNextTool => None,
            ResponseType::TryNextToolAndAddContext => {
                if let Some(text) = decision.context_to_preserve {
                    context.append(name, text);
                }
                None
            }
        }
    }

    /// One parallel fan-out. Every member runs to completion or failure; a
    /// successful synthesis is unconditionally final for the run.
    async fn run_parallel_group(
        &self,
        query: &Query,
        group: &ToolGroup,
        context: &mut AccumulatedContext,
    ) -> Option<FinalResult> {
        let timeout = Duration::from_secs(self.config.capability_timeout_secs);
        let call = CapabilityCall {
            query: query.clone(),
            context_render: context.render(),
            remaining: vec![],
            mode: CallMode::Standard,
        };

        let mut slots: Vec<Option<RawFetch>> = vec![None; group.members.len()];
        let mut join_set = tokio::task::JoinSet::new();

        for (slot, name) in group.members.iter().enumerate() {
            let Some(capability) = self.registry.get(name) else {
                warn!("[-] '{}' not in registry, marking failed", name);
                slots[slot] = Some(RawFetch::error(name, "not in registry"));
                continue;
            };
            let name = name.clone();
            let call = call.clone();
            join_set.spawn(async move {
                let fetch = match tokio::time::timeout(timeout, capability.gather(&call)).await {
                    Ok(Ok(output)) => RawFetch::ok(&name, output.content, output.citation),
                    Ok(Err(e)) => RawFetch::error(&name, e.to_string()),
                    Err(_) => RawFetch::timeout(&name),
                };
                (slot, fetch)
            });
        }

        // Wait for everyone; a sibling's failure never cancels the rest
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, fetch)) => slots[slot] = Some(fetch),
                Err(e) => warn!("[-] parallel member task failed: {}", e),
            }
        }

        let fetches: Vec<RawFetch> = group
            .members
            .iter()
            .zip(slots)
            .map(|(name, slot)| slot.unwrap_or_else(|| RawFetch::error(name, "task aborted")))
            .collect();

        for fetch in &fetches {
            if let Some(citation) = &fetch.citation {
                context.set_citation(citation.clone());
            }
        }

        match synthesizer::synthesize(&self.oracle, query, &fetches, &context.render(), &self.config)
            .await
        {
            Ok(answer) => {
                let sources = fetches
                    .iter()
                    .filter(|f| f.content.is_some())
                    .map(|f| f.capability.clone())
                    .collect();
                Some(FinalResult {
                    sources,
                    content: answer,
                    citation: context.citation_cloned(),
                })
            }
            Err(e) => {
                warn!("[-] synthesis failed, advancing: {}", e);
                None
            }
        }
    }
}
