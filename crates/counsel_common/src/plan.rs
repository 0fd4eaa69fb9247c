//! Execution plan model
//!
//! The ranking stage produces one plan per run: an ordered sequence of
//! capability groups covering the catalog exactly once. A group of size 1
//! runs sequentially through the decision interpreter; a larger group runs
//! as a parallel fan-out feeding the synthesizer.

use crate::capability::CapabilityCatalog;
use serde::{Deserialize, Serialize};

/// A set of capability names scheduled at one priority rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolGroup {
    pub members: Vec<String>,
}

impl ToolGroup {
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    pub fn singleton(name: impl Into<String>) -> Self {
        Self {
            members: vec![name.into()],
        }
    }

    /// Groups larger than one member fan out concurrently
    pub fn is_parallel(&self) -> bool {
        self.members.len() > 1
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// Problems found by [`ExecutionPlan::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanViolation {
    /// A capability name appears in more than one group
    Duplicate(String),
    /// A group names a capability missing from the catalog
    Unknown(String),
    /// A catalog capability appears in no group
    Uncovered(String),
    /// A group has no members
    EmptyGroup,
}

/// Ordered sequence of groups plus an optional ready-made answer
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub groups: Vec<ToolGroup>,
    /// Ready-made answer surfaced only when the first group is the singleton
    /// direct-answer capability. A latency shortcut, never a requirement.
    pub immediate_answer: Option<String>,
}

impl ExecutionPlan {
    pub fn new(groups: Vec<ToolGroup>) -> Self {
        Self {
            groups,
            immediate_answer: None,
        }
    }

    /// Every capability name across all groups, in plan order
    pub fn covered_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().cloned())
            .collect()
    }

    /// All names scheduled after group `index` (the "not yet tried" hint)
    pub fn remaining_after(&self, index: usize) -> Vec<String> {
        self.groups
            .iter()
            .skip(index + 1)
            .flat_map(|g| g.members.iter().cloned())
            .collect()
    }

    /// Check the coverage/disjointness invariant against a catalog.
    ///
    /// Returns every violation rather than failing fast; the ranking stage
    /// asserts this is empty before handing a plan to the orchestrator.
    pub fn validate(&self, catalog: &CapabilityCatalog) -> Vec<PlanViolation> {
        let mut violations = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for group in &self.groups {
            if group.members.is_empty() {
                violations.push(PlanViolation::EmptyGroup);
            }
            for name in &group.members {
                if !catalog.is_valid(name) {
                    violations.push(PlanViolation::Unknown(name.clone()));
                }
                if seen.contains(&name.as_str()) {
                    violations.push(PlanViolation::Duplicate(name.clone()));
                } else {
                    seen.push(name);
                }
            }
        }

        for name in catalog.names() {
            if !seen.contains(&name.as_str()) {
                violations.push(PlanViolation::Uncovered(name));
            }
        }

        violations
    }
}
