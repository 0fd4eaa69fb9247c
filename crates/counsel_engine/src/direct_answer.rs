//! Direct-answer capability
//!
//! Asks the oracle to answer from its own knowledge, folding in whatever
//! context earlier capabilities produced. In final-synthesis mode the prompt
//! shifts from "answer if you can" to "summarize what we have".

use std::sync::Arc;

use async_trait::async_trait;
use counsel_common::capability::CapabilitySpec;
use counsel_common::prompts;

use crate::capability::{CallMode, Capability, CapabilityCall, CapabilityOutput};
use crate::error::CapabilityError;
use crate::oracle::Oracle;

pub const DIRECT_ANSWER_NAME: &str = "direct_answer";

pub struct DirectAnswerCapability {
    spec: CapabilitySpec,
    oracle: Arc<dyn Oracle>,
}

impl DirectAnswerCapability {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            spec: CapabilitySpec::direct_answer(
                DIRECT_ANSWER_NAME,
                "Answer from the model's own knowledge, without consulting external sources",
            ),
            oracle,
        }
    }
}

#[async_trait]
impl Capability for DirectAnswerCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn gather(&self, call: &CapabilityCall) -> Result<CapabilityOutput, CapabilityError> {
        let prompt = match call.mode {
            CallMode::Standard => prompts::direct_answer_prompt(&call.query, &call.context_render),
            CallMode::FinalSynthesis => {
                prompts::final_synthesis_prompt(&call.query, &call.context_render)
            }
        };

        let answer = self.oracle.generate(&prompt, false).await?;
        Ok(CapabilityOutput::text(answer.trim()))
    }
}
