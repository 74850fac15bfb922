//! Tool-using agent strategy.
//!
//! A bounded ReAct loop: each iteration renders the conversation, asks the
//! model for its next move, and either runs a document tool, accepts a final
//! answer, or nudges the model back to the answer format. The loop ends after
//! `max_agent_iterations` model calls at most.

pub mod protocol;
pub mod tools;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gateway::ModelGateway;
use crate::pipeline::answer::ModelAnswer;
use crate::pipeline::prompts::{
    format_agent_system_prompt, format_agent_turn_prompt, format_agent_user_prompt, AGENT_NUDGE,
};
use crate::pipeline::runner::ExtractionStrategy;
use crate::traits::document::DocumentAccess;
use crate::traits::model::LanguageModel;
use crate::types::config::ExtractionConfig;
use crate::types::indicator::Indicator;
use crate::types::result::{ExtractionMethod, ExtractionResult};

pub use protocol::AgentReply;
pub use tools::{catalog, run_tool, ToolInvocation, ToolSpec};

/// Explanation when the agent answers `found: false`.
pub const NOT_FOUND_EXPLANATION: &str = "Agent could not find this indicator";

/// Explanation when the loop runs out of iterations.
pub const MAX_ITERATIONS_EXPLANATION: &str = "Max iterations reached";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "SYSTEM",
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
            Self::Tool => "TOOL",
        })
    }
}

/// One turn of an agent conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered turns for one indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// `ROLE: content` blocks separated by blank lines.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Lets the model drive document tools until it commits to an answer.
pub struct AgentStrategy<M: LanguageModel> {
    gateway: Arc<ModelGateway<M>>,
    config: ExtractionConfig,
    tools: Vec<ToolSpec>,
}

impl<M: LanguageModel> AgentStrategy<M> {
    pub fn new(gateway: Arc<ModelGateway<M>>, config: ExtractionConfig) -> Self {
        Self {
            gateway,
            config,
            tools: catalog(),
        }
    }

    /// Opening system and user turns for an indicator.
    pub fn start_conversation(&self, indicator: &Indicator) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.push(
            Role::System,
            format_agent_system_prompt(indicator, &tools::render_summaries(&self.tools)),
        );
        conversation.push(Role::User, format_agent_user_prompt(indicator));
        conversation
    }

    fn finish(&self, indicator: &Indicator, answer: ModelAnswer) -> ExtractionResult {
        if answer.found {
            answer.into_result(
                &indicator.code,
                ExtractionMethod::Agent,
                self.config.agent_default_confidence,
            )
        } else {
            let explanation = answer
                .explanation
                .unwrap_or_else(|| NOT_FOUND_EXPLANATION.to_string());
            ExtractionResult::not_found(&indicator.code, ExtractionMethod::Agent, explanation)
        }
    }
}

#[async_trait]
impl<M: LanguageModel> ExtractionStrategy for AgentStrategy<M> {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Agent
    }

    async fn extract(
        &self,
        indicator: &Indicator,
        document: &dyn DocumentAccess,
    ) -> Result<ExtractionResult> {
        let mut conversation = self.start_conversation(indicator);
        let tool_descriptions = tools::render_descriptions(&self.tools);
        let max_iterations = self.config.max_agent_iterations;

        for iteration in 1..=max_iterations {
            info!(indicator = %indicator.code, iteration, max_iterations, "Agent iteration");

            let prompt = format_agent_turn_prompt(&conversation.render(), &tool_descriptions);
            let (reply, model) = self.gateway.call_default(&self.gateway.request(prompt)).await?;
            debug!(indicator = %indicator.code, model = %model, reply_len = reply.len(), "Agent reply");

            match AgentReply::parse(&reply) {
                AgentReply::ToolCall { name, input } => {
                    info!(indicator = %indicator.code, tool = %name, input = %input, "Agent calling tool");
                    let observation = run_tool(&name, input.clone(), document);
                    conversation.push(
                        Role::Assistant,
                        format!("I'll use {} with input: {}", name, input),
                    );
                    conversation.push(Role::Tool, format!("Tool result: {}", observation));
                }
                AgentReply::FinalAnswer { answer } => {
                    let answer = ModelAnswer::from_value(&answer);
                    info!(
                        indicator = %indicator.code,
                        found = answer.found,
                        iteration,
                        "Agent gave final answer"
                    );
                    return Ok(self.finish(indicator, answer));
                }
                AgentReply::Unrecognized => {
                    warn!(indicator = %indicator.code, iteration, "Unrecognized agent reply");
                    conversation.push(Role::User, AGENT_NUDGE);
                }
            }
        }

        warn!(indicator = %indicator.code, max_iterations, "Agent hit iteration cap");
        Ok(ExtractionResult::not_found(
            &indicator.code,
            ExtractionMethod::Agent,
            MAX_ITERATIONS_EXPLANATION,
        ))
    }
}
