//! Agent directive grammar.
//!
//! A reply is either a tool call:
//!
//! ```text
//! TOOL: search_pdf
//! INPUT: {"query": "scope 1"}
//! ```
//!
//! or a final answer (`FINAL ANSWER: {...}`, or bare JSON). Anything else is
//! unrecognized. Tool calls win when a reply contains both.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::pipeline::answer::parse_json_reply;

const TOOL_MARKER: &str = "TOOL:";
const INPUT_MARKER: &str = "INPUT:";
const FINAL_MARKER: &str = "FINAL ANSWER:";

/// What a model reply asks the agent loop to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentReply {
    ToolCall { name: String, input: Value },
    FinalAnswer { answer: Value },
    Unrecognized,
}

impl AgentReply {
    /// Classify a raw model reply.
    pub fn parse(reply: &str) -> Self {
        if let Some((name, input)) = parse_tool_call(reply) {
            return Self::ToolCall { name, input };
        }
        if let Some(answer) = parse_final_answer(reply) {
            return Self::FinalAnswer { answer };
        }
        Self::Unrecognized
    }
}

fn parse_tool_call(reply: &str) -> Option<(String, Value)> {
    let tool_line = reply.lines().find(|l| l.starts_with(TOOL_MARKER))?;
    let input_line = reply.lines().find(|l| l.starts_with(INPUT_MARKER))?;

    let name = tool_line[TOOL_MARKER.len()..].trim().to_string();
    let raw_input = input_line[INPUT_MARKER.len()..].trim();

    match serde_json::from_str::<Value>(raw_input) {
        Ok(input) if !name.is_empty() => Some((name, input)),
        Ok(_) => None,
        Err(e) => {
            warn!(tool = %name, error = %e, "Failed to parse tool input");
            None
        }
    }
}

fn parse_final_answer(reply: &str) -> Option<Value> {
    if reply.contains(FINAL_MARKER) {
        if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
            if start < end {
                match serde_json::from_str::<Value>(&reply[start..=end]) {
                    Ok(value) => return Some(value),
                    Err(e) => warn!(error = %e, "Failed to parse final answer"),
                }
            }
        }
    }

    parse_json_reply(reply).ok().filter(Value::is_object)
}
