//! LLM prompts for the extraction strategies.
//!
//! Templates use `{placeholder}` markers filled by the `format_*` functions.
//! Document text is substituted last so report content can never inject a
//! placeholder.

use crate::types::indicator::Indicator;

/// System prompt for the fixed pipeline.
pub const PIPELINE_SYSTEM_PROMPT: &str = "You are an expert ESG data analyst specializing in extracting \
sustainability indicators from corporate reports. Your task is to carefully analyze \
the provided text and extract the requested indicator value with high accuracy.";

/// Per-context prompt for the fixed pipeline.
pub const PIPELINE_PROMPT: &str = r#"Extract the following ESG indicator from the provided text context:

**Indicator**: {name}
**Description**: {description}
**Expected Unit**: {unit}
**Related Keywords**: {keywords}

**Text Context**:
{context}

Please extract the indicator value and provide your response in the following JSON format:
{
    "value": "the extracted value as a string (e.g., '1,234,567' or '12.5%')",
    "numeric_value": the value as a number (e.g., 1234567 or 12.5),
    "unit": "the unit of measurement (e.g., 'tCO2e', '%', 'employees')",
    "confidence": a confidence score between 0.0 and 1.0,
    "explanation": "brief explanation of where and how you found this value",
    "source_text": "the exact sentence or phrase containing the value",
    "found": true or false
}

If the indicator is not found or cannot be extracted with confidence, set "found" to false
and "confidence" to 0.0. Always provide the most accurate numeric value you can extract."#;

/// System turn for the tool-using agent.
pub const AGENT_SYSTEM_PROMPT: &str = r#"You are an expert ESG data extraction agent. Your task is to autonomously
extract the following indicator from a sustainability report.

**Indicator**: {name} ({code})
**Description**: {description}
**Expected Unit**: {unit}
**Keywords to search**: {keywords}

**Available Tools**:
{tools}

**Your Task**:
1. Decide which tool(s) to use to find this indicator
2. Search the document strategically
3. Extract the value when you find it
4. Return the result in JSON format

**Important**:
- Think step by step about where this data might be located
- Use tools efficiently (don't request every page)
- After using 2-3 tools, you should have enough information to provide a final answer
- When you find the value, YOU MUST respond with FINAL ANSWER: followed by the JSON
- Use this EXACT JSON format for your final answer:
{
    "value": "the extracted value as string",
    "numeric_value": the numeric value as float (or null),
    "unit": "the unit",
    "confidence": 0.0 to 1.0 (how confident you are),
    "explanation": "how and where you found it including page number",
    "source_page": page number where found,
    "found": true or false
}

**Examples of good final answers**:
FINAL ANSWER: {"value": "1,234 tCO2e", "numeric_value": 1234, "unit": "tCO2e", "confidence": 0.95, "explanation": "Found in emissions table on page 77", "source_page": 77, "found": true}

FINAL ANSWER: {"found": false, "confidence": 0.0, "explanation": "Searched pages 50-80 but could not find this indicator"}

Begin your extraction process now."#;

/// First user turn of an agent conversation.
pub const AGENT_USER_PROMPT: &str = "Extract the indicator: {name}";

/// Appended after an unrecognized agent reply.
pub const AGENT_NUDGE: &str = "Please provide your final answer in the JSON format specified.";

/// Trailer appended to the rendered agent conversation on every iteration.
pub const AGENT_TURN_PROMPT: &str = r#"{conversation}

Available tools:
{tools}

To use a tool, respond with:
TOOL: tool_name
INPUT: {"param": "value"}

To provide final answer, respond with:
FINAL ANSWER: {"value": "...", "unit": "...", "confidence": 0.95, ...}

Your response:"#;

/// Single-shot prompt for the vector strategy.
pub const VECTOR_PROMPT: &str = r#"Extract the ESG indicator from the provided document context.

**Indicator:** {code} - {name}
**Description:** {description}
**Expected Unit:** {unit}

**Document Context:**
{context}

**Instructions:**
1. Find the exact value for this indicator in the context
2. Extract the numeric value with its unit
3. Identify the page number where you found it
4. Provide confidence score (0.0 to 1.0)

Respond in this exact format:
VALUE: [extracted value with unit, or "Not found"]
PAGE: [page number, or "N/A"]
CONFIDENCE: [0.0 to 1.0]
REASONING: [brief explanation of what you found]"#;

/// Format the fixed-pipeline prompt for one context, truncated to `max_chars`.
pub fn format_pipeline_prompt(indicator: &Indicator, context: &str, max_chars: usize) -> String {
    PIPELINE_PROMPT
        .replace("{name}", &indicator.name)
        .replace("{description}", &indicator.description)
        .replace("{unit}", &indicator.expected_unit)
        .replace("{keywords}", &indicator.keywords.join(", "))
        .replace("{context}", truncate_chars(context, max_chars))
}

/// Format the agent system turn. `tools` is a `- name: summary` list.
pub fn format_agent_system_prompt(indicator: &Indicator, tools: &str) -> String {
    AGENT_SYSTEM_PROMPT
        .replace("{code}", &indicator.code)
        .replace("{description}", &indicator.description)
        .replace("{unit}", &indicator.expected_unit)
        .replace("{keywords}", &indicator.keywords.join(", "))
        .replace("{tools}", tools)
        .replace("{name}", &indicator.name)
}

pub fn format_agent_user_prompt(indicator: &Indicator) -> String {
    AGENT_USER_PROMPT.replace("{name}", &indicator.name)
}

/// Wrap a rendered conversation with the tool list and directive grammar.
pub fn format_agent_turn_prompt(conversation: &str, tools: &str) -> String {
    AGENT_TURN_PROMPT
        .replace("{tools}", tools)
        .replace("{conversation}", conversation)
}

/// Format the vector-strategy prompt around retrieved context.
pub fn format_vector_prompt(indicator: &Indicator, context: &str) -> String {
    VECTOR_PROMPT
        .replace("{code}", &indicator.code)
        .replace("{description}", &indicator.description)
        .replace("{unit}", &indicator.expected_unit)
        .replace("{name}", &indicator.name)
        .replace("{context}", context)
}

/// Semantic query text for an indicator: name, description and keywords.
pub fn vector_query(indicator: &Indicator) -> String {
    format!(
        "{}. {}. Keywords: {}",
        indicator.name,
        indicator.description,
        indicator.keywords.join(", ")
    )
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::indicator::Category;

    fn indicator() -> Indicator {
        Indicator::new(
            "E1-1",
            "Total GHG Emissions",
            Category::Environmental,
            "Total greenhouse gas emissions (Scope 1, 2, and 3)",
            "tCO2e",
        )
        .with_keywords(["GHG emissions", "carbon emissions"])
    }

    #[test]
    fn test_pipeline_prompt_truncates_context() {
        let context = "x".repeat(5000);
        let prompt = format_pipeline_prompt(&indicator(), &context, 4000);
        assert!(prompt.contains("**Indicator**: Total GHG Emissions"));
        assert!(prompt.contains("**Related Keywords**: GHG emissions, carbon emissions"));
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }

    #[test]
    fn test_context_placeholders_are_not_expanded() {
        let prompt = format_pipeline_prompt(&indicator(), "see {name} here", 4000);
        assert!(prompt.contains("see {name} here"));
    }

    #[test]
    fn test_agent_prompts() {
        let system = format_agent_system_prompt(&indicator(), "- search_pdf: Search");
        assert!(system.contains("**Indicator**: Total GHG Emissions (E1-1)"));
        assert!(system.contains("- search_pdf: Search"));
        assert!(system.contains(r#"FINAL ANSWER: {"found": false"#));
        assert_eq!(
            format_agent_user_prompt(&indicator()),
            "Extract the indicator: Total GHG Emissions"
        );

        let turn = format_agent_turn_prompt("SYSTEM: hi", "- t: d");
        assert!(turn.starts_with("SYSTEM: hi\n\nAvailable tools:\n- t: d"));
        assert!(turn.ends_with("Your response:"));
    }

    #[test]
    fn test_vector_prompt_and_query() {
        let prompt = format_vector_prompt(&indicator(), "--- Page 3 (relevance: 0.91) ---");
        assert!(prompt.contains("**Indicator:** E1-1 - Total GHG Emissions"));
        assert!(prompt.contains("--- Page 3 (relevance: 0.91) ---"));
        assert_eq!(
            vector_query(&indicator()),
            "Total GHG Emissions. Total greenhouse gas emissions (Scope 1, 2, and 3). \
             Keywords: GHG emissions, carbon emissions"
        );
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("émissions", 3), "émi");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
