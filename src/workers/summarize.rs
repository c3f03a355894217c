//! Summarizer skill: leading-words digest of a text payload

use crate::workers::harness::{AgentSkill, SkillError};
use serde_json::{json, Value};

/// Number of leading words kept in a summary
const SUMMARY_WORDS: usize = 5;

/// Truncates text to its first few words
pub struct SummarizerSkill;

impl SummarizerSkill {
    fn summarize(text: &str) -> String {
        let head: Vec<&str> = text.split_whitespace().take(SUMMARY_WORDS).collect();
        format!("{}...", head.join(" "))
    }
}

impl AgentSkill for SummarizerSkill {
    fn name(&self) -> &str {
        "SummarizerAgent"
    }

    fn role(&self) -> &str {
        "Text Summarizer"
    }

    fn description(&self) -> &str {
        "Condenses long strings into short, digestible summaries."
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["summarize_text".to_string()]
    }

    fn execute(&self, capability: &str, payload: &Value) -> Result<Value, SkillError> {
        if capability != "summarize_text" {
            return Err(SkillError::UnsupportedCapability(capability.to_string()));
        }

        let text = payload.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(json!({ "summary": Self::summarize(text) }))
    }
}
