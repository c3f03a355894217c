//! Sentiment skill: keyword-counted tone classification
//!
//! Scoring is substring containment over the lowercased text, one point per
//! keyword list hit, with a fixed bonus for common "no problems" phrasings
//! so negated complaints do not read as negative.

use crate::workers::harness::{AgentSkill, SkillError};
use serde_json::{json, Value};

const POSITIVE_WORDS: [&str; 15] = [
    "good",
    "great",
    "happy",
    "excellent",
    "stunning",
    "charm",
    "perfect",
    "love",
    "amazing",
    "brilliant",
    "expected",
    "success",
    "working",
    "best",
    "wonderful",
];

const NEGATIVE_WORDS: [&str; 13] = [
    "bad",
    "sad",
    "angry",
    "fail",
    "error",
    "broken",
    "issue",
    "problem",
    "unhappy",
    "poor",
    "terrible",
    "worst",
    "difficult",
];

/// Phrases that cancel out the negative keywords they contain
const NEGATION_PHRASES: [&str; 3] = ["without any issues", "no issues", "no problems"];

/// Classifies text as positive, negative, or neutral
pub struct SentimentSkill;

impl SentimentSkill {
    fn score(text: &str) -> i32 {
        let mut score = 0;
        for word in POSITIVE_WORDS {
            if text.contains(word) {
                score += 1;
            }
        }
        for word in NEGATIVE_WORDS {
            if text.contains(word) {
                score -= 1;
            }
        }
        if NEGATION_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            score += 2;
        }
        score
    }

    fn classify(text: &str) -> &'static str {
        let score = Self::score(&text.to_lowercase());
        if score > 0 {
            "positive"
        } else if score < 0 {
            "negative"
        } else {
            "neutral"
        }
    }
}

impl AgentSkill for SentimentSkill {
    fn name(&self) -> &str {
        "SentimentAgent"
    }

    fn role(&self) -> &str {
        "Sentiment Analyst"
    }

    fn description(&self) -> &str {
        "Analyzes the emotional tone of text."
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["analyze_sentiment".to_string()]
    }

    fn execute(&self, capability: &str, payload: &Value) -> Result<Value, SkillError> {
        if capability != "analyze_sentiment" {
            return Err(SkillError::UnsupportedCapability(capability.to_string()));
        }

        let text = payload.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(json!({ "sentiment": Self::classify(text) }))
    }
}
