use crate::config::SchedulerConfig;
use crate::data::models::{ItemType, ReviewContent};

const GENERIC_EXPLANATION: &str =
    "You've missed this one a few times. Review it carefully before trying again.";

/// Returns the explanation to store after a review.
///
/// An explanation already present is kept as is. Otherwise one is generated
/// only when the failure count has reached the threshold.
pub fn resolve_explanation(
    existing: Option<&str>,
    failure_count: i32,
    item_type: ItemType,
    content: &ReviewContent,
    config: &SchedulerConfig,
) -> Option<String> {
    match existing {
        Some(explanation) => Some(explanation.to_string()),
        None if failure_count >= config.failure_threshold => {
            Some(generate_explanation(item_type, content))
        }
        None => None,
    }
}

/// Remediation text for an item the learner keeps failing.
///
/// Falls back to a generic message when the content lacks the fields the
/// type-specific template needs.
pub fn generate_explanation(item_type: ItemType, content: &ReviewContent) -> String {
    let specific = match item_type {
        ItemType::Pronunciation => pronunciation(content),
        ItemType::Vocab => vocab(content),
        ItemType::GrammarPattern => grammar_pattern(content),
        ItemType::Sentence => Some(sentence(content)),
    };

    specific.unwrap_or_else(|| GENERIC_EXPLANATION.to_string())
}

fn pronunciation(content: &ReviewContent) -> Option<String> {
    let word = non_empty(content.word.as_deref()).or(non_empty(Some(content.answer.as_str())))?;
    let sound = non_empty(content.phoneme.as_deref())
        .map(|phoneme| format!("the \"{}\" sound", phoneme))
        .unwrap_or_else(|| "each sound".to_string());

    Some(format!(
        "Focus on {} in \"{}\". Say it slowly a few times, then build up to normal speed.",
        sound, word
    ))
}

fn vocab(content: &ReviewContent) -> Option<String> {
    let answer = non_empty(Some(content.answer.as_str()))?;

    Some(match non_empty(content.example.as_deref()) {
        Some(example) => format!("The answer is \"{}\". Example: {}", answer, example),
        None => format!("The answer is \"{}\".", answer),
    })
}

fn grammar_pattern(content: &ReviewContent) -> Option<String> {
    let rule = non_empty(content.rule.as_deref());
    let pattern = non_empty(content.pattern.as_deref());

    match (rule, pattern) {
        (Some(rule), Some(pattern)) => Some(format!("Rule: {} Pattern: {}", rule, pattern)),
        (Some(rule), None) => Some(format!("Rule: {}", rule)),
        (None, Some(pattern)) => Some(format!("Pattern: {}", pattern)),
        (None, None) => None,
    }
}

fn sentence(content: &ReviewContent) -> String {
    match non_empty(content.hint.as_deref()) {
        Some(hint) => format!("Break it down: {}", hint),
        None => "Break the sentence into short chunks, practise each one, then say it in full."
            .to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
