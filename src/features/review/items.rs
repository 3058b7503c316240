use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

use crate::config::SchedulerConfig;
use crate::data::models::{DetectedError, ItemDraft, ItemType, ReviewContent};

use super::calculator::days_to_duration;

lazy_static! {
    static ref PRONUNCIATION_RE: Regex = Regex::new(r"(?i)pronunciation|phoneme").unwrap();
    static ref GRAMMAR_RE: Regex = Regex::new(r"(?i)grammar|conjugation").unwrap();
    static ref VOCAB_RE: Regex = Regex::new(r"(?i)vocab|word").unwrap();
}

/// Maps an upstream error type onto an item type by substring match.
/// Checked in order: pronunciation, grammar, vocabulary; anything else is a
/// sentence.
pub fn classify_error_type(error_type: &str) -> ItemType {
    if PRONUNCIATION_RE.is_match(error_type) {
        ItemType::Pronunciation
    } else if GRAMMAR_RE.is_match(error_type) {
        ItemType::GrammarPattern
    } else if VOCAB_RE.is_match(error_type) {
        ItemType::Vocab
    } else {
        ItemType::Sentence
    }
}

/// Draft for an item created with explicit content
pub fn new_item_draft(
    item_type: ItemType,
    content: ReviewContent,
    priority: Option<i32>,
    requires_spoken: Option<bool>,
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> ItemDraft {
    ItemDraft {
        item_type,
        content,
        ease_factor: config.initial_ease,
        interval_days: config.initial_interval_days,
        due_at: now + days_to_duration(config.initial_interval_days),
        priority: priority.unwrap_or(0),
        requires_spoken: requires_spoken.unwrap_or(false),
        source_evaluation_id: None,
        created_at: now,
    }
}

/// Draft for an item derived from a detected learner error
pub fn draft_from_error(
    error: &DetectedError,
    source_evaluation_id: Option<String>,
    user_level: Option<&str>,
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> ItemDraft {
    let item_type = classify_error_type(&error.error_type);
    let content = synthesize_content(item_type, error, user_level);
    let requires_spoken = matches!(item_type, ItemType::Pronunciation | ItemType::Sentence);

    ItemDraft {
        source_evaluation_id,
        ..new_item_draft(
            item_type,
            content,
            Some(config.error_priority),
            Some(requires_spoken),
            now,
            config,
        )
    }
}

/// Builds practice content for an error. Deterministic: the same error and
/// level always produce the same content.
pub fn synthesize_content(
    item_type: ItemType,
    error: &DetectedError,
    user_level: Option<&str>,
) -> ReviewContent {
    let token = error.token.trim();
    let correction = non_empty(error.correction.as_deref()).unwrap_or(token);
    let context = non_empty(error.context.as_deref());
    let explanation = non_empty(error.explanation.as_deref()).map(str::to_string);
    let corrected_context = context.and_then(|ctx| replace_token(ctx, token, correction));
    let prompt = context.unwrap_or(token);

    let base = ReviewContent {
        context: context.map(str::to_string),
        level: non_empty(user_level).map(str::to_string),
        ..Default::default()
    };

    match item_type {
        ItemType::Pronunciation => ReviewContent {
            question: format!("Say \"{}\" out loud.", token),
            answer: correction.to_string(),
            word: Some(token.to_string()),
            phoneme: non_empty(error.correction.as_deref()).map(str::to_string),
            hint: explanation,
            ..base
        },
        ItemType::GrammarPattern => ReviewContent {
            question: format!("Correct the grammar: {}", prompt),
            answer: corrected_context.unwrap_or_else(|| correction.to_string()),
            rule: explanation,
            pattern: Some(format!("{} → {}", token, correction)),
            ..base
        },
        ItemType::Vocab => ReviewContent {
            question: format!("Which word fits here? {}", prompt),
            answer: correction.to_string(),
            word: Some(token.to_string()),
            example: corrected_context,
            hint: explanation,
            ..base
        },
        ItemType::Sentence => ReviewContent {
            question: format!("Say it correctly: {}", prompt),
            answer: corrected_context.unwrap_or_else(|| correction.to_string()),
            hint: explanation,
            ..base
        },
    }
}

/// Replaces whole-token occurrences of `token` in `context`, or `None` when
/// the token does not occur as a whole token.
fn replace_token(context: &str, token: &str, correction: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    // `\b` only anchors next to word characters, so tokens like "l'" or
    // "-ed" get an anchor on their word side only
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = if token.starts_with(is_word) { r"\b" } else { "" };
    let end = if token.ends_with(is_word) { r"\b" } else { "" };
    let pattern = Regex::new(&format!("{}{}{}", start, regex::escape(token), end)).ok()?;

    if !pattern.is_match(context) {
        return None;
    }
    Some(pattern.replace_all(context, NoExpand(correction)).into_owned())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
