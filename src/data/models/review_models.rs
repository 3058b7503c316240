use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::schema::review_items;

// Review scheduling errors
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Review item not found")]
    ItemNotFound,
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Not logged in")]
    Unauthorized,
}

/// Kind of practice unit. Closed set; every per-type behaviour is a match
/// over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Vocab,
    GrammarPattern,
    Sentence,
    Pronunciation,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Vocab => "vocab",
            ItemType::GrammarPattern => "grammar_pattern",
            ItemType::Sentence => "sentence",
            ItemType::Pronunciation => "pronunciation",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vocab" => Ok(ItemType::Vocab),
            "grammar_pattern" => Ok(ItemType::GrammarPattern),
            "sentence" => Ok(ItemType::Sentence),
            "pronunciation" => Ok(ItemType::Pronunciation),
            other => Err(ReviewError::ValidationError(format!(
                "Unknown item type: {}",
                other
            ))),
        }
    }
}

/// Recall quality reported for a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Again,
    Hard,
    Good,
}

impl Judgment {
    pub const ALL: [Judgment; 3] = [Judgment::Again, Judgment::Hard, Judgment::Good];

    pub fn as_str(&self) -> &'static str {
        match self {
            Judgment::Again => "again",
            Judgment::Hard => "hard",
            Judgment::Good => "good",
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Judgment {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Judgment::Again),
            "hard" => Ok(Judgment::Hard),
            "good" => Ok(Judgment::Good),
            "" => Err(ReviewError::ValidationError("Missing judgment".into())),
            other => Err(ReviewError::ValidationError(format!(
                "Unknown judgment: {}",
                other
            ))),
        }
    }
}

/// Practice payload shown to the learner. Only the explanation templates
/// look inside it; the scheduler treats it as opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReviewContent {
    #[serde(default)]
    #[validate(length(min = 1, message = "Question must not be empty"))]
    pub question: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Answer must not be empty"))]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phoneme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// CEFR level of the learner when the item was derived from an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// A learner error reported by the upstream evaluation process
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DetectedError {
    #[serde(default)]
    #[validate(length(min = 1, message = "Error type must not be empty"))]
    pub error_type: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Token must not be empty"))]
    pub token: String,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// One scheduled practice unit owned by a learner
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub id: i32,
    pub owner_id: i32,
    pub item_type: ItemType,
    pub content: ReviewContent,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub due_at: NaiveDateTime,
    pub failure_count: i32,
    pub review_count: i32,
    pub priority: i32,
    pub requires_spoken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_evaluation_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Row representation from database
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = review_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReviewItemRow {
    pub item_id: i32,
    pub owner_id: i32,
    pub item_type: String,
    pub content: String,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub due_at: NaiveDateTime,
    pub failure_count: i32,
    pub review_count: i32,
    pub priority: i32,
    pub requires_spoken: bool,
    pub explanation: Option<String>,
    pub source_evaluation_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ReviewItemRow> for ReviewItem {
    type Error = ReviewError;

    fn try_from(row: ReviewItemRow) -> Result<Self, Self::Error> {
        // A bad type or payload here means the stored row is corrupt,
        // not that the caller sent something invalid
        let item_type = row.item_type.parse::<ItemType>().map_err(|_| {
            ReviewError::PersistenceFailure(format!(
                "Item {} has unknown type {:?}",
                row.item_id, row.item_type
            ))
        })?;
        let content = serde_json::from_str(&row.content)?;

        Ok(ReviewItem {
            id: row.item_id,
            owner_id: row.owner_id,
            item_type,
            content,
            ease_factor: row.ease_factor,
            interval_days: row.interval_days,
            due_at: row.due_at,
            failure_count: row.failure_count,
            review_count: row.review_count,
            priority: row.priority,
            requires_spoken: row.requires_spoken,
            explanation: row.explanation,
            source_evaluation_id: row.source_evaluation_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = review_items)]
pub struct NewReviewItem<'a> {
    pub owner_id: i32,
    pub item_type: &'a str,
    pub content: &'a str,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub due_at: NaiveDateTime,
    pub failure_count: i32,
    pub review_count: i32,
    pub priority: i32,
    pub requires_spoken: bool,
    pub source_evaluation_id: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

/// Item fields decided before insertion, prior to JSON encoding
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub item_type: ItemType,
    pub content: ReviewContent,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub due_at: NaiveDateTime,
    pub priority: i32,
    pub requires_spoken: bool,
    pub source_evaluation_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Persisted state after one review response
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpdate {
    pub ease_factor: f64,
    pub interval_days: f64,
    pub due_at: NaiveDateTime,
    pub failure_count: i32,
    pub review_count: i32,
    pub explanation: Option<String>,
}
