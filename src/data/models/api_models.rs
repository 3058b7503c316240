use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::review_models::{DetectedError, Judgment, ReviewContent, ReviewItem};

/// Request payload for creating an item with explicit content
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub item_type: String,
    pub content: ReviewContent,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub requires_spoken: Option<bool>,
}

/// Request payload for turning a detected learner error into an item
#[derive(Debug, Deserialize)]
pub struct CreateItemFromErrorRequest {
    #[serde(default)]
    pub source_evaluation_id: Option<String>,
    pub error: DetectedError,
    #[serde(default)]
    pub user_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    #[serde(default)]
    pub judgment: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Result of a review response
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub next_due: NaiveDateTime,
    pub failure_count: i32,
    pub show_explanation: bool,
    pub explanation: Option<String>,
}

/// Items due now plus the time the next not-yet-due item becomes eligible
#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueue {
    pub items: Vec<ReviewItem>,
    pub next_due_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewEntry {
    pub judgment: Judgment,
    pub interval_days: f64,
    pub ease_factor: f64,
    pub due_at: NaiveDateTime,
}

/// What each judgment would do to an item if submitted now
#[derive(Debug, Clone, Serialize)]
pub struct IntervalPreview {
    pub item_id: i32,
    pub options: Vec<PreviewEntry>,
}
