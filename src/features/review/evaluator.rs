use crate::config::SchedulerConfig;
use crate::data::models::Judgment;

/// Resolves the judgment to apply for a review.
///
/// A supplied score always wins over the explicit judgment. Scores are not
/// clamped: anything below the hard threshold (negatives included) is
/// `again`, anything at or above the good threshold (above 100 included) is
/// `good`. Non-finite scores are rejected before they get here.
pub fn effective_judgment(
    explicit: Judgment,
    score: Option<f64>,
    config: &SchedulerConfig,
) -> Judgment {
    match score {
        Some(score) if score < config.hard_score_threshold => Judgment::Again,
        Some(score) if score < config.good_score_threshold => Judgment::Hard,
        Some(_) => Judgment::Good,
        None => explicit,
    }
}
