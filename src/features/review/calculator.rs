//! Interval and ease calculation.
//!
//! A modified SM-2 schedule with three judgments:
//! - `again`: ease drops, interval decays, and the item comes back after a
//!   fixed short relearn delay. From the failure threshold on, both the ease
//!   penalty and the interval decay get harsher.
//! - `hard`: ease drops slightly, interval grows by a fixed factor.
//! - `good`: ease rises slightly, interval grows by the previous ease.
//!
//! On `again` the stored interval and the due time deliberately diverge:
//! the interval keeps decaying for later growth while the due time is always
//! the relearn delay.

use chrono::{Duration, NaiveDateTime};

use crate::config::SchedulerConfig;
use crate::data::models::Judgment;

/// Absorbs float noise from multiplications like `5.0 * 1.2` before
/// rounding to whole days
const ROUNDING_EPSILON: f64 = 1e-9;

/// New scheduling state produced by one review
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextReview {
    pub interval_days: f64,
    pub ease_factor: f64,
    pub due_at: NaiveDateTime,
}

/// Consecutive-failure count after applying `judgment`
pub fn failure_count_after(current: i32, judgment: Judgment) -> i32 {
    match judgment {
        Judgment::Again => current.saturating_add(1),
        Judgment::Hard | Judgment::Good => 0,
    }
}

/// Computes the next interval, ease and due time.
///
/// `interval_days` and `ease_factor` are the pre-review values;
/// `failure_count` is the count after this review was applied.
pub fn calculate_next_review(
    interval_days: f64,
    ease_factor: f64,
    judgment: Judgment,
    failure_count: i32,
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> NextReview {
    let (interval, ease) = match judgment {
        Judgment::Again if failure_count >= config.failure_threshold => (
            (interval_days * config.aggressive_interval_factor + ROUNDING_EPSILON).floor(),
            ease_factor - config.aggressive_ease_penalty,
        ),
        Judgment::Again => (
            interval_days * config.again_interval_factor,
            ease_factor - config.again_ease_penalty,
        ),
        Judgment::Hard => (
            (interval_days * config.hard_interval_factor - ROUNDING_EPSILON).ceil(),
            ease_factor - config.hard_ease_penalty,
        ),
        // Grows by the ease held before this review, not the bumped one
        Judgment::Good => (
            (interval_days * ease_factor - ROUNDING_EPSILON).ceil(),
            ease_factor + config.good_ease_bonus,
        ),
    };

    let interval_days = interval.clamp(config.min_interval_days, config.max_interval_days);
    let ease_factor = ease.clamp(config.min_ease, config.max_ease);

    let due_at = match judgment {
        Judgment::Again => now + Duration::hours(config.relearn_delay_hours),
        Judgment::Hard | Judgment::Good => now + days_to_duration(interval_days),
    };

    NextReview {
        interval_days,
        ease_factor,
        due_at,
    }
}

/// Outcome of each judgment if it were submitted now, without side effects
pub fn preview_intervals(
    interval_days: f64,
    ease_factor: f64,
    failure_count: i32,
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> [(Judgment, NextReview); 3] {
    Judgment::ALL.map(|judgment| {
        let failures = failure_count_after(failure_count, judgment);
        (
            judgment,
            calculate_next_review(interval_days, ease_factor, judgment, failures, now, config),
        )
    })
}

pub(crate) fn days_to_duration(days: f64) -> Duration {
    Duration::seconds((days * 86_400.0).round() as i64)
}
