use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::config::SchedulerConfig;
use crate::data::models::{ReviewError, ReviewQueue};
use crate::data::repositories::ReviewItemRepository;

/// Builds the review queue for one learner.
///
/// Due items (`due_at <= now`) are ordered by failure count (desc), then
/// priority (desc), then due time (asc), and capped at the daily limit.
/// `next_due_at` is the earliest due time still in the future, regardless
/// of the cap. Both reads share one transaction so they see the same state.
pub fn build_queue(
    conn: &mut SqliteConnection,
    owner_id: i32,
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> Result<ReviewQueue, ReviewError> {
    conn.transaction::<_, ReviewError, _>(|conn| {
        let items = ReviewItemRepository::find_due(conn, owner_id, now, config.daily_cap)?;
        let next_due_at = ReviewItemRepository::next_due_after(conn, owner_id, now)?;

        Ok(ReviewQueue { items, next_due_at })
    })
}
