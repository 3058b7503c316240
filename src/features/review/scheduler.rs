use chrono::NaiveDateTime;
use diesel::SqliteConnection;
use validator::Validate;

use crate::config::SchedulerConfig;
use crate::data::models::{
    DetectedError, IntervalPreview, ItemType, Judgment, PreviewEntry, ReviewContent, ReviewError,
    ReviewItem, ReviewOutcome, ReviewQueue, ReviewUpdate,
};
use crate::data::repositories::ReviewItemRepository;

use super::calculator::{calculate_next_review, failure_count_after, preview_intervals};
use super::evaluator::effective_judgment;
use super::explanation::resolve_explanation;
use super::items::{draft_from_error, new_item_draft};
use super::queue::build_queue;

/// Review scheduling over one database connection.
///
/// All time-dependent operations take `now` explicitly; handlers pass the
/// wall clock, tests pass fixed instants.
pub struct ReviewScheduler<'a> {
    conn: &'a mut SqliteConnection,
    config: &'a SchedulerConfig,
}

impl<'a> ReviewScheduler<'a> {
    pub fn new(conn: &'a mut SqliteConnection, config: &'a SchedulerConfig) -> Self {
        ReviewScheduler { conn, config }
    }

    /// Items due for `owner_id`, in review order, plus the next due time
    pub fn get_queue(
        &mut self,
        owner_id: i32,
        now: NaiveDateTime,
    ) -> Result<ReviewQueue, ReviewError> {
        build_queue(self.conn, owner_id, now, self.config)
    }

    /// Applies one review response to an owned item.
    ///
    /// The read, the calculation and the write happen in a single
    /// transaction. Nothing is retried here on failure.
    pub fn submit_response(
        &mut self,
        owner_id: i32,
        item_id: i32,
        judgment: Judgment,
        score: Option<f64>,
        now: NaiveDateTime,
    ) -> Result<ReviewOutcome, ReviewError> {
        if let Some(score) = score {
            if !score.is_finite() {
                return Err(ReviewError::ValidationError(format!(
                    "Score must be a finite number, got {}",
                    score
                )));
            }
        }

        let config = self.config;
        let judgment = effective_judgment(judgment, score, config);

        let (outcome, generated) =
            ReviewItemRepository::modify(self.conn, owner_id, item_id, |item| {
                let failure_count = failure_count_after(item.failure_count, judgment);
                let next = calculate_next_review(
                    item.interval_days,
                    item.ease_factor,
                    judgment,
                    failure_count,
                    now,
                    config,
                );
                let explanation = resolve_explanation(
                    item.explanation.as_deref(),
                    failure_count,
                    item.item_type,
                    &item.content,
                    config,
                );
                let generated = item.explanation.is_none() && explanation.is_some();

                let update = ReviewUpdate {
                    ease_factor: next.ease_factor,
                    interval_days: next.interval_days,
                    due_at: next.due_at,
                    failure_count,
                    review_count: item.review_count.saturating_add(1),
                    explanation: explanation.clone(),
                };
                let outcome = ReviewOutcome {
                    next_due: next.due_at,
                    failure_count,
                    show_explanation: failure_count >= config.failure_threshold
                        && explanation.is_some(),
                    explanation,
                };

                Ok((update, (outcome, generated)))
            })?;

        log::debug!(
            "Item {} reviewed as {}: failure_count={}, next_due={}",
            item_id,
            judgment,
            outcome.failure_count,
            outcome.next_due
        );
        if generated {
            log::info!(
                "Generated explanation for item {} after {} consecutive failures",
                item_id,
                outcome.failure_count
            );
        }

        Ok(outcome)
    }

    pub fn create_item(
        &mut self,
        owner_id: i32,
        item_type: ItemType,
        content: ReviewContent,
        priority: Option<i32>,
        requires_spoken: Option<bool>,
        now: NaiveDateTime,
    ) -> Result<ReviewItem, ReviewError> {
        content.validate()?;

        let draft = new_item_draft(item_type, content, priority, requires_spoken, now, self.config);
        ReviewItemRepository::insert(self.conn, owner_id, &draft)
    }

    pub fn create_item_from_error(
        &mut self,
        owner_id: i32,
        source_evaluation_id: Option<String>,
        error: &DetectedError,
        user_level: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ReviewItem, ReviewError> {
        error.validate()?;

        let draft = draft_from_error(error, source_evaluation_id, user_level, now, self.config);
        log::debug!(
            "Error type {:?} classified as {} for owner {}",
            error.error_type,
            draft.item_type,
            owner_id
        );
        ReviewItemRepository::insert(self.conn, owner_id, &draft)
    }

    pub fn get_item(&mut self, owner_id: i32, item_id: i32) -> Result<ReviewItem, ReviewError> {
        ReviewItemRepository::find_for_owner(self.conn, owner_id, item_id)?
            .ok_or(ReviewError::ItemNotFound)
    }

    /// What each judgment would schedule for an owned item, without saving
    pub fn preview(
        &mut self,
        owner_id: i32,
        item_id: i32,
        now: NaiveDateTime,
    ) -> Result<IntervalPreview, ReviewError> {
        let item = self.get_item(owner_id, item_id)?;

        let options = preview_intervals(
            item.interval_days,
            item.ease_factor,
            item.failure_count,
            now,
            self.config,
        )
        .into_iter()
        .map(|(judgment, next)| PreviewEntry {
            judgment,
            interval_days: next.interval_days,
            ease_factor: next.ease_factor,
            due_at: next.due_at,
        })
        .collect();

        Ok(IntervalPreview { item_id, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::db::test_connection;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn vocab_content() -> ReviewContent {
        ReviewContent {
            question: "dog?".into(),
            answer: "el perro".into(),
            example: Some("El perro duerme.".into()),
            ..Default::default()
        }
    }

    fn create(scheduler: &mut ReviewScheduler, owner_id: i32) -> ReviewItem {
        scheduler
            .create_item(owner_id, ItemType::Vocab, vocab_content(), None, None, t0())
            .unwrap()
    }

    #[test]
    fn created_item_starts_with_initial_state() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);

        let item = create(&mut scheduler, 1);

        assert!(approx(item.ease_factor, 2.5));
        assert!(approx(item.interval_days, 1.0));
        assert_eq!(item.due_at, t0() + Duration::days(1));
        assert_eq!(item.review_count, 0);
        assert_eq!(item.failure_count, 0);
        assert_eq!(item.priority, 0);
        assert!(!item.requires_spoken);
    }

    #[test]
    fn hard_response_scenario() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let outcome = scheduler
            .submit_response(1, item.id, Judgment::Hard, None, t0())
            .unwrap();
        assert_eq!(outcome.next_due, t0() + Duration::days(2));
        assert_eq!(outcome.failure_count, 0);
        assert!(!outcome.show_explanation);

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert!(approx(stored.ease_factor, 2.4));
        assert!(approx(stored.interval_days, 2.0));
        assert_eq!(stored.review_count, 1);
    }

    #[test]
    fn good_response_scenario() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let outcome = scheduler
            .submit_response(1, item.id, Judgment::Good, None, t0())
            .unwrap();
        assert_eq!(outcome.next_due, t0() + Duration::days(3));

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert!(approx(stored.ease_factor, 2.55));
        assert!(approx(stored.interval_days, 3.0));
    }

    #[test]
    fn consecutive_failures_generate_explanation_once() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        // First failure, driven by score
        let first = scheduler
            .submit_response(1, item.id, Judgment::Again, Some(45.0), t0())
            .unwrap();
        assert_eq!(first.failure_count, 1);
        assert_eq!(first.next_due, t0() + Duration::hours(6));
        assert!(first.explanation.is_none());
        assert!(!first.show_explanation);

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert!(approx(stored.ease_factor, 2.3));
        assert!(approx(stored.interval_days, 0.5));

        // Second failure crosses the threshold
        let t1 = t0() + Duration::hours(6);
        let second = scheduler
            .submit_response(1, item.id, Judgment::Again, None, t1)
            .unwrap();
        assert_eq!(second.failure_count, 2);
        assert_eq!(second.next_due, t1 + Duration::hours(6));
        assert!(second.show_explanation);
        let explanation = second.explanation.clone().unwrap();
        assert!(explanation.contains("el perro"));

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert!(approx(stored.ease_factor, 2.0));
        assert!(approx(stored.interval_days, 0.5));
        assert_eq!(stored.explanation.as_deref(), Some(explanation.as_str()));

        // Recovery resets failures but keeps the explanation
        let recovered = scheduler
            .submit_response(1, item.id, Judgment::Good, None, t1)
            .unwrap();
        assert_eq!(recovered.failure_count, 0);
        assert!(!recovered.show_explanation);
        assert_eq!(recovered.explanation.as_deref(), Some(explanation.as_str()));

        // Crossing the threshold again does not regenerate it
        scheduler.submit_response(1, item.id, Judgment::Again, None, t1).unwrap();
        let again = scheduler
            .submit_response(1, item.id, Judgment::Again, None, t1)
            .unwrap();
        assert_eq!(again.failure_count, 2);
        assert_eq!(again.explanation.as_deref(), Some(explanation.as_str()));

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert_eq!(stored.review_count, 5);
    }

    #[test]
    fn score_overrides_judgment() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let outcome = scheduler
            .submit_response(1, item.id, Judgment::Good, Some(40.0), t0())
            .unwrap();
        assert_eq!(outcome.failure_count, 1);
        assert_eq!(outcome.next_due, t0() + Duration::hours(6));
    }

    #[test]
    fn non_finite_score_rejected_without_mutation() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let result = scheduler.submit_response(1, item.id, Judgment::Good, Some(f64::NAN), t0());
        assert!(matches!(result, Err(ReviewError::ValidationError(_))));
        assert_eq!(scheduler.get_item(1, item.id).unwrap().review_count, 0);
    }

    #[test]
    fn responses_to_foreign_items_are_not_found() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let foreign = scheduler.submit_response(2, item.id, Judgment::Good, None, t0());
        assert!(matches!(foreign, Err(ReviewError::ItemNotFound)));

        let missing = scheduler.submit_response(1, item.id + 100, Judgment::Good, None, t0());
        assert!(matches!(missing, Err(ReviewError::ItemNotFound)));

        assert!(matches!(scheduler.get_item(2, item.id), Err(ReviewError::ItemNotFound)));
    }

    #[test]
    fn empty_content_is_rejected() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);

        let result = scheduler.create_item(
            1,
            ItemType::Vocab,
            ReviewContent::default(),
            None,
            None,
            t0(),
        );
        assert!(matches!(result, Err(ReviewError::ValidationError(_))));
        assert!(scheduler.get_queue(1, t0() + Duration::days(5)).unwrap().items.is_empty());
    }

    #[test]
    fn item_from_error_is_prioritised_in_queue() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);

        let plain = create(&mut scheduler, 1);
        let derived = scheduler
            .create_item_from_error(
                1,
                Some("eval-42".into()),
                &DetectedError {
                    error_type: "pronunciation".into(),
                    token: "three".into(),
                    correction: Some("θ".into()),
                    explanation: None,
                    context: None,
                },
                Some("B2"),
                t0(),
            )
            .unwrap();

        assert_eq!(derived.item_type, ItemType::Pronunciation);
        assert_eq!(derived.priority, 10);
        assert!(derived.requires_spoken);
        assert_eq!(derived.source_evaluation_id.as_deref(), Some("eval-42"));
        assert_eq!(derived.content.level.as_deref(), Some("B2"));

        let queue = scheduler.get_queue(1, t0() + Duration::days(1)).unwrap();
        let ids: Vec<i32> = queue.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![derived.id, plain.id]);
    }

    #[test]
    fn invalid_error_is_rejected() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);

        let result = scheduler.create_item_from_error(
            1,
            None,
            &DetectedError {
                error_type: "grammar".into(),
                token: String::new(),
                correction: None,
                explanation: None,
                context: None,
            },
            None,
            t0(),
        );
        assert!(matches!(result, Err(ReviewError::ValidationError(_))));

        let blank = scheduler.create_item_from_error(
            1,
            None,
            &DetectedError {
                error_type: "grammar".into(),
                token: " \t ".into(),
                correction: Some("x".into()),
                explanation: None,
                context: Some("hello".into()),
            },
            None,
            t0(),
        );
        assert!(matches!(blank, Err(ReviewError::ValidationError(_))));
        assert!(scheduler.get_queue(1, t0() + Duration::days(5)).unwrap().items.is_empty());
    }

    #[test]
    fn queue_reflects_responses() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        // Not due until a day after creation
        let early = scheduler.get_queue(1, t0()).unwrap();
        assert!(early.items.is_empty());
        assert_eq!(early.next_due_at, Some(t0() + Duration::days(1)));

        let t1 = t0() + Duration::days(1);
        assert_eq!(scheduler.get_queue(1, t1).unwrap().items.len(), 1);

        scheduler.submit_response(1, item.id, Judgment::Again, None, t1).unwrap();
        let after = scheduler.get_queue(1, t1).unwrap();
        assert!(after.items.is_empty());
        assert_eq!(after.next_due_at, Some(t1 + Duration::hours(6)));

        // Other learners never see it
        let other = scheduler.get_queue(2, t1 + Duration::days(30)).unwrap();
        assert!(other.items.is_empty());
        assert!(other.next_due_at.is_none());
    }

    #[test]
    fn preview_does_not_mutate() {
        let mut conn = test_connection();
        let config = SchedulerConfig::default();
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let preview = scheduler.preview(1, item.id, t0()).unwrap();
        assert_eq!(preview.options.len(), 3);
        assert_eq!(preview.options[2].judgment, Judgment::Good);
        assert!(approx(preview.options[2].interval_days, 3.0));

        let stored = scheduler.get_item(1, item.id).unwrap();
        assert_eq!(stored.review_count, 0);
        assert_eq!(stored.due_at, item.due_at);
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let mut conn = test_connection();
        let config = SchedulerConfig {
            failure_threshold: 1,
            ..SchedulerConfig::default()
        };
        let mut scheduler = ReviewScheduler::new(&mut conn, &config);
        let item = create(&mut scheduler, 1);

        let outcome = scheduler
            .submit_response(1, item.id, Judgment::Again, None, t0())
            .unwrap();
        assert!(outcome.show_explanation);

        let stored = scheduler.get_item(1, item.id).unwrap();
        // aggressive path: 2.5 - 0.3
        assert!(approx(stored.ease_factor, 2.2));
    }
}
