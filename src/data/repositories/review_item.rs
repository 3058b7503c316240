use chrono::NaiveDateTime;
use diesel::dsl::min;
use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::data::models::{
    ItemDraft, NewReviewItem, ReviewError, ReviewItem, ReviewItemRow, ReviewUpdate,
};
use crate::schema::review_items;

pub struct ReviewItemRepository;

impl ReviewItemRepository {
    pub fn insert(
        conn: &mut SqliteConnection,
        owner_id: i32,
        draft: &ItemDraft,
    ) -> Result<ReviewItem, ReviewError> {
        let content = serde_json::to_string(&draft.content)?;

        conn.transaction::<_, ReviewError, _>(|conn| {
            diesel::insert_into(review_items::table)
                .values(&NewReviewItem {
                    owner_id,
                    item_type: draft.item_type.as_str(),
                    content: &content,
                    ease_factor: draft.ease_factor,
                    interval_days: draft.interval_days,
                    due_at: draft.due_at,
                    failure_count: 0,
                    review_count: 0,
                    priority: draft.priority,
                    requires_spoken: draft.requires_spoken,
                    source_evaluation_id: draft.source_evaluation_id.as_deref(),
                    created_at: draft.created_at,
                })
                .execute(conn)?;

            let item_id = diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()"))
                .get_result::<i32>(conn)?;

            Self::find_for_owner(conn, owner_id, item_id)?.ok_or_else(|| {
                ReviewError::PersistenceFailure(format!("Item {} missing after insert", item_id))
            })
        })
    }

    pub fn find_for_owner(
        conn: &mut SqliteConnection,
        owner_id: i32,
        item_id: i32,
    ) -> Result<Option<ReviewItem>, ReviewError> {
        review_items::table
            .filter(review_items::owner_id.eq(owner_id))
            .filter(review_items::item_id.eq(item_id))
            .select(ReviewItemRow::as_select())
            .first(conn)
            .optional()?
            .map(ReviewItem::try_from)
            .transpose()
    }

    /// Due items of one owner in review order: most consecutive failures
    /// first, then highest priority, then longest overdue
    pub fn find_due(
        conn: &mut SqliteConnection,
        owner_id: i32,
        now: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<ReviewItem>, ReviewError> {
        review_items::table
            .filter(review_items::owner_id.eq(owner_id))
            .filter(review_items::due_at.le(now))
            .order_by((
                review_items::failure_count.desc(),
                review_items::priority.desc(),
                review_items::due_at.asc(),
                review_items::item_id.asc(),
            ))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(ReviewItemRow::as_select())
            .load(conn)?
            .into_iter()
            .map(ReviewItem::try_from)
            .collect()
    }

    /// Earliest due time of the owner's items that are not due yet
    pub fn next_due_after(
        conn: &mut SqliteConnection,
        owner_id: i32,
        now: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, ReviewError> {
        Ok(review_items::table
            .filter(review_items::owner_id.eq(owner_id))
            .filter(review_items::due_at.gt(now))
            .select(min(review_items::due_at))
            .get_result::<Option<NaiveDateTime>>(conn)?)
    }

    /// Atomic read-modify-write of a single owned item.
    ///
    /// Runs under `BEGIN IMMEDIATE`, so the write lock is held from the read
    /// onwards and two responses to the same item cannot interleave.
    pub fn modify<T, F>(
        conn: &mut SqliteConnection,
        owner_id: i32,
        item_id: i32,
        apply: F,
    ) -> Result<T, ReviewError>
    where
        F: FnOnce(&ReviewItem) -> Result<(ReviewUpdate, T), ReviewError>,
    {
        conn.immediate_transaction(|conn| {
            let item = Self::find_for_owner(conn, owner_id, item_id)?
                .ok_or(ReviewError::ItemNotFound)?;

            let (update, output) = apply(&item)?;

            let updated = diesel::update(
                review_items::table
                    .filter(review_items::item_id.eq(item_id))
                    .filter(review_items::owner_id.eq(owner_id)),
            )
            .set((
                review_items::ease_factor.eq(update.ease_factor),
                review_items::interval_days.eq(update.interval_days),
                review_items::due_at.eq(update.due_at),
                review_items::failure_count.eq(update.failure_count),
                review_items::review_count.eq(update.review_count),
                review_items::explanation.eq(update.explanation.as_deref()),
            ))
            .execute(conn)?;

            if updated != 1 {
                return Err(ReviewError::PersistenceFailure(format!(
                    "Expected to update 1 row for item {}, updated {}",
                    item_id, updated
                )));
            }

            Ok(output)
        })
    }
}
