use axum::extract::{Json, Path, State};
use chrono::Utc;
use tower_sessions::Session;

use super::ReviewState;
use crate::{
    data::models::{Judgment, ReviewError, ReviewOutcome, SubmitResponseRequest},
    features::review::ReviewScheduler,
    utils::require_owner,
};

#[axum::debug_handler]
pub async fn submit_response(
    State((pool, config)): State<ReviewState>,
    session: Session,
    Path(item_id): Path<i32>,
    Json(payload): Json<SubmitResponseRequest>,
) -> Result<Json<ReviewOutcome>, ReviewError> {
    let owner_id = require_owner(&session).await?;
    let judgment = payload.judgment.parse::<Judgment>()?;

    let mut conn = pool.get()?;
    let outcome = ReviewScheduler::new(&mut conn, &config)
        .submit_response(owner_id, item_id, judgment, payload.score, Utc::now().naive_utc())
        .inspect_err(|e| {
            if matches!(e, ReviewError::ItemNotFound) {
                log::warn!("Owner {} responded to unknown item {}", owner_id, item_id);
            }
        })?;

    Ok(Json(outcome))
}
