use axum::extract::{Json, State};
use chrono::Utc;
use tower_sessions::Session;

use super::ReviewState;
use crate::{
    data::models::{ReviewError, ReviewQueue},
    features::review::ReviewScheduler,
    utils::require_owner,
};

pub async fn get_queue(
    State((pool, config)): State<ReviewState>,
    session: Session,
) -> Result<Json<ReviewQueue>, ReviewError> {
    let owner_id = require_owner(&session).await?;
    let mut conn = pool.get()?;

    let queue =
        ReviewScheduler::new(&mut conn, &config).get_queue(owner_id, Utc::now().naive_utc())?;

    Ok(Json(queue))
}
