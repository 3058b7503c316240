use axum::extract::{Json, Path, State};
use chrono::Utc;
use tower_sessions::Session;

use super::ReviewState;
use crate::{
    data::models::{
        CreateItemFromErrorRequest, CreateItemRequest, IntervalPreview, ItemType, ReviewError,
        ReviewItem,
    },
    features::review::ReviewScheduler,
    utils::require_owner,
};

#[axum::debug_handler]
pub async fn create_item(
    State((pool, config)): State<ReviewState>,
    session: Session,
    Json(payload): Json<CreateItemRequest>,
) -> Result<Json<ReviewItem>, ReviewError> {
    let owner_id = require_owner(&session).await?;
    let item_type = payload.item_type.parse::<ItemType>()?;

    let mut conn = pool.get()?;
    let item = ReviewScheduler::new(&mut conn, &config).create_item(
        owner_id,
        item_type,
        payload.content,
        payload.priority,
        payload.requires_spoken,
        Utc::now().naive_utc(),
    )?;

    log::info!("Created {} item {} for owner {}", item.item_type, item.id, owner_id);
    Ok(Json(item))
}

pub async fn create_item_from_error(
    State((pool, config)): State<ReviewState>,
    session: Session,
    Json(payload): Json<CreateItemFromErrorRequest>,
) -> Result<Json<ReviewItem>, ReviewError> {
    let owner_id = require_owner(&session).await?;

    let mut conn = pool.get()?;
    let item = ReviewScheduler::new(&mut conn, &config).create_item_from_error(
        owner_id,
        payload.source_evaluation_id,
        &payload.error,
        payload.user_level.as_deref(),
        Utc::now().naive_utc(),
    )?;

    log::info!(
        "Created {} item {} for owner {} from detected error",
        item.item_type,
        item.id,
        owner_id
    );
    Ok(Json(item))
}

pub async fn get_item(
    State((pool, config)): State<ReviewState>,
    session: Session,
    Path(item_id): Path<i32>,
) -> Result<Json<ReviewItem>, ReviewError> {
    let owner_id = require_owner(&session).await?;
    let mut conn = pool.get()?;

    let item = ReviewScheduler::new(&mut conn, &config).get_item(owner_id, item_id)?;
    Ok(Json(item))
}

pub async fn preview_item(
    State((pool, config)): State<ReviewState>,
    session: Session,
    Path(item_id): Path<i32>,
) -> Result<Json<IntervalPreview>, ReviewError> {
    let owner_id = require_owner(&session).await?;
    let mut conn = pool.get()?;

    let preview = ReviewScheduler::new(&mut conn, &config).preview(
        owner_id,
        item_id,
        Utc::now().naive_utc(),
    )?;
    Ok(Json(preview))
}
