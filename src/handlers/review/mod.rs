use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{config::SchedulerConfig, data::db::DbPool};

pub mod items;
pub mod queue;
pub mod respond;

pub type ReviewState = (DbPool, Arc<SchedulerConfig>);

pub fn review_router(pool: DbPool, config: Arc<SchedulerConfig>) -> Router {
    Router::new()
        .route("/queue", get(queue::get_queue))
        .route("/items", post(items::create_item))
        .route("/items/from-error", post(items::create_item_from_error))
        .route("/items/{item_id}", get(items::get_item))
        .route("/items/{item_id}/preview", get(items::preview_item))
        .route("/items/{item_id}/response", post(respond::submit_response))
        .with_state((pool, config))
}
