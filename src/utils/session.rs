use tower_sessions::Session;

use crate::data::models::ReviewError;

/// Learner id stored in the session by the authentication layer
pub async fn get_current_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>("user_id").await {
        Ok(Some(user_id)) => Some(user_id),
        Ok(None) => None,
        Err(e) => {
            log::error!("Failed to get user_id from session: {}", e);
            None
        }
    }
}

pub async fn require_owner(session: &Session) -> Result<i32, ReviewError> {
    get_current_user_id(session).await.ok_or_else(|| {
        log::warn!("Review request without a logged-in learner");
        ReviewError::Unauthorized
    })
}
