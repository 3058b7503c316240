use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::models::ReviewError;

impl ReviewError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::ItemNotFound => StatusCode::NOT_FOUND,
            ReviewError::ValidationError(_) => StatusCode::BAD_REQUEST,
            // Transient: the caller decides whether to retry
            ReviewError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReviewError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ReviewError::PersistenceFailure(e) = &self {
            log::error!("Review persistence failure: {}", e);
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
