use diesel::result::Error as DieselError;
use serde_json::Error as JsonError;
use validator::ValidationErrors;

use crate::data::models::ReviewError;

impl From<DieselError> for ReviewError {
    fn from(err: DieselError) -> Self {
        ReviewError::PersistenceFailure(err.to_string())
    }
}

impl From<r2d2::Error> for ReviewError {
    fn from(err: r2d2::Error) -> Self {
        ReviewError::PersistenceFailure(format!("Failed to get DB connection: {}", err))
    }
}

impl From<JsonError> for ReviewError {
    fn from(err: JsonError) -> Self {
        ReviewError::PersistenceFailure(format!("Invalid stored content: {}", err))
    }
}

impl From<ValidationErrors> for ReviewError {
    fn from(err: ValidationErrors) -> Self {
        ReviewError::ValidationError(err.to_string())
    }
}
