pub mod api_models;
pub mod review_models;

pub use api_models::{
    CreateItemFromErrorRequest, CreateItemRequest, IntervalPreview, PreviewEntry,
    ReviewOutcome, ReviewQueue, SubmitResponseRequest,
};
pub use review_models::{
    DetectedError, ItemDraft, ItemType, Judgment, NewReviewItem, ReviewContent, ReviewError,
    ReviewItem, ReviewItemRow, ReviewUpdate,
};
