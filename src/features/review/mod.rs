//! Spaced-repetition scheduling for learner review items.
//!
//! - `evaluator`: score/judgment resolution
//! - `calculator`: interval and ease updates
//! - `explanation`: one-shot remediation text
//! - `queue`: due-item selection and ordering
//! - `items`: item creation and error classification
//! - `scheduler`: the operations exposed to handlers

pub mod calculator;
pub mod error_conversions;
pub mod error_responses;
pub mod evaluator;
pub mod explanation;
pub mod items;
pub mod queue;
pub mod scheduler;

pub use scheduler::ReviewScheduler;
