//! Evaluations module.
//!
//! Coach-authored test definitions and the tier tables results are graded against.

pub mod manager;
pub mod tiers;
pub mod types;

pub use manager::{EvaluationError, TestDefinitionManager};
pub use tiers::{classify, classify_text, Classification, OUT_OF_RANGE};
pub use types::{MetricKind, TestDefinition, Tier};
