//! Assignment error types.

use thiserror::Error;
use uuid::Uuid;

use crate::evaluations::EvaluationError;

/// Errors raised by assignment, completion and progress operations.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// The group has no current members to roster.
    #[error("Group {0} has no members to assign")]
    EmptyRoster(String),

    /// The assignment and its roster could not be written together. Nothing was
    /// kept; the whole assignment has to be created again.
    #[error("Assignment was not saved, retry creating it: {0}")]
    PartialWrite(String),

    /// The same test is already assigned to the group for that due date.
    #[error("Test already assigned to this group for that due date")]
    AlreadyAssigned,

    #[error("Assignment not found: {0}")]
    NotFound(Uuid),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group is inactive: {0}")]
    GroupInactive(String),

    #[error("Test definition not found: {0}")]
    TestNotFound(Uuid),

    #[error("Result not found: {0}")]
    ResultNotFound(Uuid),

    #[error("Athlete {athlete_id} is not on the roster of assignment {assignment_id}")]
    NotOnRoster { assignment_id: Uuid, athlete_id: Uuid },

    /// Result values must be finite numbers.
    #[error("Malformed result value: {0}")]
    MalformedValue(f64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// Result type for assignment operations.
pub type AssignmentResult<T> = Result<T, AssignmentError>;
