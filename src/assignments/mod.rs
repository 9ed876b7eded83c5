//! Assignments module.
//!
//! Issuing tests to groups and following them through to evaluation:
//! - Roster snapshots taken when a test is assigned
//! - Completion derived from submitted results
//! - Progress rollups for dashboards

pub mod completion;
pub mod error;
pub mod progress;
pub mod roster;
pub mod types;

pub use completion::{partition, CompletionTracker};
pub use error::{AssignmentError, AssignmentResult};
pub use progress::{
    completion_percent, split_by_due, AssignmentListing, AssignmentProgress, AssignmentSummary,
    AthleteAssignment, AthleteAssignments, DashboardCards, ProgressAggregator, ProgressCard,
};
pub use roster::AssignmentManager;
pub use types::{
    Assignment, Comment, CompletionState, CompletionStatus, EvaluatedResult, RosterEntry,
    TestResult,
};
