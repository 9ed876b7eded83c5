//! Assignment type definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluations::Classification;

/// One issuance of a test to a group with a deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub test_id: Uuid,
    pub group_code: String,
    pub coach_id: Uuid,
    pub assigned_on: DateTime<Utc>,
    pub due_on: NaiveDate,
}

impl Assignment {
    /// Whether the assignment is still open on `today` (due today counts as open).
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.due_on >= today
    }
}

/// One athlete on an assignment's snapshotted roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub assignment_id: Uuid,
    pub athlete_id: Uuid,
    /// Group the athlete was rostered through
    pub group_code: String,
}

/// Completion state of one athlete on one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Pending,
    Completed,
}

/// Roster partitioned by whether a result exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub assignment_id: Uuid,
    /// Rostered athletes without a result, in roster order
    pub pending: Vec<Uuid>,
    /// Rostered athletes with at least one result, in roster order
    pub completed: Vec<Uuid>,
}

impl CompletionStatus {
    /// Roster size.
    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    /// State of a single athlete, `None` if not on the roster.
    pub fn state_of(&self, athlete_id: Uuid) -> Option<CompletionState> {
        if self.completed.contains(&athlete_id) {
            Some(CompletionState::Completed)
        } else if self.pending.contains(&athlete_id) {
            Some(CompletionState::Pending)
        } else {
            None
        }
    }
}

/// A submitted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub athlete_id: Uuid,
    pub value: f64,
    pub recorded_on: DateTime<Utc>,
}

/// Coach feedback on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub result_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub commented_on: DateTime<Utc>,
}

/// A completed athlete's latest result with its tier and first comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedResult {
    pub athlete_id: Uuid,
    pub result: TestResult,
    /// `None` when the stored value is not a usable number
    pub classification: Option<Classification>,
    pub comment: Option<Comment>,
}
