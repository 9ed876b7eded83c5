//! Completion tracking, result submission and coach feedback.
//!
//! Completion is derived, never stored: an athlete is completed for an assignment
//! when at least one result row exists for the pair, pending otherwise. Every call
//! recomputes from the roster and result tables.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use uuid::Uuid;

use super::error::{AssignmentError, AssignmentResult};
use super::roster::{find_assignment, roster_athletes};
use super::types::{Assignment, Comment, CompletionStatus, EvaluatedResult, TestResult};
use crate::evaluations::TestDefinitionManager;
use crate::storage::database::{format_timestamp, timestamp_column, uuid_column};

/// Partition a roster by result presence, keeping roster order.
///
/// Submissions from athletes outside the roster are ignored.
pub fn partition(assignment_id: Uuid, roster: &[Uuid], submitted: &HashSet<Uuid>) -> CompletionStatus {
    let (completed, pending): (Vec<Uuid>, Vec<Uuid>) =
        roster.iter().copied().partition(|athlete| submitted.contains(athlete));

    CompletionStatus {
        assignment_id,
        pending,
        completed,
    }
}

/// Derives completion state and records results.
pub struct CompletionTracker<'a> {
    conn: &'a Connection,
}

impl<'a> CompletionTracker<'a> {
    /// Create a new completion tracker with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Split an assignment's roster into pending and completed athletes.
    pub fn derive_status(&self, assignment_id: Uuid) -> AssignmentResult<CompletionStatus> {
        self.require_assignment(assignment_id)?;

        let roster = roster_athletes(self.conn, assignment_id)?;
        let submitted = self.submitted_athletes(assignment_id)?;
        let status = partition(assignment_id, &roster, &submitted);

        tracing::debug!(
            assignment_id = %assignment_id,
            pending = status.pending.len(),
            completed = status.completed.len(),
            "Derived completion status"
        );
        Ok(status)
    }

    /// Delete every result (and its comments) an athlete submitted for an assignment.
    ///
    /// Irreversible. Returns the number of results removed.
    pub fn reset_completion(&self, assignment_id: Uuid, athlete_id: Uuid) -> AssignmentResult<usize> {
        self.require_assignment(assignment_id)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM result_comments WHERE result_id IN
                (SELECT id FROM results WHERE assignment_id = ?1 AND athlete_id = ?2)",
            params![assignment_id.to_string(), athlete_id.to_string()],
        )?;
        let removed = tx.execute(
            "DELETE FROM results WHERE assignment_id = ?1 AND athlete_id = ?2",
            params![assignment_id.to_string(), athlete_id.to_string()],
        )?;
        tx.commit()?;

        tracing::info!(
            assignment_id = %assignment_id,
            athlete_id = %athlete_id,
            removed,
            "Reset completion"
        );
        Ok(removed)
    }

    /// Record a result for a rostered athlete.
    pub fn submit_result(
        &self,
        assignment_id: Uuid,
        athlete_id: Uuid,
        value: f64,
        recorded_on: DateTime<Utc>,
    ) -> AssignmentResult<TestResult> {
        if !value.is_finite() {
            return Err(AssignmentError::MalformedValue(value));
        }

        self.require_assignment(assignment_id)?;

        let on_roster: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM assignment_rosters
                           WHERE assignment_id = ?1 AND athlete_id = ?2)",
            params![assignment_id.to_string(), athlete_id.to_string()],
            |row| row.get(0),
        )?;
        if !on_roster {
            return Err(AssignmentError::NotOnRoster {
                assignment_id,
                athlete_id,
            });
        }

        let result = TestResult {
            id: Uuid::new_v4(),
            assignment_id,
            athlete_id,
            value,
            recorded_on,
        };

        self.conn.execute(
            "INSERT INTO results (id, assignment_id, athlete_id, value, recorded_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.id.to_string(),
                result.assignment_id.to_string(),
                result.athlete_id.to_string(),
                result.value,
                format_timestamp(&result.recorded_on),
            ],
        )?;

        tracing::info!(assignment_id = %assignment_id, athlete_id = %athlete_id, "Result submitted");
        Ok(result)
    }

    /// Latest result an athlete submitted for an assignment.
    pub fn latest_result(&self, assignment_id: Uuid, athlete_id: Uuid) -> AssignmentResult<Option<TestResult>> {
        self.conn
            .query_row(
                "SELECT id, assignment_id, athlete_id, value, recorded_on FROM results
                 WHERE assignment_id = ?1 AND athlete_id = ?2
                 ORDER BY recorded_on DESC, rowid DESC
                 LIMIT 1",
                params![assignment_id.to_string(), athlete_id.to_string()],
                parse_result_row,
            )
            .optional()
            .map_err(AssignmentError::from)
    }

    /// Attach feedback to a result.
    pub fn add_comment(
        &self,
        result_id: Uuid,
        author_id: Uuid,
        body: &str,
        commented_on: DateTime<Utc>,
    ) -> AssignmentResult<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AssignmentError::Validation("Comment is empty".to_string()));
        }

        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM results WHERE id = ?1)",
            params![result_id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AssignmentError::ResultNotFound(result_id));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            result_id,
            author_id,
            body: body.to_string(),
            commented_on,
        };

        self.conn.execute(
            "INSERT INTO result_comments (id, result_id, author_id, body, commented_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.to_string(),
                comment.result_id.to_string(),
                comment.author_id.to_string(),
                comment.body,
                format_timestamp(&comment.commented_on),
            ],
        )?;

        Ok(comment)
    }

    /// The earliest comment on a result; later ones are not surfaced.
    pub fn first_comment(&self, result_id: Uuid) -> AssignmentResult<Option<Comment>> {
        self.conn
            .query_row(
                "SELECT id, result_id, author_id, body, commented_on FROM result_comments
                 WHERE result_id = ?1
                 ORDER BY commented_on ASC, rowid ASC
                 LIMIT 1",
                params![result_id.to_string()],
                |row| {
                    Ok(Comment {
                        id: uuid_column(row, 0)?,
                        result_id: uuid_column(row, 1)?,
                        author_id: uuid_column(row, 2)?,
                        body: row.get(3)?,
                        commented_on: timestamp_column(row, 4)?,
                    })
                },
            )
            .optional()
            .map_err(AssignmentError::from)
    }

    /// Completed athletes' latest results, classified against the test's tiers.
    ///
    /// Fails with [`AssignmentError::TestNotFound`] if the test definition was deleted.
    pub fn evaluated_results(&self, assignment_id: Uuid) -> AssignmentResult<Vec<EvaluatedResult>> {
        let assignment = self.require_assignment(assignment_id)?;
        let definition = TestDefinitionManager::new(self.conn)
            .get(assignment.test_id)?
            .ok_or(AssignmentError::TestNotFound(assignment.test_id))?;

        let status = self.derive_status(assignment_id)?;

        let mut evaluated = Vec::with_capacity(status.completed.len());
        for athlete_id in status.completed {
            let Some(result) = self.latest_result(assignment_id, athlete_id)? else {
                // Reset between the two reads
                continue;
            };
            let comment = self.first_comment(result.id)?;
            evaluated.push(EvaluatedResult {
                athlete_id,
                classification: definition.classify(result.value),
                result,
                comment,
            });
        }

        Ok(evaluated)
    }

    fn require_assignment(&self, assignment_id: Uuid) -> AssignmentResult<Assignment> {
        find_assignment(self.conn, assignment_id)?.ok_or(AssignmentError::NotFound(assignment_id))
    }

    fn submitted_athletes(&self, assignment_id: Uuid) -> AssignmentResult<HashSet<Uuid>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT athlete_id FROM results WHERE assignment_id = ?1")?;

        let rows = stmt.query_map(params![assignment_id.to_string()], |row| uuid_column(row, 0))?;

        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(AssignmentError::from)
    }
}

fn parse_result_row(row: &rusqlite::Row) -> rusqlite::Result<TestResult> {
    Ok(TestResult {
        id: uuid_column(row, 0)?,
        assignment_id: uuid_column(row, 1)?,
        athlete_id: uuid_column(row, 2)?,
        value: row.get(3)?,
        recorded_on: timestamp_column(row, 4)?,
    })
}
