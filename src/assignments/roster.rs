//! Assignment creation and roster snapshots.
//!
//! An assignment's roster is copied from the group's membership when the assignment
//! is created and never follows later joins or leaves.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::error::{AssignmentError, AssignmentResult};
use super::types::{Assignment, RosterEntry};
use crate::evaluations::TestDefinitionManager;
use crate::groups::manager::current_members;
use crate::groups::normalize_code;
use crate::storage::database::{
    date_column, format_date, format_timestamp, is_unique_violation, timestamp_column, uuid_column,
};

pub(crate) const ASSIGNMENT_COLUMNS: &str =
    "a.id, a.test_id, a.group_code, a.coach_id, a.assigned_on, a.due_on";

/// Manager for assignments and their rosters.
pub struct AssignmentManager<'a> {
    conn: &'a Connection,
}

impl<'a> AssignmentManager<'a> {
    /// Create a new assignment manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Assign a test to a group, snapshotting the group's current members.
    ///
    /// The assignment row and every roster row are written in one transaction.
    pub fn snapshot_roster(
        &self,
        coach_id: Uuid,
        group_code: &str,
        test_id: Uuid,
        due_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> AssignmentResult<Assignment> {
        let code = normalize_code(group_code);

        let group: Option<(String, bool)> = self
            .conn
            .query_row(
                "SELECT coach_id, active FROM groups WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match group {
            Some((owner, _)) if owner != coach_id.to_string() => {
                return Err(AssignmentError::GroupNotFound(code))
            }
            Some((_, false)) => return Err(AssignmentError::GroupInactive(code)),
            Some(_) => {}
            None => return Err(AssignmentError::GroupNotFound(code)),
        }

        let definition = TestDefinitionManager::new(self.conn).get(test_id)?;
        if definition.map(|d| d.coach_id) != Some(coach_id) {
            return Err(AssignmentError::TestNotFound(test_id));
        }

        let tx = self.conn.unchecked_transaction()?;

        let members = current_members(&tx, &code)?;
        if members.is_empty() {
            tracing::warn!(group_code = %code, test_id = %test_id, "Refusing to assign test to empty group");
            return Err(AssignmentError::EmptyRoster(code));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            test_id,
            group_code: code,
            coach_id,
            assigned_on: now,
            due_on,
        };

        match tx.execute(
            "INSERT INTO assignments (id, test_id, group_code, coach_id, assigned_on, due_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                assignment.id.to_string(),
                assignment.test_id.to_string(),
                assignment.group_code,
                assignment.coach_id.to_string(),
                format_timestamp(&assignment.assigned_on),
                format_date(assignment.due_on),
            ],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(AssignmentError::AlreadyAssigned),
            Err(e) => return Err(AssignmentError::PartialWrite(e.to_string())),
        }

        write_roster(&tx, &assignment, &members)
            .map_err(|e| AssignmentError::PartialWrite(e.to_string()))?;

        let written = roster_size(&tx, assignment.id)
            .map_err(|e| AssignmentError::PartialWrite(e.to_string()))?;
        if written != members.len() {
            return Err(AssignmentError::PartialWrite(format!(
                "{written} of {} roster rows written",
                members.len()
            )));
        }

        tx.commit()
            .map_err(|e| AssignmentError::PartialWrite(e.to_string()))?;

        tracing::info!(
            assignment_id = %assignment.id,
            group_code = %assignment.group_code,
            roster = members.len(),
            "Created assignment"
        );
        Ok(assignment)
    }

    /// Get an assignment by ID.
    pub fn get(&self, id: Uuid) -> AssignmentResult<Assignment> {
        find_assignment(self.conn, id)?.ok_or(AssignmentError::NotFound(id))
    }

    /// The snapshotted roster of an assignment, in snapshot order.
    pub fn roster(&self, assignment_id: Uuid) -> AssignmentResult<Vec<RosterEntry>> {
        self.get(assignment_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT assignment_id, athlete_id, group_code FROM assignment_rosters
             WHERE assignment_id = ?1
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![assignment_id.to_string()], |row| {
            Ok(RosterEntry {
                assignment_id: uuid_column(row, 0)?,
                athlete_id: uuid_column(row, 1)?,
                group_code: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(AssignmentError::from)
    }

    /// All assignments issued by a coach, newest first.
    pub fn list_for_coach(&self, coach_id: Uuid) -> AssignmentResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments a
             WHERE a.coach_id = ?1
             ORDER BY a.assigned_on DESC"
        ))?;

        let rows = stmt.query_map(params![coach_id.to_string()], parse_assignment_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(AssignmentError::from)
    }
}

fn write_roster(conn: &Connection, assignment: &Assignment, members: &[Uuid]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO assignment_rosters (assignment_id, athlete_id, group_code, position)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (position, athlete_id) in members.iter().enumerate() {
        stmt.execute(params![
            assignment.id.to_string(),
            athlete_id.to_string(),
            assignment.group_code,
            position as i64,
        ])?;
    }

    Ok(())
}

fn roster_size(conn: &Connection, assignment_id: Uuid) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM assignment_rosters WHERE assignment_id = ?1",
        params![assignment_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Look up an assignment by ID.
pub(crate) fn find_assignment(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Assignment>> {
    conn.query_row(
        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments a WHERE a.id = ?1"),
        params![id.to_string()],
        parse_assignment_row,
    )
    .optional()
}

/// Athlete ids on an assignment's roster, in snapshot order.
pub(crate) fn roster_athletes(conn: &Connection, assignment_id: Uuid) -> rusqlite::Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT athlete_id FROM assignment_rosters
         WHERE assignment_id = ?1
         ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![assignment_id.to_string()], |row| uuid_column(row, 0))?;
    rows.collect()
}

/// Parse the leading [`ASSIGNMENT_COLUMNS`] of a row into an Assignment.
pub(crate) fn parse_assignment_row(row: &rusqlite::Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: uuid_column(row, 0)?,
        test_id: uuid_column(row, 1)?,
        group_code: row.get(2)?,
        coach_id: uuid_column(row, 3)?,
        assigned_on: timestamp_column(row, 4)?,
        due_on: date_column(row, 5)?,
    })
}
