//! Group management.
//!
//! Provides group creation with code allocation, membership, and soft deletion.

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::codes::{normalize_code, CodeAllocator};
use super::types::{Group, Membership};
use crate::storage::database::{format_timestamp, is_unique_violation, timestamp_column, uuid_column};
use crate::storage::GroupSettings;

const GROUP_COLUMNS: &str = "g.code, g.name, g.description, g.coach_id, g.active, g.created_at,
     (SELECT COUNT(*) FROM group_memberships m
      WHERE m.group_code = g.code AND m.left_at IS NULL) AS member_count";

/// Manager for groups and their memberships.
pub struct GroupManager<'a> {
    conn: &'a Connection,
    allocator: CodeAllocator,
    max_code_attempts: u32,
}

impl<'a> GroupManager<'a> {
    /// Create a group manager using the configured code settings.
    pub fn new(conn: &'a Connection, settings: &GroupSettings) -> Result<Self, GroupError> {
        Ok(Self::with_allocator(
            conn,
            CodeAllocator::from_settings(settings)?,
            settings.max_code_attempts,
        ))
    }

    /// Create a group manager with an explicit allocator and attempt cap.
    pub fn with_allocator(conn: &'a Connection, allocator: CodeAllocator, max_code_attempts: u32) -> Self {
        Self {
            conn,
            allocator,
            max_code_attempts: max_code_attempts.max(1),
        }
    }

    /// Allocate a group code not currently used by any group.
    pub fn allocate_group_code(&self) -> Result<String, GroupError> {
        self.allocate_group_code_with(&mut rand::thread_rng())
    }

    /// Allocate a group code using the given random source.
    ///
    /// Gives up with [`GroupError::CodeCollision`] after `max_code_attempts` taken
    /// candidates.
    pub fn allocate_group_code_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, GroupError> {
        let mut attempts = 0u32;
        self.allocator.allocate(rng, |candidate| {
            attempts += 1;
            if self.code_exists(candidate)? {
                if attempts >= self.max_code_attempts {
                    return Err(GroupError::CodeCollision { attempts });
                }
                return Ok(true);
            }
            Ok(false)
        })
    }

    /// Create a new group owned by `coach_id`.
    pub fn create_group(
        &self,
        coach_id: Uuid,
        name: &str,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Group, GroupError> {
        self.create_group_with(&mut rand::thread_rng(), coach_id, name, description, now)
    }

    /// Create a new group, drawing codes from the given random source.
    ///
    /// A uniqueness violation at insert time means another writer took the code
    /// between the check and the insert; a fresh code is allocated and the insert
    /// retried, up to `max_code_attempts` times.
    pub fn create_group_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        coach_id: Uuid,
        name: &str,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Group, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::Validation("Group name is required".to_string()));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        for attempt in 1..=self.max_code_attempts {
            let code = self.allocate_group_code_with(rng)?;

            let inserted = self.conn.execute(
                "INSERT INTO groups (code, name, description, coach_id, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                params![code, name, description, coach_id.to_string(), format_timestamp(&now)],
            );

            match inserted {
                Ok(_) => {
                    tracing::info!(code = %code, coach_id = %coach_id, "Created group");
                    return Ok(Group {
                        code,
                        name: name.to_string(),
                        description: description.map(str::to_string),
                        coach_id,
                        active: true,
                        member_count: 0,
                        created_at: now,
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(code = %code, attempt, "Group code taken at insert, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(GroupError::CodeCollision {
            attempts: self.max_code_attempts,
        })
    }

    /// Get a group by code.
    pub fn get_group(&self, code: &str) -> Result<Group, GroupError> {
        let code = normalize_code(code);
        let group = self
            .conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM groups g WHERE g.code = ?1"),
                params![code],
                parse_group_row,
            )
            .optional()?;

        group.ok_or(GroupError::NotFound(code))
    }

    /// Get groups owned by a coach, newest first.
    pub fn groups_for_coach(&self, coach_id: Uuid, include_inactive: bool) -> Result<Vec<Group>, GroupError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups g
             WHERE g.coach_id = ?1 AND (?2 OR g.active = 1)
             ORDER BY g.created_at DESC"
        ))?;

        let rows = stmt.query_map(params![coach_id.to_string(), include_inactive], parse_group_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(GroupError::from)
    }

    /// Soft-delete a group. Its code stays reserved.
    pub fn deactivate_group(&self, coach_id: Uuid, code: &str) -> Result<(), GroupError> {
        let code = normalize_code(code);
        let rows = self.conn.execute(
            "UPDATE groups SET active = 0 WHERE code = ?1 AND coach_id = ?2",
            params![code, coach_id.to_string()],
        )?;

        if rows == 0 {
            return Err(GroupError::NotFound(code));
        }

        tracing::info!(code = %code, "Deactivated group");
        Ok(())
    }

    /// Join an active group by code.
    pub fn join_group(&self, code: &str, athlete_id: Uuid, now: DateTime<Utc>) -> Result<Group, GroupError> {
        let code = normalize_code(code);

        let active: Option<bool> = self
            .conn
            .query_row(
                "SELECT active FROM groups WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;

        if active != Some(true) {
            return Err(GroupError::InvalidCode(code));
        }

        // At most one open membership per athlete and group, enforced by
        // idx_group_memberships_current.
        let inserted = self.conn.execute(
            "INSERT INTO group_memberships (id, group_code, athlete_id, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                code,
                athlete_id.to_string(),
                format_timestamp(&now),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(GroupError::AlreadyMember),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(code = %code, athlete_id = %athlete_id, "Athlete joined group");
        self.get_group(&code)
    }

    /// Leave a group.
    pub fn leave_group(&self, code: &str, athlete_id: Uuid, now: DateTime<Utc>) -> Result<(), GroupError> {
        let code = normalize_code(code);
        let rows = self.conn.execute(
            "UPDATE group_memberships SET left_at = ?3
             WHERE group_code = ?1 AND athlete_id = ?2 AND left_at IS NULL",
            params![code, athlete_id.to_string(), format_timestamp(&now)],
        )?;

        if rows == 0 {
            return Err(GroupError::NotMember);
        }

        tracing::info!(code = %code, athlete_id = %athlete_id, "Athlete left group");
        Ok(())
    }

    /// Current members of a group, in join order.
    pub fn members(&self, code: &str) -> Result<Vec<Uuid>, GroupError> {
        let code = normalize_code(code);
        // Surface NotFound instead of an empty list for unknown codes
        self.get_group(&code)?;
        current_members(self.conn, &code).map_err(GroupError::from)
    }

    /// Full membership history of a group, including athletes who left.
    pub fn memberships(&self, code: &str) -> Result<Vec<Membership>, GroupError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, group_code, athlete_id, joined_at, left_at
             FROM group_memberships
             WHERE group_code = ?1
             ORDER BY joined_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![normalize_code(code)], |row| {
            let left_at: Option<String> = row.get(4)?;
            Ok(Membership {
                id: uuid_column(row, 0)?,
                group_code: row.get(1)?,
                athlete_id: uuid_column(row, 2)?,
                joined_at: timestamp_column(row, 3)?,
                left_at: match left_at {
                    Some(_) => Some(timestamp_column(row, 4)?),
                    None => None,
                },
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(GroupError::from)
    }

    /// Whether an athlete is currently a member of a group.
    pub fn is_member(&self, code: &str, athlete_id: Uuid) -> Result<bool, GroupError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM group_memberships
                           WHERE group_code = ?1 AND athlete_id = ?2 AND left_at IS NULL)",
            params![normalize_code(code), athlete_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn code_exists(&self, code: &str) -> Result<bool, GroupError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE code = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

/// Current members of a group, in join order.
pub(crate) fn current_members(conn: &Connection, code: &str) -> rusqlite::Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT athlete_id FROM group_memberships
         WHERE group_code = ?1 AND left_at IS NULL
         ORDER BY joined_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![code], |row| uuid_column(row, 0))?;
    rows.collect()
}

/// Parse a database row into a Group.
fn parse_group_row(row: &rusqlite::Row) -> rusqlite::Result<Group> {
    Ok(Group {
        code: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        coach_id: uuid_column(row, 3)?,
        active: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        member_count: row.get(6)?,
    })
}

/// Group errors.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("No free group code after {attempts} attempts")]
    CodeCollision { attempts: u32 },

    #[error("Invalid code settings: {0}")]
    InvalidCodeSettings(String),

    #[error("Group not found: {0}")]
    NotFound(String),

    #[error("Invalid join code: {0}")]
    InvalidCode(String),

    #[error("Already a member")]
    AlreadyMember,

    #[error("Not a member")]
    NotMember,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
