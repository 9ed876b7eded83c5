//! Athlete activity feed.
//!
//! Merges two streams inside a rolling window: assignments the athlete was
//! rostered on, and coach feedback on the athlete's own results. Items are
//! synthesized on every call; nothing about them is persisted.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::database::{date_column, format_timestamp, timestamp_column, uuid_column};

/// Default window when none is configured.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Source stream of a feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemKind {
    Assignment,
    Feedback,
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub kind: FeedItemKind,
    pub title: String,
    pub message: String,
    pub occurred_on: DateTime<Utc>,
    /// Assignment the item relates to
    pub assignment_id: Uuid,
}

/// Builds an athlete's activity feed.
pub struct ActivityFeed<'a> {
    conn: &'a Connection,
}

impl<'a> ActivityFeed<'a> {
    /// Create a new activity feed with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Items from the last `window_days` days before `now`, newest first.
    ///
    /// An item exactly `window_days` old is still included.
    pub fn build_feed(
        &self,
        athlete_id: Uuid,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<FeedItem>, FeedError> {
        if window_days < 0 {
            return Err(FeedError::InvalidWindow(window_days));
        }
        let window = Duration::try_days(window_days).ok_or(FeedError::InvalidWindow(window_days))?;
        let cutoff = now
            .checked_sub_signed(window)
            .ok_or(FeedError::InvalidWindow(window_days))?;

        let mut items = self.assignment_items(athlete_id, cutoff)?;
        items.extend(self.feedback_items(athlete_id, cutoff)?);

        items.sort_by(|a, b| b.occurred_on.cmp(&a.occurred_on));

        tracing::debug!(
            athlete_id = %athlete_id,
            window_days,
            items = items.len(),
            "Built activity feed"
        );
        Ok(items)
    }

    fn assignment_items(
        &self,
        athlete_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.assigned_on, a.due_on, t.name, g.name
             FROM assignment_rosters ar
             JOIN assignments a ON a.id = ar.assignment_id
             JOIN groups g ON g.code = ar.group_code
             LEFT JOIN test_definitions t ON t.id = a.test_id
             WHERE ar.athlete_id = ?1 AND a.assigned_on >= ?2",
        )?;

        let rows = stmt.query_map(
            params![athlete_id.to_string(), format_timestamp(&cutoff)],
            |row| {
                let assignment_id = uuid_column(row, 0)?;
                let assigned_on = timestamp_column(row, 1)?;
                let due_on = date_column(row, 2)?;
                let test_name: Option<String> = row.get(3)?;
                let group_name: String = row.get(4)?;

                Ok(FeedItem {
                    kind: FeedItemKind::Assignment,
                    title: assignment_title(test_name.as_deref()),
                    message: assignment_message(&group_name, due_on),
                    occurred_on: assigned_on,
                    assignment_id,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(FeedError::from)
    }

    fn feedback_items(
        &self,
        athlete_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FeedItem>, FeedError> {
        // Only the earliest comment on each result is surfaced.
        let mut stmt = self.conn.prepare(
            "SELECT r.assignment_id, c.body, c.commented_on, t.name
             FROM result_comments c
             JOIN results r ON r.id = c.result_id
             JOIN assignments a ON a.id = r.assignment_id
             LEFT JOIN test_definitions t ON t.id = a.test_id
             WHERE r.athlete_id = ?1
               AND c.commented_on >= ?2
               AND c.rowid = (
                   SELECT c2.rowid FROM result_comments c2
                   WHERE c2.result_id = c.result_id
                   ORDER BY c2.commented_on ASC, c2.rowid ASC
                   LIMIT 1
               )",
        )?;

        let rows = stmt.query_map(
            params![athlete_id.to_string(), format_timestamp(&cutoff)],
            |row| {
                let test_name: Option<String> = row.get(3)?;
                Ok(FeedItem {
                    kind: FeedItemKind::Feedback,
                    title: feedback_title(test_name.as_deref()),
                    message: row.get(1)?,
                    occurred_on: timestamp_column(row, 2)?,
                    assignment_id: uuid_column(row, 0)?,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(FeedError::from)
    }
}

fn assignment_title(test_name: Option<&str>) -> String {
    match test_name {
        Some(name) => format!("New test: {name}"),
        None => "New test".to_string(),
    }
}

fn assignment_message(group_name: &str, due_on: NaiveDate) -> String {
    format!("Assigned to {group_name}, due {}", due_on.format("%b %-d, %Y"))
}

fn feedback_title(test_name: Option<&str>) -> String {
    match test_name {
        Some(name) => format!("Coach feedback on {name}"),
        None => "Coach feedback".to_string(),
    }
}

/// Feed errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed window must be a non-negative number of days, got {0}")]
    InvalidWindow(i64),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
