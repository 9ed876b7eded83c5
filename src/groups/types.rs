//! Group type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A coach-owned group athletes join with a short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Join code, unique and immutable
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Coach who owns the group
    pub coach_id: Uuid,
    /// Whether the group still accepts members and assignments
    pub active: bool,
    /// Number of current members
    pub member_count: u32,
    /// When the group was created
    pub created_at: DateTime<Utc>,
}

/// Membership of an athlete in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub group_code: String,
    pub athlete_id: Uuid,
    pub joined_at: DateTime<Utc>,
    /// Set when the athlete left; `None` while current
    pub left_at: Option<DateTime<Utc>>,
}

impl Membership {
    /// Whether the athlete is still a member.
    pub fn is_current(&self) -> bool {
        self.left_at.is_none()
    }
}
