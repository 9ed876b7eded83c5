//! Database schema definitions for FieldTest.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Groups table (code is the coach-facing join code)
CREATE TABLE IF NOT EXISTS groups (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    coach_id TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_groups_coach_id ON groups(coach_id);

-- Group memberships table
CREATE TABLE IF NOT EXISTS group_memberships (
    id TEXT PRIMARY KEY,
    group_code TEXT NOT NULL REFERENCES groups(code),
    athlete_id TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    left_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_group_memberships_group ON group_memberships(group_code);
CREATE INDEX IF NOT EXISTS idx_group_memberships_athlete ON group_memberships(athlete_id);

-- Test definitions table (tiers stored as ordered JSON list)
CREATE TABLE IF NOT EXISTS test_definitions (
    id TEXT PRIMARY KEY,
    coach_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    metric_kind TEXT NOT NULL,
    tiers_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_test_definitions_coach_id ON test_definitions(coach_id);

-- Assignments table (no foreign key on test_id: definitions are hard-deleted and
-- assignments outlive them)
CREATE TABLE IF NOT EXISTS assignments (
    id TEXT PRIMARY KEY,
    test_id TEXT NOT NULL,
    group_code TEXT NOT NULL REFERENCES groups(code),
    coach_id TEXT NOT NULL,
    assigned_on TEXT NOT NULL,
    due_on TEXT NOT NULL,
    UNIQUE(test_id, group_code, due_on)
);

CREATE INDEX IF NOT EXISTS idx_assignments_coach_id ON assignments(coach_id);
CREATE INDEX IF NOT EXISTS idx_assignments_due_on ON assignments(due_on);

-- Assignment rosters table (snapshot of membership at assignment time)
CREATE TABLE IF NOT EXISTS assignment_rosters (
    assignment_id TEXT NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
    athlete_id TEXT NOT NULL,
    group_code TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (assignment_id, athlete_id)
);

CREATE INDEX IF NOT EXISTS idx_assignment_rosters_athlete ON assignment_rosters(athlete_id);

-- Results table
CREATE TABLE IF NOT EXISTS results (
    id TEXT PRIMARY KEY,
    assignment_id TEXT NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
    athlete_id TEXT NOT NULL,
    value REAL NOT NULL,
    recorded_on TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_results_assignment_athlete ON results(assignment_id, athlete_id);

-- Result comments table
CREATE TABLE IF NOT EXISTS result_comments (
    id TEXT PRIMARY KEY,
    result_id TEXT NOT NULL REFERENCES results(id) ON DELETE CASCADE,
    author_id TEXT NOT NULL,
    body TEXT NOT NULL,
    commented_on TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_result_comments_result_id ON result_comments(result_id);
CREATE INDEX IF NOT EXISTS idx_result_comments_commented_on ON result_comments(commented_on);
"#;

/// Version 2: one open membership per athlete and group.
///
/// Duplicate open rows left by racing joins are closed first, keeping the earliest.
pub const MIGRATION_V2: &str = r#"
UPDATE group_memberships
SET left_at = joined_at
WHERE left_at IS NULL
  AND rowid <> (
      SELECT m.rowid FROM group_memberships m
      WHERE m.group_code = group_memberships.group_code
        AND m.athlete_id = group_memberships.athlete_id
        AND m.left_at IS NULL
      ORDER BY m.joined_at ASC, m.rowid ASC
      LIMIT 1
  );

CREATE UNIQUE INDEX IF NOT EXISTS idx_group_memberships_current
    ON group_memberships(group_code, athlete_id)
    WHERE left_at IS NULL;
"#;

/// Schema version table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;
