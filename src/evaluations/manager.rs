//! Test definition storage.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{MetricKind, TestDefinition, Tier};
use crate::storage::database::{format_timestamp, timestamp_column, uuid_column};

/// Manager for coach-owned test definitions.
pub struct TestDefinitionManager<'a> {
    conn: &'a Connection,
}

impl<'a> TestDefinitionManager<'a> {
    /// Create a new test definition manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Store a new test definition.
    pub fn create(&self, definition: &TestDefinition) -> Result<(), EvaluationError> {
        validate(definition)?;

        self.conn.execute(
            "INSERT INTO test_definitions
             (id, coach_id, name, description, metric_kind, tiers_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                definition.id.to_string(),
                definition.coach_id.to_string(),
                definition.name.trim(),
                definition.description,
                definition.metric_kind.as_str(),
                serde_json::to_string(&definition.tiers)?,
                format_timestamp(&definition.created_at),
            ],
        )?;

        tracing::info!(test_id = %definition.id, tiers = definition.tiers.len(), "Created test definition");
        Ok(())
    }

    /// Get a test definition by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<TestDefinition>, EvaluationError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, coach_id, name, description, metric_kind, tiers_json, created_at
                 FROM test_definitions WHERE id = ?1",
                params![id.to_string()],
                parse_definition_row,
            )
            .optional()?;

        row.map(DefinitionRow::into_definition).transpose()
    }

    /// Get a test definition, failing with [`EvaluationError::NotFound`] if it is gone.
    pub fn require(&self, id: Uuid) -> Result<TestDefinition, EvaluationError> {
        self.get(id)?.ok_or(EvaluationError::NotFound(id))
    }

    /// All definitions owned by a coach, by name.
    pub fn list_for_coach(&self, coach_id: Uuid) -> Result<Vec<TestDefinition>, EvaluationError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, coach_id, name, description, metric_kind, tiers_json, created_at
             FROM test_definitions
             WHERE coach_id = ?1
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let rows = stmt.query_map(params![coach_id.to_string()], parse_definition_row)?;

        rows.map(|row| row.map_err(EvaluationError::from)?.into_definition())
            .collect()
    }

    /// Hard-delete a definition owned by `coach_id`.
    ///
    /// Assignments keep referencing the deleted id; reads that need the definition
    /// report it as missing.
    pub fn delete(&self, coach_id: Uuid, id: Uuid) -> Result<bool, EvaluationError> {
        let deleted = self.conn.execute(
            "DELETE FROM test_definitions WHERE id = ?1 AND coach_id = ?2",
            params![id.to_string(), coach_id.to_string()],
        )?;

        if deleted > 0 {
            tracing::info!(test_id = %id, "Deleted test definition");
        }
        Ok(deleted > 0)
    }
}

/// Raw row before JSON and enum decoding.
struct DefinitionRow {
    id: Uuid,
    coach_id: Uuid,
    name: String,
    description: Option<String>,
    metric_kind: String,
    tiers_json: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl DefinitionRow {
    fn into_definition(self) -> Result<TestDefinition, EvaluationError> {
        let metric_kind: MetricKind = self
            .metric_kind
            .parse()
            .map_err(EvaluationError::Corrupt)?;
        let tiers: Vec<Tier> = serde_json::from_str(&self.tiers_json)?;

        Ok(TestDefinition {
            id: self.id,
            coach_id: self.coach_id,
            name: self.name,
            description: self.description,
            metric_kind,
            tiers,
            created_at: self.created_at,
        })
    }
}

fn parse_definition_row(row: &rusqlite::Row) -> rusqlite::Result<DefinitionRow> {
    Ok(DefinitionRow {
        id: uuid_column(row, 0)?,
        coach_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        metric_kind: row.get(4)?,
        tiers_json: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

/// Check a definition before it is stored.
///
/// Only per-tier shape is checked; order, gaps and overlaps are the coach's call.
pub fn validate(definition: &TestDefinition) -> Result<(), EvaluationError> {
    if definition.name.trim().is_empty() {
        return Err(EvaluationError::Validation("Test name is required".to_string()));
    }

    for (index, tier) in definition.tiers.iter().enumerate() {
        if tier.label.trim().is_empty() {
            return Err(EvaluationError::Validation(format!(
                "Tier {} has no label",
                index + 1
            )));
        }
        if !tier.min.is_finite() || !tier.max.is_finite() {
            return Err(EvaluationError::Validation(format!(
                "Tier '{}' has a non-numeric bound",
                tier.label
            )));
        }
        if tier.min > tier.max {
            return Err(EvaluationError::Validation(format!(
                "Tier '{}' has min {} above max {}",
                tier.label, tier.min, tier.max
            )));
        }
    }

    Ok(())
}

/// Test definition errors.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Corrupt test definition: {0}")]
    Corrupt(String),

    #[error("Test definition not found: {0}")]
    NotFound(Uuid),
}
