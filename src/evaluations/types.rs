//! Test definition type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::tiers::{classify, Classification};

/// What a test measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Distance covered (e.g. meters in a 12-minute run)
    Distance,
    /// Elapsed time
    Time,
    /// Load lifted for a number of repetitions
    WeightReps,
    /// Repetition count
    Reps,
    /// Anything else the coach defines
    Custom,
}

impl MetricKind {
    /// Storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Distance => "distance",
            MetricKind::Time => "time",
            MetricKind::WeightReps => "weight_reps",
            MetricKind::Reps => "reps",
            MetricKind::Custom => "custom",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Distance => write!(f, "Distance"),
            MetricKind::Time => write!(f, "Time"),
            MetricKind::WeightReps => write!(f, "Weight x Reps"),
            MetricKind::Reps => write!(f, "Reps"),
            MetricKind::Custom => write!(f, "Custom"),
        }
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(MetricKind::Distance),
            "time" => Ok(MetricKind::Time),
            "weight_reps" => Ok(MetricKind::WeightReps),
            "reps" => Ok(MetricKind::Reps),
            "custom" => Ok(MetricKind::Custom),
            other => Err(format!("unknown metric kind: {other}")),
        }
    }
}

/// A labeled, inclusive numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl Tier {
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }

    /// Whether `value` lies in `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// A standardized test a coach can assign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Unique identifier
    pub id: Uuid,
    /// Coach who owns the definition
    pub coach_id: Uuid,
    /// Display name
    pub name: String,
    /// Optional instructions
    pub description: Option<String>,
    /// What the result value measures
    pub metric_kind: MetricKind,
    /// Tiers in coach-authored order
    pub tiers: Vec<Tier>,
    /// When the definition was created
    pub created_at: DateTime<Utc>,
}

impl TestDefinition {
    /// Create a new test definition with no tiers.
    pub fn new(coach_id: Uuid, name: impl Into<String>, metric_kind: MetricKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            coach_id,
            name: name.into(),
            description: None,
            metric_kind,
            tiers: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a tier.
    pub fn with_tier(mut self, label: impl Into<String>, min: f64, max: f64) -> Self {
        self.tiers.push(Tier::new(label, min, max));
        self
    }

    /// Classify a result value against this definition's tiers.
    pub fn classify(&self, value: f64) -> Option<Classification> {
        classify(value, &self.tiers)
    }
}
