//! Result classification against coach-defined tiers.
//!
//! Tiers are taken exactly as authored: no sorting, no overlap or gap repair. The
//! first tier in list order whose inclusive range contains the value wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Tier;

/// Label shown for a valid value no tier covers.
pub const OUT_OF_RANGE: &str = "out of range";

/// Outcome of classifying a well-formed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "label", rename_all = "snake_case")]
pub enum Classification {
    /// The value fell in the tier with this label.
    Tier(String),
    /// The value is valid but below, above or between all tiers.
    OutOfRange,
}

impl Classification {
    /// Tier label, or [`OUT_OF_RANGE`].
    pub fn label(&self) -> &str {
        match self {
            Classification::Tier(label) => label,
            Classification::OutOfRange => OUT_OF_RANGE,
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Classification::OutOfRange)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `value` against `tiers`.
///
/// Returns `None` for NaN or infinite values; such results are left unclassified
/// rather than reported as out of range.
pub fn classify(value: f64, tiers: &[Tier]) -> Option<Classification> {
    if !value.is_finite() {
        return None;
    }

    let classification = tiers
        .iter()
        .find(|tier| tier.contains(value))
        .map(|tier| Classification::Tier(tier.label.clone()))
        .unwrap_or(Classification::OutOfRange);

    Some(classification)
}

/// Classify a raw, user-entered value.
///
/// Blank or non-numeric input yields `None`.
pub fn classify_text(raw: &str, tiers: &[Tier]) -> Option<Classification> {
    let value: f64 = raw.trim().parse().ok()?;
    classify(value, tiers)
}
