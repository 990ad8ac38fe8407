//! Attribute conflicts between entities selected for merging.
//!
//! Conflicts are detected by the backend preview service when the same
//! attribute carries contradictory values across the selected entities
//! ("eye color: blue" vs "eye color: green"). The core never detects
//! conflicts itself; it aggregates and ranks what the backend supplies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// How serious an attribute conflict is.
///
/// High-severity conflicts (physical traits, identity facts) gate the
/// merge confirmation UI; lower severities are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Contradiction in a defining trait; merging loses information.
    High,
    /// Contradiction worth reviewing.
    Medium,
    /// Minor or low-confidence contradiction.
    Low,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// One contradictory value and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingValue {
    /// The attribute value as extracted.
    pub value: String,
    /// Entity that carries this value.
    pub source_entity_id: EntityId,
    /// Canonical name of that entity, for display.
    pub source_entity_name: String,
    /// Extraction confidence in [0, 1].
    pub confidence: f32,
}

/// A contradiction between attribute values of the selected entities.
///
/// Supplied by the backend preview endpoint; read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeConflict {
    /// Attribute category (physical, identity, ...).
    pub category: String,
    /// Name of the conflicting attribute.
    pub attribute_name: String,
    /// Severity assigned by the backend.
    pub severity: ConflictSeverity,
    /// Each contradictory value with its provenance.
    pub conflicting_values: Vec<ConflictingValue>,
}

impl AttributeConflict {
    /// Returns true if this conflict is high severity.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == ConflictSeverity::High
    }
}

/// Returns true iff at least one conflict is high severity.
///
/// An empty collection degrades to `false`: "no conflicts known yet",
/// not "no conflicts exist". The UI distinguishes pending analysis from
/// confirmed-clean through [`crate::report::AnalysisState`].
#[must_use]
pub fn has_critical_conflicts(conflicts: &[AttributeConflict]) -> bool {
    conflicts.iter().any(AttributeConflict::is_critical)
}

/// Returns the conflicts sorted high → medium → low, preserving the
/// backend's order within each severity.
#[must_use]
pub fn ranked_by_severity(conflicts: &[AttributeConflict]) -> Vec<AttributeConflict> {
    let mut ranked = conflicts.to_vec();
    ranked.sort_by_key(|c| c.severity);
    ranked
}
