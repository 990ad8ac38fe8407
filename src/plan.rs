//! Merge selection and plan building.
//!
//! The final stage of the pipeline: given the user's selection and chosen
//! primary name, derive the deterministic merge plan that will be
//! submitted for the destructive (but undoable) backend mutation. The
//! builder is a pure function of its inputs; the UI recomputes the plan
//! preview on every selection or naming change and must get the same
//! plan for the same inputs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::CandidateName;
use crate::conflict::{has_critical_conflicts, AttributeConflict};
use crate::entity::{Entity, EntityId};
use crate::error::ValidationError;

/// The user's in-progress merge selection.
///
/// Created when the merge dialog opens (optionally pre-seeded), mutated
/// as entities are (de)selected, reset when the dialog closes or a merge
/// completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSelection {
    /// Selected entity ids, in selection order, without duplicates.
    pub selected: Vec<EntityId>,

    /// The chosen canonical name for the merged entity, once picked.
    pub primary_name: Option<String>,
}

impl MergeSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selection pre-seeded with entity ids.
    #[must_use]
    pub fn with_entities(ids: impl IntoIterator<Item = EntityId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            selection.select(id);
        }
        selection
    }

    /// Adds an entity to the selection; duplicates are ignored.
    pub fn select(&mut self, id: EntityId) {
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    /// Removes an entity from the selection.
    pub fn deselect(&mut self, id: EntityId) {
        self.selected.retain(|selected| *selected != id);
    }

    /// Toggles an entity in or out of the selection.
    pub fn toggle(&mut self, id: EntityId) {
        if self.selected.contains(&id) {
            self.deselect(id);
        } else {
            self.select(id);
        }
    }

    /// Returns true if `id` is selected.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of selected entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns true when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Sets the chosen primary name.
    pub fn set_primary_name(&mut self, name: impl Into<String>) {
        self.primary_name = Some(name.into());
    }

    /// Clears everything, returning the selection to its initial state.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.primary_name = None;
    }
}

/// The validated, deterministic merge instruction.
///
/// Consumed by the merge submission call and disposed when the dialog
/// closes; never persisted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    /// Entity that survives the merge.
    pub primary_entity_id: EntityId,

    /// Entities absorbed into the primary, in selection order.
    pub absorbed_entity_ids: Vec<EntityId>,

    /// The chosen canonical name, verbatim (no normalization), so
    /// punctuation and diacritics survive exactly as selected.
    pub canonical_name: String,

    /// Every other name across the selection, exact-string deduplicated,
    /// first-seen order per the collector's ordering. Never contains
    /// `canonical_name`.
    pub aliases: Vec<String>,

    /// Sum of mention counts across the selection. A display preview
    /// only: the backend recomputes the authoritative count from raw
    /// mention records after the merge.
    pub total_mention_count: u64,

    /// Number of attribute conflicts known so far. Zero may mean "not
    /// yet analyzed".
    pub conflict_count: usize,

    /// True iff at least one known conflict is high severity.
    pub has_critical_conflicts: bool,
}

/// Builder for [`MergePlan`].
///
/// # Example
/// ```rust,ignore
/// let plan = MergePlanBuilder::new()
///     .selection(&selection)
///     .entities(&entities)
///     .candidates(&candidates)
///     .conflicts(&conflicts)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MergePlanBuilder<'a> {
    selection: Option<&'a MergeSelection>,
    entities: &'a [Entity],
    candidates: &'a [CandidateName],
    conflicts: &'a [AttributeConflict],
}

impl<'a> MergePlanBuilder<'a> {
    /// Creates a new builder with empty inputs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selection: None,
            entities: &[],
            candidates: &[],
            conflicts: &[],
        }
    }

    /// The user's selection, including the chosen primary name.
    #[must_use]
    pub fn selection(mut self, selection: &'a MergeSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// The selected entities (mention counts are read from these).
    #[must_use]
    pub fn entities(mut self, entities: &'a [Entity]) -> Self {
        self.entities = entities;
        self
    }

    /// The candidate pool collected from the selection.
    #[must_use]
    pub fn candidates(mut self, candidates: &'a [CandidateName]) -> Self {
        self.candidates = candidates;
        self
    }

    /// Attribute conflicts from the backend preview; empty means "not
    /// yet analyzed" and never errors.
    #[must_use]
    pub fn conflicts(mut self, conflicts: &'a [AttributeConflict]) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Builds the merge plan.
    ///
    /// Returns `ValidationError` if:
    /// - no primary name has been chosen
    /// - the primary name does not match any candidate in the current
    ///   selection (stale state after a selection change)
    pub fn build(self) -> Result<MergePlan, ValidationError> {
        let selection = self.selection.ok_or(ValidationError::MissingPrimaryName)?;
        let primary_name = selection
            .primary_name
            .as_deref()
            .ok_or(ValidationError::MissingPrimaryName)?;

        // Collector order puts canonical owners first, so when several
        // entities contributed the same string the canonical owner wins.
        let primary_entity_id = self
            .candidates
            .iter()
            .find(|c| c.value == primary_name)
            .map(|c| c.source_entity_id)
            .ok_or_else(|| ValidationError::PrimaryNameNotInSelection {
                name: primary_name.to_string(),
            })?;

        let absorbed_entity_ids: Vec<EntityId> = selection
            .selected
            .iter()
            .copied()
            .filter(|id| *id != primary_entity_id)
            .collect();

        let mut aliases: Vec<String> = Vec::new();
        for candidate in self.candidates {
            if candidate.value != primary_name && !aliases.contains(&candidate.value) {
                aliases.push(candidate.value.clone());
            }
        }

        let total_mention_count = selection
            .selected
            .iter()
            .filter_map(|id| self.entities.iter().find(|e| e.id == *id))
            .map(|e| e.mention_count)
            .sum();

        let plan = MergePlan {
            primary_entity_id,
            absorbed_entity_ids,
            canonical_name: primary_name.to_string(),
            aliases,
            total_mention_count,
            conflict_count: self.conflicts.len(),
            has_critical_conflicts: has_critical_conflicts(self.conflicts),
        };

        debug!(
            primary = %plan.primary_entity_id,
            absorbed = plan.absorbed_entity_ids.len(),
            aliases = plan.aliases.len(),
            conflicts = plan.conflict_count,
            "merge plan built"
        );

        Ok(plan)
    }
}
