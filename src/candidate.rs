//! Candidate name collection.
//!
//! The first stage of the merge-planning pipeline: gather every canonical
//! name and alias across the selected entities into one flat,
//! source-tagged pool. Provenance is kept per name, so the same string
//! contributed by two entities yields two candidates; output alias lists
//! deduplicate later, the pool never does.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityType};

/// One name contributed by one selected entity.
///
/// Derived, not persisted. For a fixed source entity exactly one
/// candidate has `is_canonical = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateName {
    /// The name string, verbatim.
    pub value: String,

    /// Entity that contributed this name.
    pub source_entity_id: EntityId,

    /// Type of the contributing entity.
    pub source_entity_type: EntityType,

    /// Canonical name of the contributing entity, for the conflict view.
    pub source_entity_name: String,

    /// True when `value` is the contributing entity's canonical name.
    pub is_canonical: bool,
}

/// Collects the candidate name pool from the selected entities.
///
/// Ordering guarantee: canonical names sort before aliases, and within
/// each group longer strings (by code-point count) sort before shorter
/// ones. Ties keep the input entity order. The ordering biases the
/// default-name suggestion toward substantial, canonical names without a
/// second pass, and later stages rely on it for tie-breaking.
///
/// Collecting from zero or one entity returns the (possibly empty) pool
/// without error; the caller gates the merge flow on having at least two
/// entities selected.
///
/// # Examples
///
/// ```
/// use narrafuse::{collect, Entity, EntityType};
///
/// let juan = Entity::new("Juan", EntityType::Character).with_alias("Juanito");
/// let pool = collect(&[juan]);
/// assert_eq!(pool.len(), 2);
/// assert!(pool[0].is_canonical);
/// ```
#[must_use]
pub fn collect(entities: &[Entity]) -> Vec<CandidateName> {
    let mut pool: Vec<CandidateName> = Vec::new();

    for entity in entities {
        pool.push(CandidateName {
            value: entity.canonical_name.clone(),
            source_entity_id: entity.id,
            source_entity_type: entity.entity_type,
            source_entity_name: entity.canonical_name.clone(),
            is_canonical: true,
        });
        for alias in &entity.aliases {
            pool.push(CandidateName {
                value: alias.clone(),
                source_entity_id: entity.id,
                source_entity_type: entity.entity_type,
                source_entity_name: entity.canonical_name.clone(),
                is_canonical: false,
            });
        }
    }

    // Stable sort: ties preserve the per-entity emission order above.
    pool.sort_by_key(|c| (!c.is_canonical, Reverse(c.value.chars().count())));
    pool
}
