//! Backend service contracts.
//!
//! The similarity, preview-merge, merge-submission, and undo services
//! live in the backend; this module defines the trait the core calls
//! them through, the canonical DTOs, and the normalization layer that
//! maps every historical response shape into those DTOs. Implementations
//! are pluggable: an HTTP client ships behind the `http-client` feature,
//! tests use in-memory fakes.

mod normalize;

#[cfg(feature = "http-client")]
mod http;

pub use normalize::{
    attribute_conflict_from_value, merge_history_entry_from_value, merge_preview_from_value,
    similarity_pair_from_value, similarity_report_from_value, undo_outcome_from_value,
};

#[cfg(feature = "http-client")]
pub use http::HttpBackend;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::AttributeConflict;
use crate::entity::{EntityId, EntityType};
use crate::error::{BackendError, SubmissionError};
use crate::plan::MergePlan;
use crate::similarity::{Recommendation, SimilarityPair};

/// Identifier of a recorded merge, used to reverse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeId(Uuid);

impl MergeId {
    /// Creates a new random merge ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a merge ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MergeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MergeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pairwise similarity for a selection, with the backend's aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// One pair per unordered combination of selected entities.
    pub pairs: Vec<SimilarityPair>,
    /// Mean combined score as computed by the backend.
    pub average_score: f32,
    /// Overall recommendation, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// The backend's preview of what the merged entity would look like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPreview {
    /// Canonical name the backend suggests.
    pub suggested_canonical_name: String,
    /// Alias list the backend suggests.
    pub suggested_aliases: Vec<String>,
    /// Dominant entity type the backend suggests.
    pub suggested_type: Option<EntityType>,
    /// Total mentions as counted by the backend.
    pub total_mentions: u64,
}

/// Full response of the preview-merge service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePreview {
    /// Pairwise similarity analysis.
    pub similarity: SimilarityReport,
    /// Preview of the merged entity.
    pub merged_preview: MergedPreview,
    /// Detected attribute conflicts.
    pub conflicts: Vec<AttributeConflict>,
    /// Number of conflicts.
    pub conflict_count: usize,
    /// True iff any conflict is high severity.
    pub has_critical_conflicts: bool,
    /// Overall recommendation.
    pub recommendation: Recommendation,
    /// Reason behind the recommendation.
    pub recommendation_reason: String,
}

/// Resolution of one attribute conflict, chosen by the user in the
/// conflict view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeResolution {
    /// The conflicting attribute.
    pub attribute_name: String,
    /// The value to keep on the merged entity.
    pub chosen_value: String,
}

/// The merge submission payload.
///
/// Carries entity ids and attribute resolutions only. The client-side
/// canonical name and alias list are display-only preview data; the
/// backend recomputes naming from its own records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Entity that survives the merge.
    pub primary_entity_id: EntityId,
    /// Every selected entity, primary included; the backend skips the
    /// primary while absorbing.
    pub entity_ids: Vec<EntityId>,
    /// Conflict resolutions to apply after absorbing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_resolutions: Vec<AttributeResolution>,
}

impl MergeRequest {
    /// Builds the submission payload from a finished plan.
    #[must_use]
    pub fn from_plan(plan: &MergePlan) -> Self {
        let mut entity_ids = Vec::with_capacity(plan.absorbed_entity_ids.len() + 1);
        entity_ids.push(plan.primary_entity_id);
        entity_ids.extend(plan.absorbed_entity_ids.iter().copied());
        Self {
            primary_entity_id: plan.primary_entity_id,
            entity_ids,
            attribute_resolutions: Vec::new(),
        }
    }

    /// Attaches conflict resolutions chosen in the review step.
    #[must_use]
    pub fn with_resolutions(mut self, resolutions: Vec<AttributeResolution>) -> Self {
        self.attribute_resolutions = resolutions;
        self
    }
}

/// Result of a confirmed merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// The surviving entity.
    pub primary_entity_id: EntityId,
    /// How many entities were absorbed.
    pub merged_count: usize,
    /// The absorbed entity ids.
    pub merged_entity_ids: Vec<EntityId>,
}

/// One recorded merge, as listed by the history service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeHistoryEntry {
    /// Identifier used to undo this merge.
    pub id: MergeId,
    /// The surviving entity.
    pub primary_entity_id: EntityId,
    /// Entities that were absorbed.
    pub source_entity_ids: Vec<EntityId>,
    /// When the merge was performed.
    pub merged_at: DateTime<Utc>,
    /// Who triggered the merge.
    pub merged_by: String,
}

/// Result of reversing a recorded merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoOutcome {
    /// Entities restored by the undo.
    pub restored_entity_ids: Vec<EntityId>,
    /// Backend message, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The backend services the merge flow talks to.
///
/// All calls are synchronous from the caller's perspective: one request,
/// one response. Timeouts and retries belong to implementations, never
/// to the core. Implementations must be shareable across a UI event
/// loop, hence `Send + Sync`.
pub trait MergeBackend: Send + Sync {
    /// Pairwise similarity for the given entities.
    fn similarity(&self, entity_ids: &[EntityId]) -> Result<SimilarityReport, BackendError>;

    /// Rich merge preview: similarity, merged-entity preview, and
    /// attribute conflicts.
    fn preview_merge(&self, entity_ids: &[EntityId]) -> Result<MergePreview, BackendError>;

    /// Submits a merge for destructive, undoable execution.
    fn submit_merge(&self, request: &MergeRequest) -> Result<MergeOutcome, SubmissionError>;

    /// Lists recorded merges, newest first.
    fn merge_history(&self) -> Result<Vec<MergeHistoryEntry>, BackendError>;

    /// Reverses a previously recorded merge.
    fn undo_merge(&self, merge_id: MergeId) -> Result<UndoOutcome, BackendError>;
}
