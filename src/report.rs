//! Merge report—the display-ready reconciliation of backend analysis.
//!
//! Unlike the plan, which is the minimal merge instruction, the report
//! carries everything the review step renders: each similarity pair with
//! its verdict, conflicts ranked by severity, the aggregate
//! recommendation with its reason, and whether any of this is known yet
//! at all.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conflict::{has_critical_conflicts, ranked_by_severity, AttributeConflict};
use crate::entity::{Entity, EntityType};
use crate::similarity::{
    Recommendation, SimilarityPair, Verdict, COMPATIBLE_THRESHOLD, REVIEW_THRESHOLD,
};

/// Whether backend analysis has been reconciled into the report.
///
/// `Pending` is the advisory "not yet analyzed" state: the analysis
/// fetch has not completed (or failed and was degraded). It must render
/// as unknown, never as confirmed-clean, and it never blocks the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    /// Similarity/conflict data not yet known.
    Pending,
    /// Backend analysis received and reconciled.
    Analyzed,
}

/// One similarity pair together with its display band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAssessment {
    /// The pair as returned by the backend.
    pub pair: SimilarityPair,
    /// Band the pair classifies into.
    pub verdict: Verdict,
}

/// The reconciled, severity-ranked analysis for the review step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Whether the analysis below is real or still pending.
    pub analysis: AnalysisState,

    /// Assessed similarity pairs, in backend order.
    pub pairs: Vec<PairAssessment>,

    /// Mean combined score across pairs; 0.0 when no pairs are known.
    pub average_score: f32,

    /// Conflicts sorted high → medium → low.
    pub conflicts: Vec<AttributeConflict>,

    /// Number of known conflicts.
    pub conflict_count: usize,

    /// True iff at least one known conflict is high severity.
    pub has_critical_conflicts: bool,

    /// Aggregate recommendation for the whole selection.
    pub recommendation: Recommendation,

    /// Human-readable reason behind the recommendation.
    pub recommendation_reason: String,

    /// Mention-weighted dominant type across the selection, suggested
    /// for the merged entity.
    pub suggested_type: Option<EntityType>,

    /// The backend's suggested canonical name, surfaced for reference.
    /// The client heuristic still computes the pre-selected default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_suggested_name: Option<String>,
}

impl MergeReport {
    /// Creates the "not yet analyzed" report.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            analysis: AnalysisState::Pending,
            pairs: Vec::new(),
            average_score: 0.0,
            conflicts: Vec::new(),
            conflict_count: 0,
            has_critical_conflicts: false,
            recommendation: Recommendation::Review,
            recommendation_reason: "Similarity analysis not yet available".to_string(),
            suggested_type: None,
            backend_suggested_name: None,
        }
    }

    /// Reconciles backend analysis into a display-ready report.
    ///
    /// Tolerates empty `pairs` and `conflicts`; the aggregates degrade
    /// to zero rather than erroring.
    #[must_use]
    pub fn reconcile(
        entities: &[Entity],
        pairs: &[SimilarityPair],
        conflicts: &[AttributeConflict],
    ) -> Self {
        let assessed: Vec<PairAssessment> = pairs
            .iter()
            .map(|pair| PairAssessment {
                pair: pair.clone(),
                verdict: pair.verdict(),
            })
            .collect();

        let average_score = if pairs.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = pairs.len() as f32;
            pairs.iter().map(|p| p.combined_score).sum::<f32>() / count
        };

        let critical = has_critical_conflicts(conflicts);
        let (recommendation, recommendation_reason) = overall_recommendation(average_score, critical);

        if critical {
            info!(
                conflicts = conflicts.len(),
                "merge selection has critical attribute conflicts"
            );
        }

        Self {
            analysis: AnalysisState::Analyzed,
            pairs: assessed,
            average_score,
            conflicts: ranked_by_severity(conflicts),
            conflict_count: conflicts.len(),
            has_critical_conflicts: critical,
            recommendation,
            recommendation_reason,
            suggested_type: dominant_type(entities),
            backend_suggested_name: None,
        }
    }

    /// Attaches the backend's suggested canonical name for reference.
    #[must_use]
    pub fn with_backend_suggested_name(mut self, name: impl Into<String>) -> Self {
        self.backend_suggested_name = Some(name.into());
        self
    }

    /// Returns true while analysis is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.analysis == AnalysisState::Pending
    }
}

/// Derives the aggregate recommendation from the average combined score
/// and the presence of critical conflicts.
fn overall_recommendation(average_score: f32, has_critical: bool) -> (Recommendation, String) {
    if average_score >= COMPATIBLE_THRESHOLD && !has_critical {
        (
            Recommendation::Merge,
            "High similarity with no significant conflicts".to_string(),
        )
    } else if average_score >= REVIEW_THRESHOLD {
        let reason = if has_critical {
            "Acceptable similarity but attribute conflicts require review"
        } else {
            "Medium similarity, review before merging"
        };
        (Recommendation::Review, reason.to_string())
    } else {
        (
            Recommendation::KeepSeparate,
            "Low similarity, the entities may be different".to_string(),
        )
    }
}

/// Picks the mention-weighted dominant entity type.
///
/// Ties keep the earliest type in entity order, so the result is
/// deterministic regardless of map iteration order.
fn dominant_type(entities: &[Entity]) -> Option<EntityType> {
    let mut totals: Vec<(EntityType, u64)> = Vec::new();
    for entity in entities {
        // Entities with zero mentions still vote, with weight one.
        let weight = entity.mention_count.max(1);
        match totals.iter_mut().find(|(t, _)| *t == entity.entity_type) {
            Some((_, total)) => *total += weight,
            None => totals.push((entity.entity_type, weight)),
        }
    }
    totals
        .into_iter()
        .max_by_key(|(_, total)| *total)
        .map(|(entity_type, _)| entity_type)
}
