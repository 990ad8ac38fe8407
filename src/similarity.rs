//! Similarity pairs and their display classification.
//!
//! Pairwise lexical + semantic scores are computed by the backend
//! similarity service; this module only defines the canonical shape they
//! are normalized into and the fixed rules that classify each pair into a
//! display band. The thresholds are a documented contract, not inferred.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Pairs scoring at or above this combined score display as "compatible".
pub const COMPATIBLE_THRESHOLD: f32 = 0.6;

/// Pairs scoring at or above this (and below
/// [`COMPATIBLE_THRESHOLD`]) display as "review"; below it, "different".
pub const REVIEW_THRESHOLD: f32 = 0.4;

/// Lexical name-similarity metrics for one entity pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NameSimilarity {
    /// Normalized Levenshtein ratio in [0, 1].
    pub levenshtein: f32,
    /// Jaro-Winkler similarity in [0, 1].
    pub jaro_winkler: f32,
    /// Containment ratio: shorter-name length over longer-name length
    /// when one name contains the other, else 0.
    pub containment: f32,
}

/// The backend's merge recommendation for a pair or for the whole
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// The entities look like the same thing; merging is safe.
    Merge,
    /// Ambiguous; a human should look before merging.
    Review,
    /// The entities look distinct.
    KeepSeparate,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Review => write!(f, "review"),
            Self::KeepSeparate => write!(f, "keep_separate"),
        }
    }
}

/// Similarity between one unordered pair of selected entities, as
/// returned by the backend (one per C(n,2) combination).
///
/// Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    /// First entity of the pair.
    pub entity_a: EntityId,
    /// Second entity of the pair.
    pub entity_b: EntityId,
    /// Lexical name metrics.
    pub name: NameSimilarity,
    /// Embedding-based semantic similarity in [0, 1].
    pub semantic: f32,
    /// Weighted combination of lexical and semantic scores, in [0, 1].
    pub combined_score: f32,
    /// Backend recommendation label, when supplied. Allowed to disagree
    /// with the numeric score; the label wins for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Display band for a similarity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// High similarity; the pair is a good merge.
    Compatible,
    /// Mid similarity; worth a second look.
    Review,
    /// Low similarity; likely distinct entities.
    Different,
}

impl Verdict {
    /// Classifies a combined score against the fixed thresholds.
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score >= COMPATIBLE_THRESHOLD {
            Self::Compatible
        } else if score >= REVIEW_THRESHOLD {
            Self::Review
        } else {
            Self::Different
        }
    }
}

impl From<Recommendation> for Verdict {
    fn from(recommendation: Recommendation) -> Self {
        match recommendation {
            Recommendation::Merge => Self::Compatible,
            Recommendation::Review => Self::Review,
            Recommendation::KeepSeparate => Self::Different,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => write!(f, "compatible"),
            Self::Review => write!(f, "review"),
            Self::Different => write!(f, "different"),
        }
    }
}

impl SimilarityPair {
    /// Returns the display band for this pair.
    ///
    /// A supplied recommendation label takes precedence over the numeric
    /// thresholds; the two sources may disagree.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.recommendation
            .map_or_else(|| Verdict::from_score(self.combined_score), Verdict::from)
    }
}
