//! # narrafuse - Entity-merge reconciliation for narrative tools
//!
//! narrafuse is the client-side decision core that turns "a set of
//! candidate entities the user selected" into "a validated, deterministic
//! merge plan": which entity survives, which are absorbed, what the
//! merged entity is called, and which aliases it keeps.
//!
//! ## Core Concepts
//!
//! - **Candidate pool**: every canonical name and alias across the
//!   selection, source-tagged and ordered
//! - **Name scoring**: a swappable heuristic proposes the default
//!   canonical name; the user always has the final word
//! - **Merge plan**: the pure, idempotent output consumed by the
//!   submission call
//! - **Merge report**: backend similarity and conflicts reconciled into
//!   a severity-ranked, display-ready structure
//!
//! ## Usage
//!
//! ```rust,ignore
//! use narrafuse::{MergeWizard, Entity, EntityType};
//!
//! let juan = Entity::new("Juan", EntityType::Character).with_alias("Juanito");
//! let moreno = Entity::new("el joven moreno", EntityType::Character);
//! let ids = [juan.id, moreno.id];
//!
//! let mut wizard = MergeWizard::new(vec![juan, moreno]);
//! wizard.preselect(ids);
//! wizard.proceed_to_naming()?;
//! let plan = wizard.proceed_to_review()?;
//! ```
//!
//! The three pipeline stages ([`collect`], [`select_default`],
//! [`MergePlanBuilder`]) are pure functions and can be used directly
//! without the wizard.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod candidate;
pub mod conflict;
pub mod entity;
pub mod error;
pub mod similarity;

// Pipeline stages
pub mod plan;
pub mod report;
pub mod scorer;

// Flow and boundary
pub mod service;
pub mod wizard;

// Re-export primary types at crate root for convenience
pub use candidate::{collect, CandidateName};
pub use conflict::{AttributeConflict, ConflictSeverity, ConflictingValue};
pub use entity::{Entity, EntityId, EntityType};
pub use error::{BackendError, FuseError, FuseResult, SubmissionError, ValidationError};
pub use plan::{MergePlan, MergePlanBuilder, MergeSelection};
pub use report::{AnalysisState, MergeReport, PairAssessment};
pub use scorer::{select_default, NameScorer, SpanishNameScorer};
pub use service::{
    AttributeResolution, MergeBackend, MergeHistoryEntry, MergeId, MergeOutcome, MergePreview,
    MergeRequest, MergedPreview, SimilarityReport, UndoOutcome,
};
pub use similarity::{
    NameSimilarity, Recommendation, SimilarityPair, Verdict, COMPATIBLE_THRESHOLD,
    REVIEW_THRESHOLD,
};
pub use wizard::{MergeWizard, WizardState};

#[cfg(feature = "http-client")]
pub use service::HttpBackend;
