//! Merge wizard state machine.
//!
//! Drives the selection → naming → review → submission flow and owns the
//! mutable state the pure core stages are re-invoked over. The wizard
//! performs no I/O of its own: analysis data is attached by the caller
//! (or pulled through a [`MergeBackend`] the caller hands in), and a
//! selection change discards whatever analysis was attached before, so a
//! stale response can never describe the current selection.

use std::fmt;

use tracing::{debug, info, warn};

use crate::candidate::{collect, CandidateName};
use crate::conflict::AttributeConflict;
use crate::entity::{Entity, EntityId};
use crate::error::{FuseError, FuseResult, SubmissionError, ValidationError};
use crate::plan::{MergePlan, MergePlanBuilder, MergeSelection};
use crate::report::{AnalysisState, MergeReport};
use crate::scorer::{select_default, NameScorer, SpanishNameScorer};
use crate::service::{MergeBackend, MergeOutcome, MergeRequest};
use crate::similarity::SimilarityPair;

/// Steps of the merge wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardState {
    /// Picking which entities to merge.
    SelectingEntities,
    /// Picking the canonical name for the merged entity.
    SelectingPrimaryName,
    /// Reviewing the plan, analysis, and conflicts.
    ReviewingPlan,
    /// Merge request handed off to the backend.
    Submitting,
    /// Merge confirmed; selection and plan disposed.
    Succeeded,
    /// Submission failed; selection and plan preserved for retry.
    Failed,
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectingEntities => write!(f, "selecting_entities"),
            Self::SelectingPrimaryName => write!(f, "selecting_primary_name"),
            Self::ReviewingPlan => write!(f, "reviewing_plan"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The merge dialog's state holder.
///
/// All methods are synchronous and cheap; the UI re-invokes them on
/// every relevant change and renders from the accessors.
pub struct MergeWizard {
    entities: Vec<Entity>,
    scorer: Box<dyn NameScorer>,
    selection: MergeSelection,
    candidates: Vec<CandidateName>,
    pairs: Vec<SimilarityPair>,
    conflicts: Vec<AttributeConflict>,
    report: MergeReport,
    plan: Option<MergePlan>,
    state: WizardState,
    last_error: Option<String>,
}

impl MergeWizard {
    /// Creates a wizard over the project's entity list, with the
    /// Spanish proper-name scorer.
    #[must_use]
    pub fn new(entities: Vec<Entity>) -> Self {
        Self::with_scorer(entities, Box::new(SpanishNameScorer))
    }

    /// Creates a wizard with a custom name scorer.
    #[must_use]
    pub fn with_scorer(entities: Vec<Entity>, scorer: Box<dyn NameScorer>) -> Self {
        Self {
            entities,
            scorer,
            selection: MergeSelection::new(),
            candidates: Vec::new(),
            pairs: Vec::new(),
            conflicts: Vec::new(),
            report: MergeReport::pending(),
            plan: None,
            state: WizardState::SelectingEntities,
            last_error: None,
        }
    }

    /// Current wizard step.
    #[must_use]
    pub fn state(&self) -> WizardState {
        self.state
    }

    /// The user's selection.
    #[must_use]
    pub fn selection(&self) -> &MergeSelection {
        &self.selection
    }

    /// The candidate pool collected at the naming step.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateName] {
        &self.candidates
    }

    /// The reconciled analysis report.
    #[must_use]
    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    /// The current plan, once the review step is reached.
    #[must_use]
    pub fn plan(&self) -> Option<&MergePlan> {
        self.plan.as_ref()
    }

    /// Message of the last submission failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Selected entities, in selection order.
    #[must_use]
    pub fn selected_entities(&self) -> Vec<&Entity> {
        self.selection
            .selected
            .iter()
            .filter_map(|id| self.entities.iter().find(|e| e.id == *id))
            .collect()
    }

    /// Pre-seeds the selection, ignoring unknown ids.
    pub fn preselect(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            if self.entities.iter().any(|e| e.id == id) {
                self.selection.select(id);
            } else {
                debug!(%id, "ignoring preselected id not in entity list");
            }
        }
        self.invalidate_analysis();
    }

    /// Toggles an entity in or out of the selection.
    ///
    /// Any previously attached analysis describes the old selection and
    /// is discarded.
    pub fn toggle_entity(&mut self, id: EntityId) {
        self.selection.toggle(id);
        self.invalidate_analysis();
    }

    /// Overrides the primary name before (or after) reviewing.
    pub fn set_primary_name(&mut self, name: impl Into<String>) {
        self.selection.set_primary_name(name);
    }

    /// Advances to the naming step.
    ///
    /// Requires at least two selected entities. Recollects the candidate
    /// pool and pre-selects the scorer's default name unless the user's
    /// earlier choice is still valid.
    pub fn proceed_to_naming(&mut self) -> Result<(), ValidationError> {
        let count = self.selection.len();
        if count < 2 {
            return Err(ValidationError::TooFewEntities { count });
        }

        let selected = self.owned_selected_entities();
        self.candidates = collect(&selected);

        let keep_current = self
            .selection
            .primary_name
            .as_ref()
            .is_some_and(|name| self.candidates.iter().any(|c| c.value == *name));
        if !keep_current {
            self.selection.primary_name =
                select_default(&self.candidates, self.scorer.as_ref())
                    .map(|candidate| candidate.value.clone());
        }

        self.state = WizardState::SelectingPrimaryName;
        debug!(entities = count, candidates = self.candidates.len(), "entered naming step");
        Ok(())
    }

    /// Advances to the review step, building the plan.
    ///
    /// Requires a chosen primary name. Analysis may still be pending;
    /// the plan degrades its conflict fields to zero and the report
    /// renders as "not yet analyzed".
    pub fn proceed_to_review(&mut self) -> Result<&MergePlan, ValidationError> {
        let selected = self.owned_selected_entities();
        let plan = MergePlanBuilder::new()
            .selection(&self.selection)
            .entities(&selected)
            .candidates(&self.candidates)
            .conflicts(&self.conflicts)
            .build()?;

        self.state = WizardState::ReviewingPlan;
        Ok(&*self.plan.insert(plan))
    }

    /// Attaches backend analysis for the current selection and rebuilds
    /// the report (and the plan's conflict aggregates, when a plan
    /// exists).
    pub fn attach_analysis(
        &mut self,
        pairs: Vec<SimilarityPair>,
        conflicts: Vec<AttributeConflict>,
    ) {
        self.pairs = pairs;
        self.conflicts = conflicts;

        let selected = self.owned_selected_entities();
        self.report = MergeReport::reconcile(&selected, &self.pairs, &self.conflicts);

        if self.plan.is_some() {
            match self.proceed_to_review() {
                Ok(_) => {}
                Err(e) => warn!(error = %e, "plan rebuild after analysis failed"),
            }
        }
    }

    /// Fetches analysis through the backend, degrading gracefully.
    ///
    /// Tries the rich preview first; if that fails, falls back to the
    /// plain similarity call (no conflicts); if both fail, the analysis
    /// stays pending and the merge remains available.
    pub fn fetch_analysis(&mut self, backend: &dyn MergeBackend) -> AnalysisState {
        let ids: Vec<EntityId> = self.selection.selected.clone();

        match backend.preview_merge(&ids) {
            Ok(preview) => {
                let suggested = preview.merged_preview.suggested_canonical_name.clone();
                self.attach_analysis(preview.similarity.pairs, preview.conflicts);
                self.report = self.report.clone().with_backend_suggested_name(suggested);
                AnalysisState::Analyzed
            }
            Err(preview_error) => {
                warn!(error = %preview_error, "preview-merge failed, falling back to similarity");
                match backend.similarity(&ids) {
                    Ok(similarity) => {
                        self.attach_analysis(similarity.pairs, Vec::new());
                        AnalysisState::Analyzed
                    }
                    Err(similarity_error) => {
                        warn!(error = %similarity_error, "similarity fallback failed, analysis stays pending");
                        self.invalidate_analysis();
                        AnalysisState::Pending
                    }
                }
            }
        }
    }

    /// Starts the submission, producing the request payload.
    ///
    /// Requires a built plan (review step reached).
    pub fn begin_submission(&mut self) -> Result<MergeRequest, ValidationError> {
        let plan = self.plan.as_ref().ok_or(ValidationError::MissingPrimaryName)?;
        let request = MergeRequest::from_plan(plan);
        self.state = WizardState::Submitting;
        info!(
            primary = %request.primary_entity_id,
            entities = request.entity_ids.len(),
            "merge submission started"
        );
        Ok(request)
    }

    /// Records the submission outcome.
    ///
    /// Success disposes the plan and resets the selection; failure
    /// preserves both so the user can retry from the review step.
    pub fn complete_submission(
        &mut self,
        result: Result<MergeOutcome, SubmissionError>,
    ) -> FuseResult<MergeOutcome> {
        match result {
            Ok(outcome) => {
                info!(merged = outcome.merged_count, "merge succeeded");
                self.state = WizardState::Succeeded;
                self.plan = None;
                self.selection.reset();
                self.candidates.clear();
                self.invalidate_analysis();
                self.last_error = None;
                Ok(outcome)
            }
            Err(error) => {
                warn!(error = %error, "merge submission failed");
                self.last_error = Some(error.to_string());
                self.state = WizardState::Failed;
                Err(FuseError::Submission(error))
            }
        }
    }

    /// Returns from the failed state to the review step, keeping the
    /// plan and selection for retry.
    pub fn acknowledge_failure(&mut self) {
        if self.state == WizardState::Failed {
            self.state = WizardState::ReviewingPlan;
        }
    }

    /// Runs the whole submission round-trip against a backend.
    pub fn submit(&mut self, backend: &dyn MergeBackend) -> FuseResult<MergeOutcome> {
        let request = self.begin_submission()?;
        let result = backend.submit_merge(&request);
        self.complete_submission(result)
    }

    fn owned_selected_entities(&self) -> Vec<Entity> {
        self.selection
            .selected
            .iter()
            .filter_map(|id| self.entities.iter().find(|e| e.id == *id))
            .cloned()
            .collect()
    }

    fn invalidate_analysis(&mut self) {
        self.pairs.clear();
        self.conflicts.clear();
        self.report = MergeReport::pending();
    }
}
