//! End-to-end tests of the wizard flow against a fake backend.

use std::sync::atomic::{AtomicUsize, Ordering};

use narrafuse::{
    AnalysisState, AttributeConflict, BackendError, ConflictSeverity, ConflictingValue, Entity,
    EntityId, EntityType, MergeBackend, MergeHistoryEntry, MergeId, MergeOutcome, MergePreview,
    MergeRequest, MergeWizard, MergedPreview, NameSimilarity, Recommendation, SimilarityPair,
    SimilarityReport, SubmissionError, UndoOutcome, WizardState,
};

/// Backend double with scriptable failures.
#[derive(Default)]
struct FakeBackend {
    preview_fails: bool,
    similarity_fails: bool,
    submit_rejects: Option<String>,
    submissions: AtomicUsize,
}

impl FakeBackend {
    fn pair(&self, a: EntityId, b: EntityId, score: f32) -> SimilarityPair {
        SimilarityPair {
            entity_a: a,
            entity_b: b,
            name: NameSimilarity {
                levenshtein: score,
                jaro_winkler: score,
                containment: 0.0,
            },
            semantic: score,
            combined_score: score,
            recommendation: None,
        }
    }
}

impl MergeBackend for FakeBackend {
    fn similarity(&self, entity_ids: &[EntityId]) -> Result<SimilarityReport, BackendError> {
        if self.similarity_fails {
            return Err(BackendError::ConnectionFailed {
                message: "connection refused".to_string(),
            });
        }
        let pairs = match entity_ids {
            [a, b, ..] => vec![self.pair(*a, *b, 0.5)],
            _ => Vec::new(),
        };
        Ok(SimilarityReport {
            average_score: 0.5,
            pairs,
            recommendation: Some(Recommendation::Review),
        })
    }

    fn preview_merge(&self, entity_ids: &[EntityId]) -> Result<MergePreview, BackendError> {
        if self.preview_fails {
            return Err(BackendError::Server {
                message: "preview unavailable".to_string(),
            });
        }
        let pairs = match entity_ids {
            [a, b, ..] => vec![self.pair(*a, *b, 0.8)],
            _ => Vec::new(),
        };
        let conflicts = vec![AttributeConflict {
            category: "physical".to_string(),
            attribute_name: "color_pelo".to_string(),
            severity: ConflictSeverity::High,
            conflicting_values: vec![ConflictingValue {
                value: "moreno".to_string(),
                source_entity_id: entity_ids[0],
                source_entity_name: "Juan".to_string(),
                confidence: 0.8,
            }],
        }];
        Ok(MergePreview {
            similarity: SimilarityReport {
                pairs,
                average_score: 0.8,
                recommendation: Some(Recommendation::Merge),
            },
            merged_preview: MergedPreview {
                suggested_canonical_name: "Juan".to_string(),
                suggested_aliases: vec!["Juanito".to_string()],
                suggested_type: Some(EntityType::Character),
                total_mentions: 15,
            },
            conflicts,
            conflict_count: 1,
            has_critical_conflicts: true,
            recommendation: Recommendation::Review,
            recommendation_reason: "conflicts require review".to_string(),
        })
    }

    fn submit_merge(&self, request: &MergeRequest) -> Result<MergeOutcome, SubmissionError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.submit_rejects {
            return Err(SubmissionError::Rejected {
                message: message.clone(),
            });
        }
        Ok(MergeOutcome {
            primary_entity_id: request.primary_entity_id,
            merged_count: request.entity_ids.len() - 1,
            merged_entity_ids: request
                .entity_ids
                .iter()
                .copied()
                .filter(|id| *id != request.primary_entity_id)
                .collect(),
        })
    }

    fn merge_history(&self) -> Result<Vec<MergeHistoryEntry>, BackendError> {
        Ok(Vec::new())
    }

    fn undo_merge(&self, _merge_id: MergeId) -> Result<UndoOutcome, BackendError> {
        Ok(UndoOutcome {
            restored_entity_ids: Vec::new(),
            message: None,
        })
    }
}

fn wizard_at_review() -> (MergeWizard, EntityId, EntityId) {
    let juan = Entity::new("Juan", EntityType::Character)
        .with_alias("Juanito")
        .with_mentions(10);
    let moreno = Entity::new("el joven moreno", EntityType::Character)
        .with_alias("Juan")
        .with_mentions(5);
    let (juan_id, moreno_id) = (juan.id, moreno.id);
    let mut wizard = MergeWizard::new(vec![juan, moreno]);
    wizard.preselect([juan_id, moreno_id]);
    wizard.proceed_to_naming().unwrap();
    wizard.proceed_to_review().unwrap();
    (wizard, juan_id, moreno_id)
}

#[test]
fn analysis_from_preview_updates_report_and_plan() {
    let (mut wizard, _, _) = wizard_at_review();
    let backend = FakeBackend::default();

    let state = wizard.fetch_analysis(&backend);
    assert_eq!(state, AnalysisState::Analyzed);

    let report = wizard.report();
    assert!(!report.is_pending());
    assert!(report.has_critical_conflicts);
    assert_eq!(report.backend_suggested_name.as_deref(), Some("Juan"));

    // The plan's conflict aggregates follow the attached analysis.
    let plan = wizard.plan().unwrap();
    assert_eq!(plan.conflict_count, 1);
    assert!(plan.has_critical_conflicts);
}

#[test]
fn preview_failure_falls_back_to_similarity() {
    let (mut wizard, _, _) = wizard_at_review();
    let backend = FakeBackend {
        preview_fails: true,
        ..FakeBackend::default()
    };

    let state = wizard.fetch_analysis(&backend);
    assert_eq!(state, AnalysisState::Analyzed);

    // Fallback carries similarity but no conflict data.
    let report = wizard.report();
    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.conflict_count, 0);
    assert!(!report.has_critical_conflicts);
}

#[test]
fn total_backend_failure_leaves_analysis_pending_and_merge_available() {
    let (mut wizard, _, _) = wizard_at_review();
    let backend = FakeBackend {
        preview_fails: true,
        similarity_fails: true,
        ..FakeBackend::default()
    };

    let state = wizard.fetch_analysis(&backend);
    assert_eq!(state, AnalysisState::Pending);
    assert!(wizard.report().is_pending());

    // The user can still merge, accepting the risk.
    let outcome = wizard.submit(&backend).unwrap();
    assert_eq!(outcome.merged_count, 1);
    assert_eq!(wizard.state(), WizardState::Succeeded);
}

#[test]
fn successful_submission_resets_selection_and_plan() {
    let (mut wizard, juan_id, moreno_id) = wizard_at_review();
    let backend = FakeBackend::default();

    let outcome = wizard.submit(&backend).unwrap();
    assert_eq!(outcome.primary_entity_id, juan_id);
    assert_eq!(outcome.merged_entity_ids, vec![moreno_id]);

    assert_eq!(wizard.state(), WizardState::Succeeded);
    assert!(wizard.plan().is_none());
    assert!(wizard.selection().is_empty());
    assert!(wizard.report().is_pending());
}

#[test]
fn failed_submission_preserves_state_for_retry() {
    let (mut wizard, juan_id, moreno_id) = wizard_at_review();
    let rejecting = FakeBackend {
        submit_rejects: Some("Entidad principal no encontrada".to_string()),
        ..FakeBackend::default()
    };

    let error = wizard.submit(&rejecting).unwrap_err();
    assert!(error.is_submission());
    assert!(!error.is_retryable());
    assert_eq!(wizard.state(), WizardState::Failed);
    assert_eq!(
        wizard.last_error(),
        Some("Merge rejected by backend: Entidad principal no encontrada")
    );

    // Selection and plan survive; acknowledging returns to review and a
    // second attempt against a healthy backend succeeds.
    assert!(wizard.plan().is_some());
    assert_eq!(wizard.selection().len(), 2);
    wizard.acknowledge_failure();
    assert_eq!(wizard.state(), WizardState::ReviewingPlan);

    let healthy = FakeBackend::default();
    let outcome = wizard.submit(&healthy).unwrap();
    assert_eq!(outcome.primary_entity_id, juan_id);
    assert_eq!(outcome.merged_entity_ids, vec![moreno_id]);
    assert_eq!(healthy.submissions.load(Ordering::SeqCst), 1);
}

#[test]
fn submission_payload_contains_ids_only() {
    let (mut wizard, juan_id, moreno_id) = wizard_at_review();
    let request = wizard.begin_submission().unwrap();

    assert_eq!(request.primary_entity_id, juan_id);
    assert_eq!(request.entity_ids, vec![juan_id, moreno_id]);
    assert_eq!(wizard.state(), WizardState::Submitting);

    // The client-computed name and aliases are display-only preview
    // data and never travel in the payload.
    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("canonical_name").is_none());
    assert!(json.get("aliases").is_none());
}
