//! Normalization of backend response shapes.
//!
//! The backend API evolved: older responses say `combined_score` where
//! newer ones say `similarity`, pair ids appear as `entity1_id` or
//! `entity_a`, name metrics may be nested or flat. All of that
//! variability is absorbed here, in one boundary step, so the core only
//! ever sees the canonical types. Unknown enum strings degrade (severity
//! to low, recommendation to absent) rather than failing the whole
//! response.

use serde_json::Value;
use tracing::{debug, warn};

use crate::conflict::{AttributeConflict, ConflictSeverity, ConflictingValue};
use crate::entity::{EntityId, EntityType};
use crate::error::BackendError;
use crate::similarity::{NameSimilarity, Recommendation, SimilarityPair};

use super::{MergeHistoryEntry, MergeId, MergePreview, MergedPreview, SimilarityReport, UndoOutcome};

/// Returns the first present field among `names`.
fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| value.get(name))
}

#[allow(clippy::cast_possible_truncation)]
fn f32_field(value: &Value, names: &[&str]) -> Option<f32> {
    field(value, names).and_then(Value::as_f64).map(|v| v as f32)
}

fn str_field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a str> {
    field(value, names).and_then(Value::as_str)
}

fn id_field(value: &Value, names: &[&str]) -> Result<EntityId, BackendError> {
    let raw = str_field(value, names).ok_or_else(|| {
        BackendError::shape(format!("missing entity id field (any of {names:?})"))
    })?;
    uuid::Uuid::parse_str(raw)
        .map(EntityId::from_uuid)
        .map_err(|e| BackendError::shape(format!("invalid entity id '{raw}': {e}")))
}

fn recommendation_from_str(raw: &str) -> Option<Recommendation> {
    match raw {
        "merge" => Some(Recommendation::Merge),
        "review" => Some(Recommendation::Review),
        "keep_separate" => Some(Recommendation::KeepSeparate),
        other => {
            debug!(value = other, "unknown recommendation label, ignoring");
            None
        }
    }
}

fn severity_from_value(value: Option<&Value>) -> ConflictSeverity {
    match value.and_then(Value::as_str) {
        Some("high") => ConflictSeverity::High,
        Some("medium") => ConflictSeverity::Medium,
        Some("low") => ConflictSeverity::Low,
        other => {
            warn!(value = ?other, "unknown conflict severity, degrading to low");
            ConflictSeverity::Low
        }
    }
}

/// Normalizes one similarity pair from any historical response shape.
///
/// Accepted id fields: `entity_a`/`entity_a_id`/`entity1_id` (same for
/// `b`/`2`). Accepted combined-score fields: `combined_score`,
/// `similarity`, `combined`. Name metrics may be nested under `name` or
/// `name_similarity`, or flat on the pair object.
pub fn similarity_pair_from_value(value: &Value) -> Result<SimilarityPair, BackendError> {
    let entity_a = id_field(value, &["entity_a", "entity_a_id", "entity1_id"])?;
    let entity_b = id_field(value, &["entity_b", "entity_b_id", "entity2_id"])?;

    let metrics = field(value, &["name", "name_similarity"]).unwrap_or(value);
    let name = NameSimilarity {
        levenshtein: f32_field(metrics, &["levenshtein"]).unwrap_or(0.0),
        jaro_winkler: f32_field(metrics, &["jaro_winkler"]).unwrap_or(0.0),
        containment: f32_field(metrics, &["containment"]).unwrap_or(0.0),
    };

    let semantic = f32_field(value, &["semantic", "semantic_similarity"]).unwrap_or(0.0);
    let recommendation =
        str_field(value, &["recommendation"]).and_then(recommendation_from_str);

    let combined_score = match f32_field(value, &["combined_score", "similarity", "combined"]) {
        Some(score) => score,
        None if recommendation.is_some() => {
            debug!("pair carries a recommendation but no combined score, defaulting to 0.0");
            0.0
        }
        None => {
            return Err(BackendError::shape(
                "similarity pair has neither a combined score nor a recommendation",
            ))
        }
    };

    Ok(SimilarityPair {
        entity_a,
        entity_b,
        name,
        semantic,
        combined_score,
        recommendation,
    })
}

/// Normalizes a similarity response: either `{pairs, average_score,
/// recommendation}` or a bare array of pairs (average computed here).
pub fn similarity_report_from_value(value: &Value) -> Result<SimilarityReport, BackendError> {
    let (raw_pairs, average, recommendation) = match value {
        Value::Array(items) => (items.as_slice(), None, None),
        Value::Object(_) => {
            let items = field(value, &["pairs"])
                .and_then(Value::as_array)
                .map_or(&[] as &[Value], Vec::as_slice);
            (
                items,
                f32_field(value, &["average_score", "avg_score"]),
                str_field(value, &["recommendation"]).and_then(recommendation_from_str),
            )
        }
        _ => {
            return Err(BackendError::shape(
                "similarity response is neither an object nor an array",
            ))
        }
    };

    let pairs = raw_pairs
        .iter()
        .map(similarity_pair_from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let average_score = average.unwrap_or_else(|| {
        if pairs.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = pairs.len() as f32;
            pairs.iter().map(|p| p.combined_score).sum::<f32>() / count
        }
    });

    Ok(SimilarityReport {
        pairs,
        average_score,
        recommendation,
    })
}

/// Normalizes one attribute conflict from any historical shape.
pub fn attribute_conflict_from_value(value: &Value) -> Result<AttributeConflict, BackendError> {
    let attribute_name = str_field(value, &["attribute_name", "attribute_key", "name"])
        .ok_or_else(|| BackendError::shape("conflict is missing an attribute name"))?
        .to_string();
    let category = str_field(value, &["category", "attribute_type"])
        .unwrap_or_default()
        .to_string();
    let severity = severity_from_value(field(value, &["severity"]));

    let raw_values = field(value, &["conflicting_values", "values"])
        .and_then(Value::as_array)
        .map_or(&[] as &[Value], Vec::as_slice);

    let conflicting_values = raw_values
        .iter()
        .map(|raw| {
            let value = str_field(raw, &["value", "attribute_value"])
                .ok_or_else(|| BackendError::shape("conflicting value entry has no value"))?
                .to_string();
            Ok(ConflictingValue {
                value,
                source_entity_id: id_field(raw, &["source_entity_id", "entity_id"])?,
                source_entity_name: str_field(raw, &["source_entity_name", "entity_name"])
                    .unwrap_or_default()
                    .to_string(),
                confidence: f32_field(raw, &["confidence"]).unwrap_or(1.0),
            })
        })
        .collect::<Result<Vec<_>, BackendError>>()?;

    Ok(AttributeConflict {
        category,
        attribute_name,
        severity,
        conflicting_values,
    })
}

/// Normalizes the full preview-merge response.
///
/// Missing sections degrade: no `similarity` yields an empty report, no
/// `conflicts` yields an empty list, missing aggregates are recomputed
/// from what is present.
pub fn merge_preview_from_value(value: &Value) -> Result<MergePreview, BackendError> {
    let similarity = match field(value, &["similarity"]) {
        Some(section) => similarity_report_from_value(section)?,
        None => SimilarityReport {
            pairs: Vec::new(),
            average_score: 0.0,
            recommendation: None,
        },
    };

    let preview_section = field(value, &["merged_preview", "preview"])
        .ok_or_else(|| BackendError::shape("preview response is missing merged_preview"))?;
    let suggested_type = str_field(preview_section, &["suggested_type"]).and_then(|raw| {
        match EntityType::try_from(raw.to_string()) {
            Ok(entity_type) => Some(entity_type),
            Err(_) => {
                debug!(value = raw, "unknown suggested entity type, ignoring");
                None
            }
        }
    });
    let merged_preview = MergedPreview {
        suggested_canonical_name: str_field(preview_section, &["suggested_canonical_name"])
            .ok_or_else(|| BackendError::shape("merged_preview has no suggested canonical name"))?
            .to_string(),
        suggested_aliases: field(preview_section, &["suggested_aliases"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        suggested_type,
        total_mentions: field(preview_section, &["total_mentions", "total_mention_count"])
            .and_then(Value::as_u64)
            .unwrap_or(0),
    };

    let conflicts = field(value, &["conflicts"])
        .and_then(Value::as_array)
        .map_or(&[] as &[Value], Vec::as_slice)
        .iter()
        .map(attribute_conflict_from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let conflict_count = field(value, &["conflict_count"])
        .and_then(Value::as_u64)
        .map_or(conflicts.len(), |count| {
            usize::try_from(count).unwrap_or(conflicts.len())
        });
    let has_critical_conflicts = field(value, &["has_critical_conflicts"])
        .and_then(Value::as_bool)
        .unwrap_or_else(|| crate::conflict::has_critical_conflicts(&conflicts));

    let recommendation = str_field(value, &["recommendation"])
        .and_then(recommendation_from_str)
        .unwrap_or(Recommendation::Review);
    let recommendation_reason = str_field(value, &["recommendation_reason", "reason"])
        .unwrap_or_default()
        .to_string();

    Ok(MergePreview {
        similarity,
        merged_preview,
        conflicts,
        conflict_count,
        has_critical_conflicts,
        recommendation,
        recommendation_reason,
    })
}

/// Normalizes one merge-history record.
pub fn merge_history_entry_from_value(value: &Value) -> Result<MergeHistoryEntry, BackendError> {
    let raw_id = str_field(value, &["id", "merge_id"])
        .ok_or_else(|| BackendError::shape("merge history entry has no id"))?;
    let id = uuid::Uuid::parse_str(raw_id)
        .map(MergeId::from_uuid)
        .map_err(|e| BackendError::shape(format!("invalid merge id '{raw_id}': {e}")))?;

    let source_entity_ids = field(value, &["source_entity_ids", "merged_entity_ids"])
        .and_then(Value::as_array)
        .map_or(&[] as &[Value], Vec::as_slice)
        .iter()
        .map(|raw| {
            raw.as_str()
                .and_then(|s| uuid::Uuid::parse_str(s).ok())
                .map(EntityId::from_uuid)
                .ok_or_else(|| BackendError::shape("invalid source entity id in merge history"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let raw_time = str_field(value, &["merged_at", "created_at"])
        .ok_or_else(|| BackendError::shape("merge history entry has no timestamp"))?;
    let merged_at = chrono::DateTime::parse_from_rfc3339(raw_time)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|e| BackendError::shape(format!("invalid merge timestamp '{raw_time}': {e}")))?;

    Ok(MergeHistoryEntry {
        id,
        primary_entity_id: id_field(value, &["primary_entity_id", "target_entity_id"])?,
        source_entity_ids,
        merged_at,
        merged_by: str_field(value, &["merged_by"]).unwrap_or("user").to_string(),
    })
}

/// Normalizes an undo-merge response.
pub fn undo_outcome_from_value(value: &Value) -> Result<UndoOutcome, BackendError> {
    let restored_entity_ids = field(value, &["restored_entity_ids"])
        .and_then(Value::as_array)
        .map_or(&[] as &[Value], Vec::as_slice)
        .iter()
        .map(|raw| {
            raw.as_str()
                .and_then(|s| uuid::Uuid::parse_str(s).ok())
                .map(EntityId::from_uuid)
                .ok_or_else(|| BackendError::shape("invalid restored entity id"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UndoOutcome {
        restored_entity_ids,
        message: str_field(value, &["message"]).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uuid_a() -> String {
        "11111111-1111-1111-1111-111111111111".to_string()
    }

    fn uuid_b() -> String {
        "22222222-2222-2222-2222-222222222222".to_string()
    }

    #[test]
    fn test_pair_current_shape() {
        let value = json!({
            "entity_a": uuid_a(),
            "entity_b": uuid_b(),
            "name": {"levenshtein": 0.8, "jaro_winkler": 0.9, "containment": 1.0},
            "semantic": 0.7,
            "combined_score": 0.75,
            "recommendation": "merge"
        });
        let pair = similarity_pair_from_value(&value).unwrap();
        assert!((pair.combined_score - 0.75).abs() < 1e-6);
        assert!((pair.name.jaro_winkler - 0.9).abs() < 1e-6);
        assert_eq!(pair.recommendation, Some(Recommendation::Merge));
    }

    #[test]
    fn test_pair_legacy_shape() {
        // Numbered ids, nested name_similarity, `similarity` for the
        // combined score, no recommendation.
        let value = json!({
            "entity1_id": uuid_a(),
            "entity2_id": uuid_b(),
            "name_similarity": {"levenshtein": 0.5, "jaro_winkler": 0.6, "containment": 0.0},
            "semantic_similarity": 0.4,
            "similarity": 0.45
        });
        let pair = similarity_pair_from_value(&value).unwrap();
        assert!((pair.combined_score - 0.45).abs() < 1e-6);
        assert!((pair.semantic - 0.4).abs() < 1e-6);
        assert_eq!(pair.recommendation, None);
    }

    #[test]
    fn test_pair_flat_metrics() {
        let value = json!({
            "entity_a_id": uuid_a(),
            "entity_b_id": uuid_b(),
            "levenshtein": 0.3,
            "combined": 0.3
        });
        let pair = similarity_pair_from_value(&value).unwrap();
        assert!((pair.name.levenshtein - 0.3).abs() < 1e-6);
        assert!((pair.combined_score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_pair_recommendation_only() {
        let value = json!({
            "entity_a": uuid_a(),
            "entity_b": uuid_b(),
            "recommendation": "keep_separate"
        });
        let pair = similarity_pair_from_value(&value).unwrap();
        assert_eq!(pair.combined_score, 0.0);
        assert_eq!(pair.recommendation, Some(Recommendation::KeepSeparate));
    }

    #[test]
    fn test_pair_without_score_or_recommendation_fails() {
        let value = json!({"entity_a": uuid_a(), "entity_b": uuid_b()});
        assert!(similarity_pair_from_value(&value).is_err());
    }

    #[test]
    fn test_pair_bad_id_fails() {
        let value = json!({"entity_a": "not-a-uuid", "entity_b": uuid_b(), "combined_score": 0.5});
        assert!(similarity_pair_from_value(&value).is_err());
    }

    #[test]
    fn test_report_object_shape() {
        let value = json!({
            "pairs": [{
                "entity_a": uuid_a(),
                "entity_b": uuid_b(),
                "combined_score": 0.5
            }],
            "average_score": 0.5,
            "recommendation": "review"
        });
        let report = similarity_report_from_value(&value).unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.recommendation, Some(Recommendation::Review));
    }

    #[test]
    fn test_report_bare_array_computes_average() {
        let value = json!([
            {"entity_a": uuid_a(), "entity_b": uuid_b(), "combined_score": 0.4},
            {"entity_a": uuid_a(), "entity_b": uuid_b(), "combined_score": 0.8}
        ]);
        let report = similarity_report_from_value(&value).unwrap();
        assert!((report.average_score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_conflict_shapes() {
        let value = json!({
            "category": "physical",
            "attribute_name": "ojos",
            "severity": "high",
            "conflicting_values": [
                {"value": "azules", "source_entity_id": uuid_a(), "source_entity_name": "Juan", "confidence": 0.9},
                {"value": "verdes", "entity_id": uuid_b(), "entity_name": "Juanito"}
            ]
        });
        let conflict = attribute_conflict_from_value(&value).unwrap();
        assert_eq!(conflict.severity, ConflictSeverity::High);
        assert_eq!(conflict.conflicting_values.len(), 2);
        // Missing confidence defaults to 1.0.
        assert!((conflict.conflicting_values[1].confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_conflict_unknown_severity_degrades_to_low() {
        let value = json!({
            "attribute_type": "identity",
            "attribute_key": "edad",
            "severity": "catastrophic",
            "values": []
        });
        let conflict = attribute_conflict_from_value(&value).unwrap();
        assert_eq!(conflict.severity, ConflictSeverity::Low);
        assert_eq!(conflict.category, "identity");
        assert_eq!(conflict.attribute_name, "edad");
    }

    #[test]
    fn test_preview_full_response() {
        let value = json!({
            "similarity": {
                "pairs": [{"entity_a": uuid_a(), "entity_b": uuid_b(), "combined_score": 0.7}],
                "average_score": 0.7
            },
            "merged_preview": {
                "suggested_canonical_name": "Juan Pérez",
                "suggested_aliases": ["Juan", "Juanito"],
                "suggested_type": "character",
                "total_mentions": 15
            },
            "conflicts": [],
            "conflict_count": 0,
            "has_critical_conflicts": false,
            "recommendation": "merge",
            "recommendation_reason": "Alta similitud sin conflictos significativos"
        });
        let preview = merge_preview_from_value(&value).unwrap();
        assert_eq!(preview.merged_preview.suggested_canonical_name, "Juan Pérez");
        assert_eq!(
            preview.merged_preview.suggested_type,
            Some(EntityType::Character)
        );
        assert_eq!(preview.recommendation, Recommendation::Merge);
        assert_eq!(preview.similarity.pairs.len(), 1);
    }

    #[test]
    fn test_preview_minimal_response() {
        // Aggregates recomputed from what is present.
        let value = json!({
            "merged_preview": {"suggested_canonical_name": "Juan"},
            "conflicts": [{"attribute_name": "ojos", "severity": "high"}]
        });
        let preview = merge_preview_from_value(&value).unwrap();
        assert_eq!(preview.conflict_count, 1);
        assert!(preview.has_critical_conflicts);
        assert_eq!(preview.recommendation, Recommendation::Review);
        assert!(preview.similarity.pairs.is_empty());
    }

    #[test]
    fn test_preview_missing_merged_preview_fails() {
        let value = json!({"conflicts": []});
        assert!(merge_preview_from_value(&value).is_err());
    }

    #[test]
    fn test_history_entry() {
        let value = json!({
            "id": "33333333-3333-3333-3333-333333333333",
            "primary_entity_id": uuid_a(),
            "source_entity_ids": [uuid_b()],
            "merged_at": "2025-11-04T12:30:00+00:00",
            "merged_by": "user"
        });
        let entry = merge_history_entry_from_value(&value).unwrap();
        assert_eq!(entry.source_entity_ids.len(), 1);
        assert_eq!(entry.merged_by, "user");
    }

    #[test]
    fn test_history_entry_legacy_fields() {
        // `created_at` and `merged_entity_ids`, no `merged_by`.
        let value = json!({
            "merge_id": "33333333-3333-3333-3333-333333333333",
            "target_entity_id": uuid_a(),
            "merged_entity_ids": [uuid_b()],
            "created_at": "2025-11-04T12:30:00Z"
        });
        let entry = merge_history_entry_from_value(&value).unwrap();
        assert_eq!(entry.merged_by, "user");
        assert_eq!(entry.source_entity_ids.len(), 1);
    }

    #[test]
    fn test_undo_outcome() {
        let value = json!({
            "restored_entity_ids": [uuid_a(), uuid_b()],
            "message": "Fusión deshecha"
        });
        let outcome = undo_outcome_from_value(&value).unwrap();
        assert_eq!(outcome.restored_entity_ids.len(), 2);
        assert_eq!(outcome.message.as_deref(), Some("Fusión deshecha"));
    }
}
