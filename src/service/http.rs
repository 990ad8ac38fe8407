//! HTTP implementation of the backend services.
//!
//! Speaks the project-scoped REST surface with its `{success, data,
//! error, message}` envelope. Available behind the `http-client`
//! feature; the core never depends on it.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::entity::EntityId;
use crate::error::{BackendError, SubmissionError};

use super::normalize::{
    merge_history_entry_from_value, merge_preview_from_value, similarity_report_from_value,
    undo_outcome_from_value,
};
use super::{
    MergeBackend, MergeHistoryEntry, MergeId, MergeOutcome, MergePreview, MergeRequest,
    SimilarityReport, UndoOutcome,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiEnvelope {
    fn into_data(self) -> Result<Value, BackendError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(BackendError::Server {
                message: self
                    .error
                    .or(self.message)
                    .unwrap_or_else(|| "backend reported failure without a message".to_string()),
            })
        }
    }
}

/// Blocking HTTP client for the merge services of one project.
pub struct HttpBackend {
    base_url: String,
    project_id: u64,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    /// Creates a client for `base_url` (no trailing slash) scoped to one
    /// project.
    pub fn new(base_url: impl Into<String>, project_id: u64) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::ConnectionFailed {
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id,
            client,
        })
    }

    fn entities_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/projects/{}/entities/{suffix}",
            self.base_url, self.project_id
        )
    }

    fn transport_error(error: &reqwest::Error) -> BackendError {
        if error.is_decode() {
            BackendError::decode(error.to_string())
        } else {
            BackendError::ConnectionFailed {
                message: error.to_string(),
            }
        }
    }

    fn envelope(response: reqwest::blocking::Response) -> Result<Value, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Server {
                message: format!("HTTP {status}"),
            });
        }
        let envelope: ApiEnvelope = response.json().map_err(|e| Self::transport_error(&e))?;
        envelope.into_data()
    }

    fn post(&self, url: &str, body: &Value) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| Self::transport_error(&e))?;
        Self::envelope(response)
    }

    fn get(&self, url: &str) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Self::transport_error(&e))?;
        Self::envelope(response)
    }
}

impl MergeBackend for HttpBackend {
    fn similarity(&self, entity_ids: &[EntityId]) -> Result<SimilarityReport, BackendError> {
        let data = self.post(
            &self.entities_url("similarity"),
            &json!({ "entity_ids": entity_ids }),
        )?;
        similarity_report_from_value(&data)
    }

    fn preview_merge(&self, entity_ids: &[EntityId]) -> Result<MergePreview, BackendError> {
        let data = self.post(
            &self.entities_url("preview-merge"),
            &json!({ "entity_ids": entity_ids }),
        )?;
        merge_preview_from_value(&data)
    }

    fn submit_merge(&self, request: &MergeRequest) -> Result<MergeOutcome, SubmissionError> {
        let body = serde_json::to_value(request)
            .map_err(|e| SubmissionError::Transport(BackendError::decode(e.to_string())))?;
        let data = self
            .post(&self.entities_url("merge"), &body)
            .map_err(|e| match e {
                BackendError::Server { message } => SubmissionError::Rejected { message },
                other => SubmissionError::Transport(other),
            })?;

        let merged_entity_ids: Vec<EntityId> = data
            .get("merged_entity_ids")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| SubmissionError::Transport(BackendError::decode(e.to_string())))?
            .unwrap_or_default();
        let merged_count = data
            .get("merged_count")
            .and_then(Value::as_u64)
            .map_or(merged_entity_ids.len(), |count| {
                usize::try_from(count).unwrap_or(merged_entity_ids.len())
            });

        Ok(MergeOutcome {
            primary_entity_id: request.primary_entity_id,
            merged_count,
            merged_entity_ids,
        })
    }

    fn merge_history(&self) -> Result<Vec<MergeHistoryEntry>, BackendError> {
        let data = self.get(&self.entities_url("merge-history"))?;
        let entries = data
            .get("merges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // One malformed record should not hide the rest of the history.
        let mut history = Vec::with_capacity(entries.len());
        for raw in &entries {
            match merge_history_entry_from_value(raw) {
                Ok(entry) => history.push(entry),
                Err(e) => warn!(error = %e, "skipping malformed merge history entry"),
            }
        }
        Ok(history)
    }

    fn undo_merge(&self, merge_id: MergeId) -> Result<UndoOutcome, BackendError> {
        let data = self.post(
            &self.entities_url(&format!("undo-merge/{merge_id}")),
            &json!({}),
        )?;
        undo_outcome_from_value(&data)
    }
}
