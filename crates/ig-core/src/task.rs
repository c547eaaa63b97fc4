use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::SubmitError;

/// Opaque handle returned by the submission endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /images/generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

impl SubmitResponse {
    pub fn into_task_id(self) -> Result<TaskId, SubmitError> {
        match self.task_id {
            Some(id) if !id.trim().is_empty() => Ok(TaskId(id)),
            _ => Err(SubmitError::MissingTaskId),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
}

/// Body of `GET /images/{taskId}`.
///
/// Only the `data: [{ url }]` shape is understood. Payloads that still carry
/// the older `images: [String]` list have no `data` and classify as malformed
/// once they claim completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEnvelope {
    pub success: bool,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusEnvelope {
    pub fn pending() -> Self {
        Self::with_status(TaskStatus::Pending)
    }

    pub fn completed<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut envelope = Self::with_status(TaskStatus::Completed);
        envelope.data = urls.into_iter().map(|u| ImageRef { url: u.into() }).collect();
        envelope
    }

    pub fn failed(message: impl Into<String>) -> Self {
        let mut envelope = Self::with_status(TaskStatus::Failed);
        envelope.message = Some(message.into());
        envelope
    }

    fn with_status(status: TaskStatus) -> Self {
        Self {
            success: true,
            status,
            data: Vec::new(),
            message: None,
        }
    }

    pub fn classify(self) -> StatusClass {
        if !self.success {
            return StatusClass::Failed(
                self.message.unwrap_or_else(|| "backend rejected the task".to_string()),
            );
        }

        match self.status {
            TaskStatus::Pending => StatusClass::Pending,
            TaskStatus::Completed if self.data.is_empty() => {
                StatusClass::Malformed("completed without any image urls".to_string())
            }
            TaskStatus::Completed => StatusClass::Completed(GenerationResult {
                urls: self.data.into_iter().map(|r| r.url).collect(),
            }),
            TaskStatus::Failed => StatusClass::Failed(
                self.message.unwrap_or_else(|| "no reason given".to_string()),
            ),
            TaskStatus::Unknown => StatusClass::Malformed("unknown task status".to_string()),
        }
    }
}

/// Pending tasks often report `"data": null` rather than an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ImageRef>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    Pending,
    Completed(GenerationResult),
    Failed(String),
    Malformed(String),
}

/// Image urls in the order the backend listed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub urls: Vec<String>,
}
