pub mod schemas;

use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use ig_core::{GenerationRequest, PollError, Session, StatusEnvelope, SubmitError, SubmitResponse, TaskId};
use crate::config::GenConfig;
use crate::error::AppError;

/// The two image endpoints the poller depends on
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn submit(&self, request: &GenerationRequest, session: &Session) -> Result<TaskId, SubmitError>;

    async fn query_status(&self, task_id: &TaskId, session: &Session) -> Result<StatusEnvelope, PollError>;
}

#[derive(Debug, Clone)]
pub struct GenBackend {
    pub(crate) client: reqwest::Client,
    base_url: String,
}

impl GenBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(conf: &GenConfig) -> Result<Self, AppError> {
        Self::new(conf.api_url.clone(), conf.http_timeout)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl ImageApi for GenBackend {
    async fn submit(&self, request: &GenerationRequest, session: &Session) -> Result<TaskId, SubmitError> {
        let response = self.client
            .post(self.url("images/generate"))
            .bearer_auth(session.access_token())
            .json(request)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = response.status();
        if is_auth_rejection(status) {
            return Err(SubmitError::AuthExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Network(format!("Failed to parse response: {}", e)))?;

        body.into_task_id()
    }

    async fn query_status(&self, task_id: &TaskId, session: &Session) -> Result<StatusEnvelope, PollError> {
        let response = self.client
            .get(self.url(&format!("images/{}", task_id)))
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|e| PollError::Network(e.to_string()))?;

        let status = response.status();
        debug!(%task_id, %status, "status query answered");

        if is_auth_rejection(status) {
            return Err(PollError::AuthExpired);
        }
        if !status.is_success() {
            return Err(PollError::Network(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| PollError::Network(format!("Failed to parse response: {}", e)))
    }
}
