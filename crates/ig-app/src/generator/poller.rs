use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ig_core::{GenerationResult, PollError, PollSchedule, SessionProvider, StatusClass, TaskId};
use crate::events::GenEvent;
use crate::generator::backend::ImageApi;

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(GenerationResult),
    Failed(PollError),
    Cancelled,
}

/// Queries one task until it settles or the attempt budget runs out.
///
/// Attempts are strictly sequential: the wait for attempt `n + 1` only starts
/// after the response to attempt `n` has been classified. Cancellation is
/// observed both during the wait and while a query is in flight.
#[derive(Clone)]
pub struct TaskPoller {
    api: Arc<dyn ImageApi>,
    sessions: Arc<dyn SessionProvider>,
    schedule: PollSchedule,
}

impl TaskPoller {
    pub fn new(api: Arc<dyn ImageApi>, sessions: Arc<dyn SessionProvider>, schedule: PollSchedule) -> Self {
        Self { api, sessions, schedule }
    }

    pub async fn run(
        &self,
        task_id: &TaskId,
        cancel: &CancellationToken,
        events: &UnboundedSender<GenEvent>,
    ) -> PollOutcome {
        for attempt in self.schedule.attempts() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(attempt.delay) => {}
            }

            let Some(session) = self.sessions.current_session() else {
                warn!(%task_id, attempt = attempt.ordinal, "session gone before status query");
                return PollOutcome::Failed(PollError::AuthExpired);
            };

            debug!(%task_id, attempt = attempt.ordinal, "querying task status");
            let _ = events.send(GenEvent::Attempt {
                task_id: task_id.clone(),
                attempt: attempt.ordinal,
                max_attempts: self.schedule.max_attempts,
            });

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                r = self.api.query_status(task_id, &session) => r,
            };

            let envelope = match response {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(%task_id, error = %e, "status query failed");
                    return PollOutcome::Failed(e);
                }
            };

            match envelope.classify() {
                StatusClass::Pending => continue,
                StatusClass::Completed(result) => {
                    info!(%task_id, images = result.urls.len(), "generation completed");
                    return PollOutcome::Completed(result);
                }
                StatusClass::Failed(reason) => {
                    warn!(%task_id, %reason, "generation failed");
                    return PollOutcome::Failed(PollError::BackendFailed(reason));
                }
                StatusClass::Malformed(reason) => {
                    warn!(%task_id, %reason, "malformed status response");
                    return PollOutcome::Failed(PollError::Network(reason));
                }
            }
        }

        warn!(%task_id, attempts = self.schedule.max_attempts, "task still pending, giving up");
        PollOutcome::Failed(PollError::Timeout {
            attempts: self.schedule.max_attempts,
        })
    }
}
