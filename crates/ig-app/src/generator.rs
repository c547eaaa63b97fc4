use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use ig_core::{GenerationRequest, PollSchedule, SessionProvider, SubmitError, TaskId};
use crate::events::GenEvent;
use crate::generator::backend::ImageApi;
use crate::generator::poller::{PollOutcome, TaskPoller};

pub mod backend;
pub mod poller;
#[cfg(test)]
pub(crate) mod testing;

/// The single in-flight poll sequence owned by a [`Generator`]
struct PollHandle {
    task_id: TaskId,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollHandle {
    fn cancel(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

/// Submits generation requests and drives at most one [`TaskPoller`].
///
/// Every state change is reported as a [`GenEvent`] on the channel returned
/// by [`Generator::new`]. Starting a new submission, calling
/// [`Generator::cancel`] or dropping the generator stops the previous
/// sequence before it can query again.
pub struct Generator {
    poller: TaskPoller,
    api: Arc<dyn ImageApi>,
    sessions: Arc<dyn SessionProvider>,
    events: UnboundedSender<GenEvent>,
    active: Option<PollHandle>,
}

impl Generator {
    pub fn new(
        api: Arc<dyn ImageApi>,
        sessions: Arc<dyn SessionProvider>,
        schedule: PollSchedule,
    ) -> (Self, UnboundedReceiver<GenEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let poller = TaskPoller::new(api.clone(), sessions.clone(), schedule);

        let generator = Self {
            poller,
            api,
            sessions,
            events,
            active: None,
        };
        (generator, rx)
    }

    pub async fn submit(&mut self, request: GenerationRequest) -> Result<TaskId, SubmitError> {
        self.cancel();
        self.emit(GenEvent::Submitting);

        let Some(session) = self.sessions.current_session() else {
            self.emit(GenEvent::SubmitFailed(SubmitError::AuthExpired));
            return Err(SubmitError::AuthExpired);
        };

        let task_id = match self.api.submit(&request, &session).await {
            Ok(task_id) => task_id,
            Err(e) => {
                self.emit(GenEvent::SubmitFailed(e.clone()));
                return Err(e);
            }
        };

        info!(%task_id, width = request.width(), height = request.height(), "generation submitted");
        self.emit(GenEvent::Submitted { task_id: task_id.clone() });
        self.active = Some(self.spawn_poll(task_id.clone()));

        Ok(task_id)
    }

    fn spawn_poll(&self, task_id: TaskId) -> PollHandle {
        let cancel = CancellationToken::new();
        let poller = self.poller.clone();
        let events = self.events.clone();

        let join = tokio::spawn({
            let task_id = task_id.clone();
            let cancel = cancel.clone();
            async move {
                let outcome = poller.run(&task_id, &cancel, &events).await;
                if cancel.is_cancelled() {
                    debug!(%task_id, "poll sequence cancelled");
                    return;
                }

                let event = match outcome {
                    PollOutcome::Completed(result) => GenEvent::Completed { task_id, result },
                    PollOutcome::Failed(error) => GenEvent::Failed { task_id, error },
                    PollOutcome::Cancelled => return,
                };
                let _ = events.send(event);
            }
        });

        PollHandle { task_id, cancel, join }
    }

    /// Stops the active poll sequence, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!(task_id = %handle.task_id, "cancelling poll sequence");
            handle.cancel();
        }
    }

    pub fn active_task(&self) -> Option<&TaskId> {
        self.active
            .as_ref()
            .filter(|h| !h.join.is_finished())
            .map(|h| &h.task_id)
    }

    pub fn is_polling(&self) -> bool {
        self.active_task().is_some()
    }

    fn emit(&self, event: GenEvent) {
        let _ = self.events.send(event);
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;
    use ig_core::{GenerationResult, PollError, SharedSession, StatusEnvelope};
    use crate::generator::testing::ScriptedApi;

    fn setup() -> (Arc<ScriptedApi>, SharedSession, Generator, UnboundedReceiver<GenEvent>) {
        let api = Arc::new(ScriptedApi::default());
        let sessions = SharedSession::default();
        sessions.sign_in("tok");
        let (generator, rx) = Generator::new(api.clone(), Arc::new(sessions.clone()), PollSchedule::default());
        (api, sessions, generator, rx)
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("a lighthouse at dusk", 512, 512).unwrap()
    }

    async fn next_terminal(rx: &mut UnboundedReceiver<GenEvent>) -> GenEvent {
        loop {
            let event = rx.recv().await.unwrap();
            if matches!(event, GenEvent::Completed { .. } | GenEvent::Failed { .. }) {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_and_complete() {
        let (api, _sessions, mut generator, mut rx) = setup();
        api.script(&TaskId::new("task-1"), [
            Ok(StatusEnvelope::pending()),
            Ok(StatusEnvelope::completed(["https://cdn/1.png"])),
        ]);

        let task_id = generator.submit(request()).await.unwrap();
        assert_eq!(task_id, TaskId::new("task-1"));
        assert!(generator.is_polling());

        assert_eq!(rx.recv().await, Some(GenEvent::Submitting));
        assert_eq!(rx.recv().await, Some(GenEvent::Submitted { task_id: task_id.clone() }));
        assert_eq!(
            next_terminal(&mut rx).await,
            GenEvent::Completed {
                task_id,
                result: GenerationResult { urls: vec!["https://cdn/1.png".into()] },
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_submission_supersedes_old_task() {
        let (api, _sessions, mut generator, mut rx) = setup();
        let old = generator.submit(request()).await.unwrap();

        // let the old task get one query in
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(api.query_count(&old), 1);

        let resubmitted_at = Instant::now();
        let new = generator.submit(request()).await.unwrap();
        assert_ne!(old, new);
        api.script(&new, [Ok(StatusEnvelope::completed(["https://cdn/new.png"]))]);

        let terminal = next_terminal(&mut rx).await;
        assert_eq!(terminal.task_id(), Some(&new));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(
            api.queries()
                .iter()
                .all(|(id, at)| id != &old || *at < resubmitted_at)
        );
        assert_eq!(api.query_count(&old), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let (api, _sessions, mut generator, _rx) = setup();
        let task_id = generator.submit(request()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(generator);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(api.query_count(&task_id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_emits_nothing_further() {
        let (_api, _sessions, mut generator, mut rx) = setup();
        generator.submit(request()).await.unwrap();
        generator.cancel();
        assert!(!generator.is_polling());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.recv().await, Some(GenEvent::Submitting));
        assert!(matches!(rx.recv().await, Some(GenEvent::Submitted { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_session() {
        let (api, sessions, mut generator, mut rx) = setup();
        sessions.sign_out();

        assert_eq!(generator.submit(request()).await, Err(SubmitError::AuthExpired));
        assert_eq!(rx.recv().await, Some(GenEvent::Submitting));
        assert_eq!(rx.recv().await, Some(GenEvent::SubmitFailed(SubmitError::AuthExpired)));
        assert!(api.queries().is_empty());
        assert!(!generator.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_rejected_by_backend() {
        let (api, _sessions, mut generator, _rx) = setup();
        api.fail_submissions(SubmitError::Http { status: 503, body: "busy".into() });

        assert!(matches!(generator.submit(request()).await, Err(SubmitError::Http { status: 503, .. })));
        assert!(!generator.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_expiry_mid_poll() {
        let (api, sessions, mut generator, mut rx) = setup();
        let task_id = generator.submit(request()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        sessions.sign_out();

        assert_eq!(
            next_terminal(&mut rx).await,
            GenEvent::Failed { task_id: task_id.clone(), error: PollError::AuthExpired }
        );
        assert_eq!(api.query_count(&task_id), 1);
    }
}
