use std::future::Future;
use tokio::sync::mpsc::UnboundedReceiver;
use ig_core::request::DEFAULT_DIMENSION;
use ig_core::{GenerationRequest, PollError, RequestError, SubmitError, TaskId};
use crate::events::GenEvent;
use crate::generator::Generator;
use crate::job::JobStatus;

const GENERIC_FAILURE: &str = "Something went wrong while generating the image. Please try again.";
const TIMEOUT_MESSAGE: &str = "Generation is taking longer than expected. Please try again later.";
const REAUTH_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// The image generation form: user inputs plus everything reconciled from
/// [`GenEvent`]s.
#[derive(Debug, Clone)]
pub struct FormState {
    pub prompt: String,
    pub width: u32,
    pub height: u32,

    pub status: JobStatus,
    pub active_task: Option<TaskId>,
    pub images: Vec<String>,
    pub message: Option<String>,
    pub needs_login: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            status: JobStatus::Idle,
            active_task: None,
            images: Vec::new(),
            message: None,
            needs_login: false,
        }
    }
}

impl FormState {
    pub fn request(&self) -> Result<GenerationRequest, RequestError> {
        GenerationRequest::new(&self.prompt, self.width, self.height)
    }

    /// The submit button is disabled while a task is in flight
    pub fn is_enabled(&self) -> bool {
        !self.status.is_active()
    }

    /// Events for any task other than the one adopted from the latest
    /// `Submitted` are dropped, so a superseded task cannot overwrite state.
    pub fn apply(&mut self, event: GenEvent) {
        let stale = match &event {
            GenEvent::Submitted { .. } => self.status != JobStatus::Submitting,
            other => other
                .task_id()
                .is_some_and(|id| self.active_task.as_ref() != Some(id)),
        };
        if stale {
            return;
        }

        match event {
            GenEvent::Submitting => {
                self.status = JobStatus::Submitting;
                self.active_task = None;
                self.message = None;
                self.needs_login = false;
            }
            GenEvent::SubmitFailed(error) => {
                self.active_task = None;
                if error == SubmitError::AuthExpired {
                    self.expire_session();
                } else {
                    self.status = JobStatus::Failed;
                    self.message = Some(GENERIC_FAILURE.to_string());
                }
            }
            GenEvent::Submitted { task_id } => {
                self.active_task = Some(task_id);
                self.status = JobStatus::Polling { attempt: 0, max_attempts: 0 };
            }
            GenEvent::Attempt { attempt, max_attempts, .. } => {
                self.status = JobStatus::Polling { attempt, max_attempts };
            }
            GenEvent::Completed { result, .. } => {
                self.active_task = None;
                self.status = JobStatus::Completed;
                self.images = result.urls;
            }
            GenEvent::Failed { error, .. } => {
                self.active_task = None;
                match error {
                    PollError::AuthExpired => self.expire_session(),
                    PollError::Timeout { .. } => {
                        self.status = JobStatus::TimedOut;
                        self.message = Some(TIMEOUT_MESSAGE.to_string());
                    }
                    PollError::BackendFailed(reason) => {
                        self.status = JobStatus::Failed;
                        self.message = Some(format!("Image generation failed: {}", reason));
                    }
                    PollError::Network(_) => {
                        self.status = JobStatus::Failed;
                        self.message = Some(GENERIC_FAILURE.to_string());
                    }
                }
            }
        }
    }

    /// Applies events until the task settles, calling `on_update` after each.
    ///
    /// `interrupt` is polled for the whole run, including while an event is
    /// being applied. Returns `false` if it fired first, after cancelling the
    /// generator's active sequence.
    pub async fn drive<F, U>(
        &mut self,
        generator: &mut Generator,
        events: &mut UnboundedReceiver<GenEvent>,
        interrupt: F,
        mut on_update: U,
    ) -> bool
    where
        F: Future,
        U: FnMut(&FormState),
    {
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { return true };
                    self.apply(event);
                    on_update(&*self);
                    if self.status.is_terminal() {
                        return true;
                    }
                }
                _ = &mut interrupt => {
                    generator.cancel();
                    return false;
                }
            }
        }
    }

    fn expire_session(&mut self) {
        self.status = JobStatus::AuthExpired;
        self.needs_login = true;
        self.message = Some(REAUTH_MESSAGE.to_string());
    }
}
