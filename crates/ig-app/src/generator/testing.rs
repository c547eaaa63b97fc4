use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use tokio::time::Instant;
use ig_core::{GenerationRequest, PollError, Session, StatusEnvelope, SubmitError, TaskId};
use crate::generator::backend::ImageApi;

type Scripted = Result<StatusEnvelope, PollError>;

/// In-memory backend that hands out `task-1`, `task-2`, ... and replays
/// scripted status responses per task, recording when each query arrived.
#[derive(Default)]
pub struct ScriptedApi {
    scripts: Mutex<HashMap<TaskId, VecDeque<Scripted>>>,
    queries: Mutex<Vec<(TaskId, Instant)>>,
    submit_error: Mutex<Option<SubmitError>>,
    next_id: AtomicUsize,
}

impl ScriptedApi {
    pub fn script(&self, task_id: &TaskId, responses: impl IntoIterator<Item = Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(task_id.clone())
            .or_default()
            .extend(responses);
    }

    pub fn fail_submissions(&self, error: SubmitError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn queries(&self) -> Vec<(TaskId, Instant)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self, task_id: &TaskId) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == task_id)
            .count()
    }
}

#[async_trait]
impl ImageApi for ScriptedApi {
    async fn submit(&self, _request: &GenerationRequest, _session: &Session) -> Result<TaskId, SubmitError> {
        if let Some(e) = self.submit_error.lock().unwrap().clone() {
            return Err(e);
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TaskId::new(format!("task-{}", n)))
    }

    async fn query_status(&self, task_id: &TaskId, _session: &Session) -> Result<StatusEnvelope, PollError> {
        self.queries
            .lock()
            .unwrap()
            .push((task_id.clone(), Instant::now()));

        self.scripts
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok(StatusEnvelope::pending()))
    }
}
