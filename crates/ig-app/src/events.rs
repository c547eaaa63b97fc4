use ig_core::{GenerationResult, PollError, SubmitError, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum GenEvent {
    Submitting,
    SubmitFailed(SubmitError),
    Submitted {
        task_id: TaskId,
    },
    Attempt {
        task_id: TaskId,
        attempt: u8,
        max_attempts: u8,
    },
    Completed {
        task_id: TaskId,
        result: GenerationResult,
    },
    Failed {
        task_id: TaskId,
        error: PollError,
    },
}

impl GenEvent {
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Submitted { task_id }
            | Self::Attempt { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. } => Some(task_id),
            Self::Submitting | Self::SubmitFailed(_) => None,
        }
    }
}
