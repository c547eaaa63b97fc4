pub mod error;
pub mod request;
pub mod schedule;
pub mod session;
pub mod task;

pub use error::{PollError, RequestError, SubmitError};
pub use request::GenerationRequest;
pub use schedule::{PollAttempt, PollSchedule};
pub use session::{Session, SessionProvider, SharedSession};
pub use task::{GenerationResult, ImageRef, StatusClass, StatusEnvelope, SubmitResponse, TaskId, TaskStatus};
