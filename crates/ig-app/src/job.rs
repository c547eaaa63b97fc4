/// Lifecycle of one generation as seen by the form.
///
/// `Polling` is the only state that advances on a timer; every terminal
/// state leaves the form ready for the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Submitting,
    Polling { attempt: u8, max_attempts: u8 },
    Completed,
    Failed,
    TimedOut,
    AuthExpired,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut | Self::AuthExpired)
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::Idle => "·",
            Self::Submitting => "📤",
            Self::Polling { .. } => "⏳",
            Self::Completed => "✅",
            Self::Failed => "❌",
            Self::TimedOut => "⌛",
            Self::AuthExpired => "🔒",
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Idle => "Ready".to_string(),
            Self::Submitting => "Generating...".to_string(),
            Self::Polling { attempt: 0, .. } => "Waiting for the first status check".to_string(),
            Self::Polling { attempt, max_attempts } => {
                format!("Checking status ({}/{})", attempt, max_attempts)
            }
            Self::Completed => "Done".to_string(),
            Self::Failed => "Failed".to_string(),
            Self::TimedOut => "Timed out".to_string(),
            Self::AuthExpired => "Sign in required".to_string(),
        }
    }
}
