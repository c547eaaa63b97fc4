use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u8 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Linear backoff: attempt `n` waits `n * base_delay` before its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub max_attempts: u8,
    pub base_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    pub ordinal: u8,
    pub delay: Duration,
}

impl PollSchedule {
    pub fn new(max_attempts: u8, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// `None` once the attempt budget is spent
    pub fn delay_before(&self, attempt: u8) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay * u32::from(attempt))
    }

    pub fn attempts(&self) -> impl Iterator<Item = PollAttempt> + '_ {
        (1..=self.max_attempts).filter_map(move |ordinal| {
            self.delay_before(ordinal)
                .map(|delay| PollAttempt { ordinal, delay })
        })
    }

    /// Worst-case wall time spent waiting for a task that never finishes
    pub fn total_budget(&self) -> Duration {
        self.attempts().map(|a| a.delay).sum()
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_delays_are_linear() {
        let delays: Vec<u64> = PollSchedule::default()
            .attempts()
            .map(|a| a.delay.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_out_of_range_attempts() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.delay_before(0), None);
        assert_eq!(schedule.delay_before(6), None);
        assert_eq!(schedule.delay_before(5), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_total_budget() {
        assert_eq!(PollSchedule::default().total_budget(), Duration::from_secs(15));
        let fast = PollSchedule::new(3, Duration::from_millis(100));
        assert_eq!(fast.total_budget(), Duration::from_millis(600));
    }
}
