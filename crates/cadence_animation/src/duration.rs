//! Timeline durations and repeat policies

use std::time::Duration;

/// How long one iteration of a timeline lasts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineDuration {
    /// Derived: the configured default for animations, the longest child
    /// span for storyboards
    #[default]
    Automatic,
    /// Never completes
    Forever,
    Time(Duration),
}

impl TimelineDuration {
    pub fn from_millis(ms: u64) -> Self {
        TimelineDuration::Time(Duration::from_millis(ms))
    }

    pub fn from_secs(secs: u64) -> Self {
        TimelineDuration::Time(Duration::from_secs(secs))
    }

    pub fn time(&self) -> Option<Duration> {
        match self {
            TimelineDuration::Time(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<Duration> for TimelineDuration {
    fn from(duration: Duration) -> Self {
        TimelineDuration::Time(duration)
    }
}

/// How many times a timeline plays its duration before completing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatBehavior {
    /// A count of zero behaves as one
    Count(u32),
    Forever,
}

impl RepeatBehavior {
    pub fn count(n: u32) -> Self {
        RepeatBehavior::Count(n)
    }

    /// Number of iterations, `None` when unbounded
    pub fn iterations(&self) -> Option<u32> {
        match self {
            RepeatBehavior::Count(n) => Some((*n).max(1)),
            RepeatBehavior::Forever => None,
        }
    }

    /// Total span of `iterations` repeats of `duration`, `None` when unbounded
    pub(crate) fn active_span(&self, duration: Option<Duration>) -> Option<Duration> {
        let duration = duration?;
        if duration.is_zero() {
            return Some(Duration::ZERO);
        }
        duration.checked_mul(self.iterations()?)
    }
}

impl Default for RepeatBehavior {
    fn default() -> Self {
        RepeatBehavior::Count(1)
    }
}
