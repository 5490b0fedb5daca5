//! Host-independent timing.

use std::fmt;
use std::time::Duration;

/// Length of one game tick in milliseconds.
pub const MILLIS_PER_TICK: u64 = 50;

/// A delay or repeat interval, normalized to milliseconds.
///
/// [`Schedule::none`] means "never": as a delay it means no delay, as a repeat
/// interval it means the task runs once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Schedule {
    millis: Option<u64>,
}

impl Schedule {
    pub const fn none() -> Self {
        Self { millis: None }
    }

    pub const fn millis(millis: u64) -> Self {
        Self {
            millis: Some(millis),
        }
    }

    pub const fn ticks(ticks: u64) -> Self {
        Self::millis(ticks.saturating_mul(MILLIS_PER_TICK))
    }

    /// One tick from now.
    pub const fn next_tick() -> Self {
        Self::ticks(1)
    }

    pub const fn seconds(seconds: u64) -> Self {
        Self::millis(seconds.saturating_mul(1_000))
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self::seconds(minutes.saturating_mul(60))
    }

    pub const fn hours(hours: u64) -> Self {
        Self::minutes(hours.saturating_mul(60))
    }

    /// Durations longer than `u64::MAX` milliseconds saturate.
    pub fn duration(duration: Duration) -> Self {
        Self::millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub const fn is_none(&self) -> bool {
        self.millis.is_none()
    }

    /// Milliseconds, `0` for [`Schedule::none`].
    pub const fn to_millis(&self) -> u64 {
        match self.millis {
            Some(millis) => millis,
            None => 0,
        }
    }

    /// Ticks, rounded to the nearest tick with halves rounded up.
    pub const fn to_ticks(&self) -> u64 {
        self.to_millis().saturating_add(MILLIS_PER_TICK / 2) / MILLIS_PER_TICK
    }

    pub const fn to_duration(&self) -> Duration {
        Duration::from_millis(self.to_millis())
    }
}

impl From<Duration> for Schedule {
    fn from(duration: Duration) -> Self {
        Self::duration(duration)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.millis {
            Some(millis) => write!(f, "{millis}ms"),
            None => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(Schedule::ticks(2).to_millis(), 100);
        assert_eq!(Schedule::hours(1).to_duration(), Duration::from_secs(3600));
        assert_eq!(Schedule::minutes(1).to_duration(), Duration::from_secs(60));
        assert_eq!(Schedule::seconds(1).to_millis(), 1000);
        assert_eq!(Schedule::next_tick().to_millis(), MILLIS_PER_TICK);
        assert_eq!(Schedule::from(Duration::from_millis(250)).to_ticks(), 5);
    }

    #[test]
    fn test_ticks_round_half_up() {
        assert_eq!(Schedule::millis(120).to_ticks(), 2);
        assert_eq!(Schedule::millis(124).to_ticks(), 2);
        assert_eq!(Schedule::millis(125).to_ticks(), 3);
        assert_eq!(Schedule::millis(24).to_ticks(), 0);
        assert_eq!(Schedule::millis(25).to_ticks(), 1);
    }

    #[test]
    fn test_none() {
        let none = Schedule::none();
        assert!(none.is_none());
        assert_eq!(none, Schedule::default());
        assert_eq!(none.to_millis(), 0);
        assert!(!Schedule::millis(0).is_none());
        assert_eq!(none.to_string(), "none");
    }
}
