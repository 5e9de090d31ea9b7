//! Poll scheduling policy.

use std::time::Duration;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const MINIMUM_PERIOD: Duration = Duration::from_millis(1);

/// How often a service is probed and how long one probe may take.
///
/// Both values are always finite and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    probe_timeout: Duration,
}

impl PollPolicy {
    /// Creates a policy; zero durations are raised to one millisecond.
    #[must_use]
    pub fn new(interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            interval: interval.max(MINIMUM_PERIOD),
            probe_timeout: probe_timeout.max(MINIMUM_PERIOD),
        }
    }

    /// Returns the delay between the start of two probe cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the bound after which a stalled probe counts as unavailable.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_PROBE_TIMEOUT)
    }
}
