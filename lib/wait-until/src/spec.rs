use std::time::Duration;

use snafu::{Snafu, ensure};

/// An invalid [`PollSpec`], reported before anything is evaluated.
#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum ConfigError {
    /// The poll interval was zero.
    #[snafu(display("poll interval must be greater than zero"))]
    ZeroInterval,

    /// The jitter factor was negative, infinite or NaN.
    #[snafu(display("jitter factor must be finite and non-negative, got {factor}"))]
    InvalidJitter {
        /// The rejected factor.
        factor: f64,
    },
}

/// Timing of a single poll operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSpec {
    interval: Duration,
    timeout: Option<Duration>,
    immediate: bool,
    jitter: f64,
}

impl PollSpec {
    /// Poll every `interval` until `timeout` elapses.
    ///
    /// A zero `timeout` means there is no deadline: the operation ends only
    /// when the condition is done or fails. Prefer [`PollSpec::forever`] to
    /// make that choice visible at the call site.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, ConfigError> {
        ensure!(!interval.is_zero(), ZeroIntervalSnafu);
        Ok(Self::new_unchecked(interval, timeout))
    }

    /// Poll every `interval` with no deadline.
    pub fn forever(interval: Duration) -> Result<Self, ConfigError> {
        Self::new(interval, Duration::ZERO)
    }

    pub(crate) const fn new_unchecked(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout: if timeout.is_zero() {
                None
            } else {
                Some(timeout)
            },
            immediate: true,
            jitter: 0.0,
        }
    }

    /// Whether the first evaluation happens right away (the default) or
    /// after one interval.
    #[must_use]
    pub const fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Stretch every sleep by a random amount of up to `factor * interval`.
    ///
    /// Sleeps never get shorter than the interval.
    pub fn jitter(mut self, factor: f64) -> Result<Self, ConfigError> {
        ensure!(
            factor.is_finite() && factor >= 0.0,
            InvalidJitterSnafu { factor }
        );
        self.jitter = factor;
        Ok(self)
    }

    /// The minimum spacing between evaluations.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// The deadline, `None` when polling forever.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the first evaluation skips the initial sleep.
    pub const fn is_immediate(&self) -> bool {
        self.immediate
    }

    pub(crate) fn next_delay(&self) -> Duration {
        if self.jitter == 0.0 {
            return self.interval;
        }
        let extra = self.interval.as_secs_f64() * rand::random::<f64>() * self.jitter;
        self.interval
            .saturating_add(Duration::try_from_secs_f64(extra).unwrap_or(Duration::MAX))
    }
}
