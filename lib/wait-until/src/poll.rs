use std::{future::Future, time::Duration};

use snafu::Snafu;
use tokio::time::{Instant, sleep, sleep_until};

use crate::{Check, PollSpec};

/// Interval used by [`wait_until`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// How a poll operation ended. Exactly one is produced per [`poll`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<E> {
    /// The condition reported [`Check::Done`].
    Success,
    /// The deadline passed while the condition kept reporting
    /// [`Check::Pending`].
    TimedOut {
        /// Time spent polling, never less than the configured timeout.
        elapsed: Duration,
    },
    /// The condition reported [`Check::Failed`].
    Failed(E),
}

impl<E> Outcome<E> {
    /// Returns `true` for [`Outcome::Success`].
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts into a `Result`, the shape the callers propagate with `?`.
    pub fn into_result(self) -> Result<(), PollError<E>>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Success => Ok(()),
            Self::TimedOut { elapsed } => Err(PollError::TimedOut { elapsed }),
            Self::Failed(source) => Err(PollError::Failed { source }),
        }
    }
}

/// A poll operation that did not succeed.
#[derive(Debug, Snafu)]
pub enum PollError<E: std::error::Error + 'static> {
    /// The condition never reported done.
    #[snafu(display("condition not met after {}s", elapsed.as_secs_f64()))]
    TimedOut {
        /// Time spent polling.
        elapsed: Duration,
    },

    /// The condition reported an unrecoverable error.
    #[snafu(display("condition failed: {source}"))]
    Failed {
        /// The error reported by the condition.
        source: E,
    },
}

impl<E: std::error::Error + 'static> PollError<E> {
    /// Returns `true` when the deadline passed.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Evaluate `condition` until it is done, fails, or the deadline of `spec`
/// passes.
///
/// Evaluations are sequential and spaced by at least the interval. The sleep
/// before an evaluation is clamped to the deadline, and one last evaluation
/// happens at the deadline before [`Outcome::TimedOut`] is reported.
///
/// Dropping the returned future cancels the operation. A panic inside the
/// condition propagates to the caller.
pub async fn poll<F, Fut, C, E>(spec: PollSpec, mut condition: F) -> Outcome<E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = C>,
    C: Into<Check<E>>,
{
    let start = Instant::now();
    // A deadline past the end of the clock is no deadline.
    let deadline = spec.timeout().and_then(|timeout| start.checked_add(timeout));

    if !spec.is_immediate() {
        pause(&spec, Instant::now(), deadline).await;
    }

    loop {
        match condition().await.into() {
            Check::Done => return Outcome::Success,
            Check::Failed(error) => return Outcome::Failed(error),
            Check::Pending => {}
        }

        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Outcome::TimedOut {
                elapsed: now - start,
            };
        }
        pause(&spec, now, deadline).await;
    }
}

async fn pause(spec: &PollSpec, now: Instant, deadline: Option<Instant>) {
    let delay = spec.next_delay();
    match deadline {
        Some(deadline) => {
            let at = now
                .checked_add(delay)
                .map_or(deadline, |at| at.min(deadline));
            sleep_until(at).await;
        }
        None => sleep(delay).await,
    }
}

/// Poll `condition` once a second until `timeout`, evaluating immediately.
///
/// A zero `timeout` waits forever.
pub async fn wait_until<F, Fut, C, E>(condition: F, timeout: Duration) -> Result<(), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = C>,
    C: Into<Check<E>>,
    E: std::error::Error + 'static,
{
    poll(PollSpec::new_unchecked(DEFAULT_INTERVAL, timeout), condition)
        .await
        .into_result()
}
