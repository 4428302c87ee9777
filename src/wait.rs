//! Glue between [`wait_until`] and the harness error type.

use std::{
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use snafu::ResultExt;
use wait_until::{Check, Outcome, PollSpec};

use crate::{
    Error, Result,
    error::{PollConfigSnafu, WaitTimedOutSnafu},
};

/// Poll spacing and deadline of a wait.
pub fn spec(interval: Duration, timeout: Duration) -> Result<PollSpec> {
    PollSpec::new(interval, timeout).context(PollConfigSnafu)
}

/// The last state a condition observed, reported when a wait times out.
#[derive(Clone, Debug, Default)]
pub struct LastSeen(Arc<Mutex<String>>);

impl LastSeen {
    pub fn record(&self, state: impl Display) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state.to_string();
    }

    fn take(&self) -> String {
        let state =
            std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner));
        if state.is_empty() {
            "nothing observed".to_owned()
        } else {
            state
        }
    }
}

/// Poll `condition` until it is done.
///
/// A timeout becomes [`Error::WaitTimedOut`] naming `what` and the last state
/// the condition recorded, a failure is returned as is.
pub async fn wait_for<F, Fut>(what: &str, spec: PollSpec, mut condition: F) -> Result<()>
where
    F: FnMut(LastSeen) -> Fut,
    Fut: Future<Output = Check<Error>>,
{
    let seen = LastSeen::default();
    match wait_until::poll(spec, || condition(seen.clone())).await {
        Outcome::Success => Ok(()),
        Outcome::Failed(error) => Err(error),
        Outcome::TimedOut { elapsed } => WaitTimedOutSnafu {
            what,
            elapsed,
            last_state: seen.take(),
        }
        .fail(),
    }
}
