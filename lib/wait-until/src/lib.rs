//! Bounded polling of a condition over eventually-consistent external state.
//!
//! Every "wait for X" operation in the harness (a pipeline run finishing, a
//! repository appearing, a user signup completing) is the same loop with a
//! different condition: evaluate, and if the answer is not final yet, sleep
//! for the interval and try again, until the deadline passes.
//!
//! A condition reports one of three [`Check`] values. [`Check::Pending`] keeps
//! the loop going, [`Check::Done`] ends it with [`Outcome::Success`] and
//! [`Check::Failed`] ends it with [`Outcome::Failed`]. Whether an observed
//! error is transient or fatal is decided by the condition, never by the
//! poller.
//!
//! ```no_run
//! # async fn example() -> Result<(), wait_until::ConfigError> {
//! use std::time::Duration;
//! use wait_until::{poll, Check, Outcome, PollSpec};
//!
//! let spec = PollSpec::new(Duration::from_secs(2), Duration::from_secs(60))?;
//! let outcome = poll(spec, || async { Check::<std::io::Error>::Done }).await;
//! assert_eq!(outcome, Outcome::Success);
//! # Ok(())
//! # }
//! ```

mod check;
mod poll;
mod spec;

pub use check::Check;
pub use poll::{DEFAULT_INTERVAL, Outcome, PollError, poll, wait_until};
pub use spec::{ConfigError, PollSpec};
