//! The result of a single condition evaluation.

/// What a condition observed on one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check<E> {
    /// The awaited state has been reached.
    Done,
    /// The awaited state has not been reached yet. The poller evaluates the
    /// condition again after the next interval.
    Pending,
    /// The awaited state can never be reached. The poller stops and reports
    /// the error as is.
    Failed(E),
}

impl<E> Check<E> {
    /// `Done` when `done` is true, `Pending` otherwise.
    pub const fn from_done(done: bool) -> Self {
        if done { Self::Done } else { Self::Pending }
    }

    /// Maps the failure cause, leaving `Done` and `Pending` untouched.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Check<F> {
        match self {
            Self::Done => Check::Done,
            Self::Pending => Check::Pending,
            Self::Failed(error) => Check::Failed(f(error)),
        }
    }

    /// Returns `true` for [`Check::Pending`].
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` for [`Check::Done`].
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl<E> From<bool> for Check<E> {
    fn from(done: bool) -> Self {
        Self::from_done(done)
    }
}

/// The `(done, err)` convention: `Ok(true)` is done, `Ok(false)` keeps
/// polling, and any error is fatal.
impl<E> From<Result<bool, E>> for Check<E> {
    fn from(result: Result<bool, E>) -> Self {
        match result {
            Ok(done) => Self::from_done(done),
            Err(error) => Self::Failed(error),
        }
    }
}
