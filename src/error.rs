use std::time::Duration;

use snafu::Snafu;

/// Errors raised by the harness while driving the platform.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to build a Kubernetes client: {source}"))]
    ClientSetup { source: kube::Error },

    #[snafu(display("Kubernetes API call failed ({action}): {source}"))]
    Kube { action: String, source: kube::Error },

    #[snafu(display("{kind} {name:?} not found in namespace {namespace:?}"))]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[snafu(display("Pipeline run {name} failed: {reason}\n{logs}"))]
    PipelineFailed {
        name: String,
        reason: String,
        logs: String,
    },

    #[snafu(display("{what} failed: {message}"))]
    ConditionFailed { what: String, message: String },

    #[snafu(display(
        "Timed out after {} waiting for {what}; last observed state: {last_state}",
        humantime::format_duration(*elapsed)
    ))]
    WaitTimedOut {
        what: String,
        elapsed: Duration,
        last_state: String,
    },

    #[snafu(display("Invalid poll settings: {source}"))]
    PollConfig { source: wait_until::ConfigError },

    #[snafu(display("GitHub request failed ({action}): {source}"))]
    GitHub {
        action: String,
        source: reqwest::Error,
    },

    #[snafu(display("GitHub answered {status} ({action}): {body}"))]
    GitHubStatus {
        action: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[snafu(display("Unable to decode {what}: {source}"))]
    Decode {
        what: &'static str,
        source: base64::DecodeError,
    },

    #[snafu(display("Unable to parse devfile: {source}"))]
    Devfile { source: serde_yaml::Error },

    #[snafu(display("Invalid value for {name}: {reason}"))]
    InvalidConfig { name: &'static str, reason: String },

    #[snafu(display("Unable to encode {what}: {source}"))]
    Encode {
        what: &'static str,
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether the API server answered with `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube { source, .. } => is_status(source, 404),
            _ => false,
        }
    }

    /// Whether the API server answered with `409 Conflict` on create.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Kube { source, .. } if is_status(source, 409))
    }
}

pub(crate) fn is_status(error: &kube::Error, code: u16) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == code)
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
