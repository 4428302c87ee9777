//! Kubernetes fixtures for end-to-end tests, driven through `kubectl`.
//!
//! Everything created here is owned by an [`up_down::Manager`] guard: the
//! resource is brought up when the guard is created and torn down when it is
//! dropped, even if the test fails half way through.
//!
//! ```no_run
//! # async fn example() -> k8s_test_framework::Result<()> {
//! use k8s_test_framework::{Framework, Interface, lock, namespace};
//!
//! let _guard = lock();
//! let framework = Framework::new(Interface::from_env()?);
//! let _namespace = framework
//!     .namespace(namespace::Config::from_namespace(&namespace::make_namespace(
//!         "appstudio-e2e-demo".to_owned(),
//!         None,
//!     ))?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::{
    process::ExitStatus,
    sync::{Mutex, MutexGuard},
};

use snafu::Snafu;

pub mod framework;
pub mod interface;
pub mod logs;
pub mod manifest;
pub mod namespace;
mod resource_file;
pub mod up_down;
mod util;
pub mod wait_for_resource;
pub mod wait_for_rollout;

pub use framework::Framework;
pub use interface::Interface;
pub use resource_file::ResourceFile;

/// Errors produced while driving `kubectl`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The command could not be started or waited for.
    #[snafu(display("failed to run {command}: {source}"))]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[snafu(display("{command} exited with {status}"))]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status of the process.
        status: ExitStatus,
    },

    /// The command printed something that is not UTF-8.
    #[snafu(display("output of {command} is not valid UTF-8"))]
    Output {
        /// Rendered command line.
        command: String,
        /// Decoding error.
        source: std::string::FromUtf8Error,
    },

    /// A manifest file could not be written.
    #[snafu(display("failed to write resource file: {source}"))]
    ResourceFile {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A typed object could not be rendered as a manifest.
    #[snafu(display("failed to serialize manifest: {source}"))]
    Serialize {
        /// Serialization error.
        source: serde_json::Error,
    },

    /// A required environment variable held something unusable.
    #[snafu(display("invalid value for {name}: {reason}"))]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Fixture result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that share the cluster.
///
/// A test that panicked while holding the lock does not poison it for the
/// rest of the run.
pub fn lock() -> MutexGuard<'static, ()> {
    match TEST_LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
