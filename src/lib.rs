//! End-to-end test harness for the AppStudio application delivery platform.
//!
//! The harness drives a live cluster through its custom resources: it creates
//! applications, components, snapshots and releases, waits for the platform's
//! controllers and pipelines to act on them, and checks the outcome. Every
//! wait is a bounded poll built on [`wait_until`].
//!
//! Cluster access goes through one [`Cluster`] handle; the domain modules
//! ([`common`], [`has`], [`integration`], [`release`], [`tekton`],
//! [`sandbox`]) are stateless functions taking it by reference.

pub mod cluster;
pub mod common;
pub mod config;
pub mod crd;
pub mod error;
pub mod github;
pub mod has;
pub mod integration;
pub mod release;
pub mod sandbox;
pub mod tekton;
pub mod trace;
pub mod wait;

#[cfg(test)]
pub(crate) mod test_util;

pub use cluster::Cluster;
pub use config::E2eConfig;
pub use error::{Error, Result};
