//! How the framework reaches the cluster.

use std::env;

use crate::{InvalidEnvSnafu, Result};

/// Environment variable naming the `kubectl` binary to use.
pub const KUBECTL_ENV: &str = "APPSTUDIO_E2E_KUBECTL";

/// The commands used to talk to the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// A `kubectl` (or `oc`) binary.
    pub kubectl_command: String,
}

impl Interface {
    /// Read the interface from the environment, falling back to `kubectl`
    /// from `PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let kubectl_command = match lookup(KUBECTL_ENV) {
            None => "kubectl".to_owned(),
            Some(value) if value.trim().is_empty() => {
                return InvalidEnvSnafu {
                    name: KUBECTL_ENV,
                    reason: "must not be empty",
                }
                .fail();
            }
            Some(value) => value,
        };
        Ok(Self { kubectl_command })
    }
}
