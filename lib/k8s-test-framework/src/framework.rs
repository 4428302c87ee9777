//! The test framework main entry point.

use std::time::Duration;

use super::{
    Interface, Result, logs, manifest, namespace, up_down, wait_for_resource, wait_for_rollout,
};

/// Framework wraps the interface to the system with an easy-to-use rust API
/// optimized for implementing test cases.
#[derive(Debug)]
pub struct Framework {
    interface: Interface,
}

impl Framework {
    /// Create a new [`Framework`] powered by the passed interface.
    pub const fn new(interface: Interface) -> Self {
        Self { interface }
    }

    /// Create a namespace that is removed when the returned guard drops.
    pub async fn namespace(
        &self,
        config: namespace::Config,
    ) -> Result<up_down::Manager<namespace::CommandBuilder>> {
        let mut manager = namespace::manager(&self.interface.kubectl_command, config);
        manager.up().await?;
        Ok(manager)
    }

    /// Apply a manifest that is deleted when the returned guard drops.
    pub async fn manifest(
        &self,
        config: manifest::Config,
    ) -> Result<up_down::Manager<manifest::CommandBuilder>> {
        let mut manager = manifest::manager(&self.interface.kubectl_command, config);
        manager.up().await?;
        Ok(manager)
    }

    /// Fetch the logs of every container of `resource` in `namespace`.
    pub async fn logs(&self, namespace: &str, resource: &str) -> Result<String> {
        logs::fetch(&self.interface.kubectl_command, namespace, resource).await
    }

    /// Wait for a set of `resources` in a specified `namespace` to achieve
    /// `wait_for` state.
    /// Use `extra` to pass additional arguments to `kubectl`.
    pub async fn wait<'a>(
        &self,
        namespace: &str,
        resources: impl IntoIterator<Item = &'a str>,
        wait_for: wait_for_resource::WaitFor<&'_ str>,
        extra: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        wait_for_resource::namespace(
            &self.interface.kubectl_command,
            namespace,
            resources,
            wait_for,
            extra,
        )
        .await
    }

    /// Wait for the rollout of `resource` in `namespace` to complete.
    pub async fn wait_for_rollout(
        &self,
        namespace: &str,
        resource: &str,
        timeout: Duration,
    ) -> Result<()> {
        wait_for_rollout::run(&self.interface.kubectl_command, namespace, resource, timeout).await
    }
}
