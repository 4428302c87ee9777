//! Wait for a workload rollout to complete.

use std::{ffi::OsStr, process::Stdio, time::Duration};

use tokio::process::Command;

use super::Result;
use crate::util::run_command;

/// Wait for the rollout of `resource` (for example
/// `deployment/integration-service-controller-manager`) in `namespace`.
///
/// `kubectl` gives up after `timeout`; a zero `timeout` waits forever.
pub async fn run<Cmd, NS, R>(
    kubectl_command: Cmd,
    namespace: NS,
    resource: R,
    timeout: Duration,
) -> Result<()>
where
    Cmd: AsRef<OsStr>,
    NS: AsRef<OsStr>,
    R: AsRef<OsStr>,
{
    run_command(build(kubectl_command, namespace, resource, timeout)).await
}

fn build<Cmd, NS, R>(kubectl_command: Cmd, namespace: NS, resource: R, timeout: Duration) -> Command
where
    Cmd: AsRef<OsStr>,
    NS: AsRef<OsStr>,
    R: AsRef<OsStr>,
{
    let mut command = Command::new(kubectl_command);

    command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    command.arg("rollout").arg("status");
    command.arg("-n").arg(namespace);
    command.arg(resource);
    command.arg(format!("--timeout={}s", timeout.as_secs()));
    command
}
