//! Read container logs.

use std::{ffi::OsStr, process::Stdio};

use tokio::process::Command;

use crate::{Result, util::run_command_output};

/// Fetch the logs of every container of `resource` in `namespace`, prefixed
/// with the pod and container name.
pub async fn fetch<Cmd, NS, R>(kubectl_command: Cmd, namespace: NS, resource: R) -> Result<String>
where
    Cmd: AsRef<OsStr>,
    NS: AsRef<OsStr>,
    R: AsRef<OsStr>,
{
    run_command_output(prepare_command(kubectl_command, namespace, resource)).await
}

fn prepare_command<Cmd, NS, R>(kubectl_command: Cmd, namespace: NS, resource: R) -> Command
where
    Cmd: AsRef<OsStr>,
    NS: AsRef<OsStr>,
    R: AsRef<OsStr>,
{
    let mut command = Command::new(kubectl_command);
    command.stdin(Stdio::null()).stderr(Stdio::inherit());
    command.arg("logs");
    command.arg("-n").arg(namespace);
    command.arg(resource);
    command.arg("--all-containers").arg("--prefix");
    command
}
