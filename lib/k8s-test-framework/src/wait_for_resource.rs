//! Wait for resources to reach a state, through `kubectl wait`.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    process::Stdio,
};

use tokio::process::Command;

use super::Result;
use crate::util::run_command;

/// The state `kubectl wait` blocks on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFor<C>
where
    C: fmt::Display,
{
    /// Wait until the resources are gone.
    Delete,
    /// Wait until the named status condition is `True`.
    Condition(C),
    /// Wait until a JSONPath expression matches a value, for example
    /// `{.status.phase}=Running`.
    JsonPath(C),
}

impl<C: fmt::Display> WaitFor<C> {
    fn to_arg(&self) -> OsString {
        match self {
            Self::Delete => "--for=delete".into(),
            Self::Condition(condition) => format!("--for=condition={condition}").into(),
            Self::JsonPath(expression) => format!("--for=jsonpath={expression}").into(),
        }
    }
}

/// Wait for `resources` in `namespace`.
/// Use `extra` to pass additional arguments to `kubectl`.
pub async fn namespace<Cmd, NS, R, Cond, Ex>(
    kubectl_command: Cmd,
    namespace: NS,
    resources: impl IntoIterator<Item = R>,
    wait_for: WaitFor<Cond>,
    extra: impl IntoIterator<Item = Ex>,
) -> Result<()>
where
    Cmd: AsRef<OsStr>,
    NS: AsRef<OsStr>,
    R: AsRef<OsStr>,
    Cond: fmt::Display,
    Ex: AsRef<OsStr>,
{
    let mut command = prepare_base_command(kubectl_command, resources, wait_for, extra);
    command.arg("-n").arg(namespace);
    run_command(command).await
}

fn prepare_base_command<Cmd, R, Cond, Ex>(
    kubectl_command: Cmd,
    resources: impl IntoIterator<Item = R>,
    wait_for: WaitFor<Cond>,
    extra: impl IntoIterator<Item = Ex>,
) -> Command
where
    Cmd: AsRef<OsStr>,
    R: AsRef<OsStr>,
    Cond: fmt::Display,
    Ex: AsRef<OsStr>,
{
    let mut command = Command::new(kubectl_command);

    command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    command.arg("wait");
    command.args(resources);
    command.arg(wait_for.to_arg());
    command.args(extra);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn condition_wait() {
        let command = prepare_base_command(
            "kubectl",
            ["pods/build-1", "pods/build-2"],
            WaitFor::Condition("Ready"),
            ["--timeout=60s"],
        );
        assert_eq!(
            args(&command),
            vec![
                "wait",
                "pods/build-1",
                "pods/build-2",
                "--for=condition=Ready",
                "--timeout=60s"
            ]
        );
    }

    #[test]
    fn delete_and_jsonpath_flags() {
        assert_eq!(WaitFor::<&str>::Delete.to_arg(), "--for=delete");
        assert_eq!(
            WaitFor::JsonPath("{.status.phase}=Running").to_arg(),
            "--for=jsonpath={.status.phase}=Running"
        );
    }
}
