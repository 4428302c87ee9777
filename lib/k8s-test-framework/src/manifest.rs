//! Arbitrary manifests applied for the lifetime of a test.

use std::process::{Command, Stdio};

use serde::Serialize;
use snafu::ResultExt;

use crate::{Result, ResourceFile, SerializeSnafu, up_down};

/// One or more resources to apply, optionally pinned to a namespace.
#[derive(Debug)]
pub struct Config {
    namespace: Option<String>,
    description: String,
    custom_resource_file: ResourceFile,
}

impl Config {
    /// Use raw manifest text, possibly holding several YAML documents.
    pub fn from_resource_string(resource: &str) -> Result<Self> {
        Ok(Self {
            namespace: None,
            description: "manifest".to_owned(),
            custom_resource_file: ResourceFile::new(resource)?,
        })
    }

    /// Render a typed object, such as a k8s-openapi resource or a custom
    /// resource with `apiVersion` and `kind` set.
    pub fn from_object<T: Serialize>(object: &T) -> Result<Self> {
        let value = serde_json::to_value(object).context(SerializeSnafu)?;
        let description = match (value["kind"].as_str(), value["metadata"]["name"].as_str()) {
            (Some(kind), Some(name)) => format!("{}/{name}", kind.to_lowercase()),
            (Some(kind), None) => kind.to_lowercase(),
            _ => "manifest".to_owned(),
        };
        Ok(Self {
            namespace: None,
            description,
            custom_resource_file: ResourceFile::from_object(&value)?,
        })
    }

    /// Apply into `namespace` instead of the one in the manifest.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Applies the manifest on up and deletes it on down.
#[derive(Debug)]
pub struct CommandBuilder {
    kubectl_command: String,
    config: Config,
}

impl up_down::CommandBuilder for CommandBuilder {
    fn build(&self, command_to_build: up_down::CommandToBuild) -> Command {
        let mut command = Command::new(&self.kubectl_command);
        command.stdin(Stdio::null());
        if let Some(namespace) = &self.config.namespace {
            command.arg("-n").arg(namespace);
        }
        match command_to_build {
            up_down::CommandToBuild::Up => command.arg("apply"),
            up_down::CommandToBuild::Down => command.arg("delete").arg("--ignore-not-found"),
        };
        command.arg("-f").arg(self.config.custom_resource_file.path());
        command
    }

    fn describe(&self) -> String {
        match &self.config.namespace {
            Some(namespace) => format!("{} in {namespace}", self.config.description),
            None => self.config.description.clone(),
        }
    }
}

/// Manage a manifest through `kubectl_command`.
pub fn manager(kubectl_command: &str, config: Config) -> up_down::Manager<CommandBuilder> {
    up_down::Manager::new(CommandBuilder {
        kubectl_command: kubectl_command.to_owned(),
        config,
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use k8s_openapi::{api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta};

    use super::*;
    use crate::up_down::CommandBuilder as _;

    const SCENARIO: &str = indoc! {r#"
        apiVersion: appstudio.redhat.com/v1alpha1
        kind: IntegrationTestScenario
        metadata:
          name: example-pass
        spec:
          application: demo
          contexts:
            - name: application
    "#};

    #[test]
    fn raw_manifest_in_namespace() {
        let config = Config::from_resource_string(SCENARIO)
            .unwrap()
            .in_namespace("e2e-demo");
        assert_eq!(
            std::fs::read_to_string(config.custom_resource_file.path()).unwrap(),
            SCENARIO
        );

        let manager = manager("oc", config);
        let up = manager.builder().build(up_down::CommandToBuild::Up);
        let args: Vec<_> = up.get_args().map(|arg| arg.to_string_lossy()).collect();
        assert_eq!(&args[..3], ["-n", "e2e-demo", "apply"]);
        assert_eq!(manager.builder().describe(), "manifest in e2e-demo");
    }

    #[test]
    fn typed_object_description() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("quay-push".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        };
        let manager = manager("kubectl", Config::from_object(&secret).unwrap());
        assert_eq!(manager.builder().describe(), "secret/quay-push");

        let down = manager.builder().build(up_down::CommandToBuild::Down);
        let args: Vec<_> = down.get_args().map(|arg| arg.to_string_lossy()).collect();
        assert_eq!(&args[..2], ["delete", "--ignore-not-found"]);
    }
}
