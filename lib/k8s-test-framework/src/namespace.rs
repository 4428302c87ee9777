//! Throwaway namespaces.

use std::{
    collections::BTreeMap,
    process::{Command, Stdio},
};

use k8s_openapi::{api::core::v1::Namespace, apimachinery::pkg::apis::meta::v1::ObjectMeta};

use crate::{Result, ResourceFile, up_down};

/// A namespace manifest ready to be applied.
#[derive(Debug)]
pub struct Config {
    name: String,
    custom_resource_file: ResourceFile,
}

impl Config {
    /// Render a typed namespace.
    pub fn from_namespace(namespace: &Namespace) -> Result<Self> {
        Ok(Self {
            name: namespace.metadata.name.clone().unwrap_or_default(),
            custom_resource_file: ResourceFile::from_object(namespace)?,
        })
    }

    /// Name of the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Creates the namespace on up and deletes it, without waiting for
/// finalizers, on down.
#[derive(Debug)]
pub struct CommandBuilder {
    kubectl_command: String,
    config: Config,
}

impl up_down::CommandBuilder for CommandBuilder {
    fn build(&self, command_to_build: up_down::CommandToBuild) -> Command {
        let mut command = Command::new(&self.kubectl_command);
        command.stdin(Stdio::null());
        match command_to_build {
            up_down::CommandToBuild::Up => {
                command.arg("apply");
            }
            up_down::CommandToBuild::Down => {
                command
                    .arg("delete")
                    .arg("--ignore-not-found")
                    .arg("--wait=false");
            }
        }
        command.arg("-f").arg(self.config.custom_resource_file.path());
        command
    }

    fn describe(&self) -> String {
        format!("namespace/{}", self.config.name)
    }
}

/// Manage a namespace through `kubectl_command`.
pub fn manager(kubectl_command: &str, config: Config) -> up_down::Manager<CommandBuilder> {
    up_down::Manager::new(CommandBuilder {
        kubectl_command: kubectl_command.to_owned(),
        config,
    })
}

/// Build a namespace object with optional labels.
pub fn make_namespace(name: String, labels: Option<BTreeMap<String, String>>) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name),
            labels,
            ..ObjectMeta::default()
        },
        spec: None,
        status: None,
    }
}
