use serde::{Deserialize, Serialize};

use super::Condition;

custom_resource! {
    /// A deployment target for snapshots.
    Environment {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "environments",
        spec: EnvironmentSpec,
        status: EnvironmentStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    #[serde(rename = "type")]
    pub type_: String,
    pub display_name: String,
    pub deployment_strategy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_environment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub configuration: EnvironmentConfiguration,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfiguration {
    #[serde(default)]
    pub env: Vec<EnvVarPair>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvVarPair {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}
