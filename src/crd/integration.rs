use serde::{Deserialize, Serialize};

use super::Condition;

custom_resource! {
    /// A test pipeline run against every snapshot of an application.
    IntegrationTestScenario {
        group: "appstudio.redhat.com",
        version: "v1beta1",
        plural: "integrationtestscenarios",
        spec: IntegrationTestScenarioSpec,
        status: ScenarioStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationTestScenarioSpec {
    pub application: String,
    pub resolver_ref: ResolverRef,
}

/// Where the test pipeline definition is fetched from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverRef {
    pub resolver: String,
    #[serde(default)]
    pub params: Vec<ResolverParameter>,
}

impl ResolverRef {
    /// A git resolver reference to `path_in_repo` at `revision` of `url`.
    pub fn git(url: &str, revision: &str, path_in_repo: &str) -> Self {
        let param = |name: &str, value: &str| ResolverParameter {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        Self {
            resolver: "git".to_owned(),
            params: vec![
                param("url", url),
                param("revision", revision),
                param("pathInRepo", path_in_repo),
            ],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverParameter {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}
