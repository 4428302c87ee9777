use serde::{Deserialize, Serialize};

use super::{Condition, find_condition, is_condition_true};

custom_resource! {
    /// Allows releasing snapshots of an application into a managed
    /// namespace.
    ReleasePlan {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "releaseplans",
        spec: ReleasePlanSpec,
        status: ReleasePlanStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlanSpec {
    pub application: String,
    /// The managed namespace releases are processed in.
    pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlanStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

custom_resource! {
    /// A request to release a snapshot through a release plan.
    Release {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "releases",
        spec: ReleaseSpec,
        status: ReleaseStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSpec {
    pub snapshot: String,
    pub release_plan: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// `namespace/name` of the pipeline run processing the release.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_pipeline_run: String,
}

impl Release {
    const SUCCEEDED: &'static str = "Succeeded";

    fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    /// Whether the release reached a final state, successful or not.
    pub fn is_done(&self) -> bool {
        find_condition(self.conditions(), Self::SUCCEEDED)
            .is_some_and(|condition| !condition.is_unknown())
    }

    pub fn has_succeeded(&self) -> bool {
        is_condition_true(self.conditions(), Self::SUCCEEDED)
    }
}
