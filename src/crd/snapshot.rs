use serde::{Deserialize, Serialize};

use super::Condition;

custom_resource! {
    /// An immutable set of component images produced for an application.
    Snapshot {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "snapshots",
        spec: SnapshotSpec,
        status: SnapshotStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    pub application: String,
    #[serde(default)]
    pub components: Vec<SnapshotComponent>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotComponent {
    pub name: String,
    pub container_image: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

custom_resource! {
    /// Deploys a [`Snapshot`] of an application into an environment.
    SnapshotEnvironmentBinding {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "snapshotenvironmentbindings",
        spec: SnapshotEnvironmentBindingSpec,
        status: SnapshotEnvironmentBindingStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingSpec {
    pub application: String,
    pub environment: String,
    pub snapshot: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingStatus {
    #[serde(default)]
    pub component_deployment_conditions: Vec<Condition>,
}
