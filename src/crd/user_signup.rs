use serde::{Deserialize, Serialize};

use super::Condition;

custom_resource! {
    /// A developer sandbox user registration.
    UserSignup {
        group: "toolchain.dev.openshift.com",
        version: "v1alpha1",
        plural: "usersignups",
        spec: UserSignupSpec,
        status: UserSignupStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSignupSpec {
    pub userid: String,
    pub username: String,
    /// For example `approved`, `deactivated`.
    #[serde(default)]
    pub states: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSignupStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compliant_username: String,
}
