//! Typed models of the platform's custom resources.
//!
//! Only the fields the harness reads or writes are modelled; everything else
//! is ignored on deserialization. Every type gets a [`kube::Resource`]
//! implementation so it can be used with [`kube::Api`].

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};

/// Label and annotation keys set by the platform's controllers.
pub mod labels {
    pub const BUILD_PIPELINE_RUN: &str = "appstudio.openshift.io/build-pipelinerun";
    pub const COMPONENT: &str = "appstudio.openshift.io/component";
    pub const APPLICATION: &str = "appstudio.openshift.io/application";
    pub const SNAPSHOT: &str = "appstudio.openshift.io/snapshot";
    pub const PIPELINE_TYPE: &str = "pipelines.appstudio.openshift.io/type";
    pub const TEST_SCENARIO: &str = "test.appstudio.openshift.io/scenario";
    pub const TEST_TYPE: &str = "test.appstudio.openshift.io/type";
    pub const TEST_OPTIONAL: &str = "test.appstudio.openshift.io/optional";
    pub const PAC_EVENT_TYPE: &str = "pac.test.appstudio.openshift.io/event-type";
    pub const PAC_SHA: &str = "pipelinesascode.tekton.dev/sha";
    pub const BUILD_COMPONENT: &str = "build.appstudio.openshift.io/component";
    pub const BUILD_APPLICATION: &str = "build.appstudio.openshift.io/application";
    pub const RELEASE_NAME: &str = "release.appstudio.openshift.io/name";
    pub const RELEASE_NAMESPACE: &str = "release.appstudio.openshift.io/namespace";
    pub const AUTO_RELEASE: &str = "release.appstudio.openshift.io/auto-release";
    pub const ATTRIBUTION: &str = "release.appstudio.openshift.io/attribution";
    pub const ARGOCD_MANAGED_BY: &str = "argocd.argoproj.io/managed-by";
}

/// A status condition, as reported both by the platform's controllers and
/// by Tekton.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// A condition with status `True`.
    pub fn truthy(type_: &str, reason: &str, message: &str) -> Self {
        Self {
            type_: type_.to_owned(),
            status: "True".to_owned(),
            reason: reason.to_owned(),
            message: message.to_owned(),
            ..Self::default()
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == "True"
    }

    pub fn is_unknown(&self) -> bool {
        self.status == "Unknown"
    }
}

/// The condition of the given type, if reported.
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|condition| condition.type_ == type_)
}

/// Whether the condition of the given type is reported with status `True`.
pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_condition(conditions, type_).is_some_and(Condition::is_true)
}

/// Insert or update a condition.
///
/// The transition time only moves when the status changes, and is set to
/// now when the new condition does not carry one.
pub fn set_condition(conditions: &mut Vec<Condition>, mut new: Condition) {
    let now = || Time(Utc::now());
    match conditions
        .iter_mut()
        .find(|condition| condition.type_ == new.type_)
    {
        Some(existing) => {
            if existing.status != new.status {
                existing.status = new.status;
                existing.last_transition_time = new.last_transition_time.or_else(|| Some(now()));
            }
            existing.reason = new.reason;
            existing.message = new.message;
            existing.observed_generation = new.observed_generation;
        }
        None => {
            if new.last_transition_time.is_none() {
                new.last_transition_time = Some(now());
            }
            conditions.push(new);
        }
    }
}

/// Declares a namespaced custom resource with `spec` and `status`.
macro_rules! custom_resource {
    (
        $(#[$attr:meta])*
        $name:ident {
            group: $group:literal,
            version: $version:literal,
            plural: $plural:literal,
            spec: $spec:ty,
            status: $status:ty $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            #[serde(default)]
            pub api_version: String,
            #[serde(default)]
            pub kind: String,
            #[serde(default)]
            pub metadata: ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta,
            #[serde(default)]
            pub spec: $spec,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub status: Option<$status>,
        }

        impl $name {
            pub const KIND: &'static str = stringify!($name);
            pub const API_VERSION: &'static str = concat!($group, "/", $version);

            /// A new object named `name` in `namespace`.
            pub fn new(name: &str, namespace: &str, spec: $spec) -> Self {
                Self::with_metadata(
                    ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                        name: Some(name.to_owned()),
                        namespace: Some(namespace.to_owned()),
                        ..Default::default()
                    },
                    spec,
                )
            }

            /// A new object with fully specified metadata, for example one
            /// using `generateName`.
            pub fn with_metadata(
                metadata: ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta,
                spec: $spec,
            ) -> Self {
                Self {
                    api_version: Self::API_VERSION.to_owned(),
                    kind: Self::KIND.to_owned(),
                    metadata,
                    spec,
                    status: None,
                }
            }
        }

        impl ::kube::Resource for $name {
            type DynamicType = ();
            type Scope = ::k8s_openapi::NamespaceResourceScope;

            fn kind(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed(stringify!($name))
            }

            fn group(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($group)
            }

            fn version(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($version)
            }

            fn plural(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($plural)
            }

            fn meta(&self) -> &::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(
                &mut self,
            ) -> &mut ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &mut self.metadata
            }
        }
    };
}

mod application;
mod environment;
mod integration;
mod pipeline_run;
mod release;
mod snapshot;
mod user_signup;

pub use application::{
    Application, ApplicationSpec, ApplicationStatus, Component, ComponentSource, ComponentSpec,
    ComponentStatus, GitSource,
};
pub use environment::{
    EnvVarPair, Environment, EnvironmentConfiguration, EnvironmentSpec, EnvironmentStatus,
};
pub use integration::{
    IntegrationTestScenario, IntegrationTestScenarioSpec, ResolverParameter, ResolverRef,
    ScenarioStatus,
};
pub use pipeline_run::{
    ChildReference, Param, PipelineRef, PipelineRun, PipelineRunSpec, PipelineRunStatus,
    PipelineTaskRunStatus, TaskRun, TaskRunSpec, TaskRunStatus,
};
pub use release::{
    Release, ReleasePlan, ReleasePlanSpec, ReleasePlanStatus, ReleaseSpec, ReleaseStatus,
};
pub use snapshot::{
    Snapshot, SnapshotComponent, SnapshotEnvironmentBinding, SnapshotEnvironmentBindingSpec,
    SnapshotEnvironmentBindingStatus, SnapshotSpec, SnapshotStatus,
};
pub use user_signup::{UserSignup, UserSignupSpec, UserSignupStatus};
