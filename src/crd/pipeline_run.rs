use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};

use super::{Condition, find_condition};

const SUCCEEDED: &str = "Succeeded";

custom_resource! {
    /// A Tekton pipeline execution.
    PipelineRun {
        group: "tekton.dev",
        version: "v1beta1",
        plural: "pipelineruns",
        spec: PipelineRunSpec,
        status: PipelineRunStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<PipelineRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bundle: String,
}

/// A pipeline parameter; the value is either a string or an array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<Time>,
    /// Embedded task run statuses, reported by older Tekton releases.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub task_runs: BTreeMap<String, PipelineTaskRunStatus>,
    /// References to child task runs, reported by newer Tekton releases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_references: Vec<ChildReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTaskRunStatus {
    pub pipeline_task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskRunStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildReference {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub pipeline_task_name: String,
}

impl PipelineRun {
    fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn has_started(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|status| status.start_time.is_some())
    }

    /// Whether the run finished, successfully or not.
    pub fn is_done(&self) -> bool {
        find_condition(self.conditions(), SUCCEEDED).is_some_and(|condition| !condition.is_unknown())
    }

    pub fn succeeded(&self) -> bool {
        find_condition(self.conditions(), SUCCEEDED).is_some_and(Condition::is_true)
    }

    /// The reason of a finished, unsuccessful run.
    pub fn failed_reason(&self) -> Option<&str> {
        find_condition(self.conditions(), SUCCEEDED)
            .filter(|condition| condition.status == "False")
            .map(|condition| condition.reason.as_str())
    }
}

custom_resource! {
    /// A single Tekton task execution.
    TaskRun {
        group: "tekton.dev",
        version: "v1beta1",
        plural: "taskruns",
        spec: TaskRunSpec,
        status: TaskRunStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pod_name: String,
}

impl TaskRunStatus {
    pub fn failed(&self) -> bool {
        find_condition(&self.conditions, SUCCEEDED).is_some_and(|condition| condition.status == "False")
    }
}
