//! Pipeline run summaries and failure diagnostics.

use std::fmt;

use k8s_openapi::api::core::v1::Pod;
use tracing::warn;

use crate::{
    Cluster, Error, Result,
    common::container_logs,
    crd::{PipelineRun, TaskRun, TaskRunStatus, find_condition},
};

/// One line description of a pipeline run, for logs and timeout reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRunSummary {
    pub name: String,
    pub status: String,
    pub reason: String,
    pub started: bool,
}

impl PipelineRunSummary {
    pub fn of(run: &PipelineRun) -> Self {
        let conditions = run
            .status
            .as_ref()
            .map(|status| status.conditions.as_slice())
            .unwrap_or_default();
        let succeeded = find_condition(conditions, "Succeeded");
        Self {
            name: run.metadata.name.clone().unwrap_or_default(),
            status: succeeded
                .map(|condition| condition.status.clone())
                .unwrap_or_else(|| "Unknown".to_owned()),
            reason: succeeded
                .map(|condition| condition.reason.clone())
                .unwrap_or_default(),
            started: run.has_started(),
        }
    }
}

impl fmt::Display for PipelineRunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let started = if self.started { "started" } else { "not started" };
        write!(f, "pipelinerun {} {started}, succeeded={}", self.name, self.status)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        Ok(())
    }
}

/// A task of a pipeline run that finished unsuccessfully.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedTask {
    pub task: String,
    pub pod: String,
}

/// Failed tasks of `run`, from the embedded task run statuses when the
/// pipeline run reports them, from the child task runs otherwise.
pub async fn failed_tasks(cluster: &Cluster, run: &PipelineRun) -> Result<Vec<FailedTask>> {
    let Some(status) = run.status.as_ref() else {
        return Ok(Vec::new());
    };
    if !status.task_runs.is_empty() {
        return Ok(embedded_failed_tasks(run));
    }

    let namespace = run.metadata.namespace.as_deref().unwrap_or_default();
    let mut failed = Vec::new();
    for child in status
        .child_references
        .iter()
        .filter(|child| child.kind.is_empty() || child.kind == "TaskRun")
    {
        let task_run = cluster.get::<TaskRun>(namespace, &child.name).await?;
        if let Some(task) = failed_task(&child.pipeline_task_name, task_run.status.as_ref()) {
            failed.push(task);
        }
    }
    Ok(failed)
}

fn embedded_failed_tasks(run: &PipelineRun) -> Vec<FailedTask> {
    run.status
        .iter()
        .flat_map(|status| status.task_runs.values())
        .filter_map(|task_run| failed_task(&task_run.pipeline_task_name, task_run.status.as_ref()))
        .collect()
}

fn failed_task(task: &str, status: Option<&TaskRunStatus>) -> Option<FailedTask> {
    status.filter(|status| status.failed()).map(|status| FailedTask {
        task: task.to_owned(),
        pod: status.pod_name.clone(),
    })
}

/// Logs of every container of every failed task of `run`.
pub async fn failed_pipeline_logs(cluster: &Cluster, run: &PipelineRun) -> Result<String> {
    let namespace = run.metadata.namespace.as_deref().unwrap_or_default();
    let mut logs = String::new();
    for task in failed_tasks(cluster, run).await? {
        if task.pod.is_empty() {
            logs.push_str(&format!("task {} failed before a pod was scheduled\n", task.task));
            continue;
        }
        let pod = cluster.get::<Pod>(namespace, &task.pod).await?;
        let containers = pod.spec.map(|spec| spec.containers).unwrap_or_default();
        for container in containers {
            let output = container_logs(cluster, namespace, &task.pod, &container.name).await?;
            logs.push_str(&format!(
                "task {} pod {} container {}:\n{output}\n",
                task.task, task.pod, container.name
            ));
        }
    }
    Ok(logs)
}

/// The error reported for a failed pipeline run, carrying the failed task
/// logs when they can be collected.
pub async fn pipeline_failure(cluster: &Cluster, run: &PipelineRun) -> Error {
    let summary = PipelineRunSummary::of(run);
    let logs = match failed_pipeline_logs(cluster, run).await {
        Ok(logs) => logs,
        Err(error) => {
            warn!(message = "Unable to collect failed pipeline logs.", pipeline_run = %summary.name, %error);
            format!("logs unavailable: {error}")
        }
    };
    Error::PipelineFailed {
        name: summary.name,
        reason: summary.reason,
        logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{json_response, serve, mock_cluster};

    fn run(status: serde_json::Value) -> PipelineRun {
        serde_json::from_value(serde_json::json!({
            "metadata": {"name": "build-1", "namespace": "e2e"},
            "status": status,
        }))
        .unwrap()
    }

    #[test]
    fn summary_display() {
        let summary = PipelineRunSummary::of(&run(serde_json::json!({
            "startTime": "2023-01-01T00:00:00Z",
            "conditions": [{"type": "Succeeded", "status": "False", "reason": "Failed"}]
        })));
        assert_eq!(
            summary.to_string(),
            "pipelinerun build-1 started, succeeded=False (Failed)"
        );

        let summary = PipelineRunSummary::of(&run(serde_json::json!({})));
        assert_eq!(summary.to_string(), "pipelinerun build-1 not started, succeeded=Unknown");
    }

    #[tokio::test]
    async fn embedded_task_runs_need_no_lookup() {
        let (cluster, _handle) = mock_cluster();
        let failed = failed_tasks(
            &cluster,
            &run(serde_json::json!({
                "taskRuns": {
                    "build-1-clone": {
                        "pipelineTaskName": "clone",
                        "status": {"podName": "clone-pod", "conditions": [{"type": "Succeeded", "status": "True"}]}
                    },
                    "build-1-build": {
                        "pipelineTaskName": "build",
                        "status": {"podName": "build-pod", "conditions": [{"type": "Succeeded", "status": "False"}]}
                    }
                }
            })),
        )
        .await
        .unwrap();
        assert_eq!(
            failed,
            vec![FailedTask {
                task: "build".to_owned(),
                pod: "build-pod".to_owned()
            }]
        );
    }

    #[tokio::test]
    async fn collects_logs_through_child_references() {
        let (cluster, handle) = mock_cluster();
        let server = tokio::spawn(serve(
            handle,
            vec![
                (
                    "/apis/tekton.dev/v1beta1/namespaces/e2e/taskruns/build-1-build",
                    json_response(
                        200,
                        &serde_json::json!({
                            "metadata": {"name": "build-1-build", "namespace": "e2e"},
                            "status": {"podName": "build-pod", "conditions": [{"type": "Succeeded", "status": "False"}]}
                        }),
                    ),
                ),
                (
                    "/api/v1/namespaces/e2e/pods/build-pod",
                    json_response(
                        200,
                        &serde_json::json!({
                            "apiVersion": "v1",
                            "kind": "Pod",
                            "metadata": {"name": "build-pod", "namespace": "e2e"},
                            "spec": {"containers": [{"name": "step-build"}]}
                        }),
                    ),
                ),
                (
                    "/api/v1/namespaces/e2e/pods/build-pod/log",
                    http_1::Response::builder()
                        .status(200)
                        .body(kube::client::Body::from(b"error: no Dockerfile".to_vec()))
                        .unwrap(),
                ),
            ],
        ));

        let logs = failed_pipeline_logs(
            &cluster,
            &run(serde_json::json!({
                "childReferences": [{"name": "build-1-build", "kind": "TaskRun", "pipelineTaskName": "build"}]
            })),
        )
        .await
        .unwrap();
        server.await.unwrap();
        assert_eq!(
            logs,
            "task build pod build-pod container step-build:\nerror: no Dockerfile\n"
        );
    }
}
