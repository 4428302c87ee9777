//! Snapshots, integration test scenarios, environments and the pipelines
//! integration testing runs.

use std::{collections::BTreeMap, time::Duration};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::info;
use wait_until::Check;

use crate::{
    Cluster, Error, Result,
    config::random_string,
    crd::{
        Component, EnvVarPair, Environment, EnvironmentConfiguration, EnvironmentSpec,
        IntegrationTestScenario, IntegrationTestScenarioSpec, Param, PipelineRef, PipelineRun,
        PipelineRunSpec, Release, ReleasePlan, ReleasePlanSpec, ResolverRef, Snapshot,
        SnapshotComponent, SnapshotEnvironmentBinding, SnapshotSpec, find_condition,
        is_condition_true, labels, set_condition,
    },
    error::NotFoundSnafu,
    tekton::{self, PipelineRunSummary},
    wait,
};

pub const INTEGRATION_PIPELINE_INTERVAL: Duration = Duration::from_secs(20);
pub const INTEGRATION_PIPELINE_TIMEOUT: Duration = Duration::from_secs(100 * 60);

/// Condition types integration testing reports on a snapshot. The first is
/// the legacy name, still set by older controllers.
pub const TEST_SUCCEEDED_CONDITIONS: [&str; 2] = ["HACBSTestSucceeded", "AppStudioTestSucceeded"];

fn snapshot_conditions(snapshot: &Snapshot) -> &[crate::crd::Condition] {
    snapshot
        .status
        .as_ref()
        .map(|status| status.conditions.as_slice())
        .unwrap_or_default()
}

pub fn have_tests_succeeded(snapshot: &Snapshot) -> bool {
    TEST_SUCCEEDED_CONDITIONS
        .iter()
        .any(|type_| is_condition_true(snapshot_conditions(snapshot), type_))
}

pub fn have_tests_finished(snapshot: &Snapshot) -> bool {
    TEST_SUCCEEDED_CONDITIONS
        .iter()
        .any(|type_| find_condition(snapshot_conditions(snapshot), type_).is_some())
}

/// Mark a snapshot as having passed its tests, through its status.
pub async fn mark_tests_succeeded(cluster: &Cluster, snapshot: &Snapshot) -> Result<Snapshot> {
    let mut conditions = snapshot_conditions(snapshot).to_vec();
    set_condition(
        &mut conditions,
        crate::crd::Condition::truthy("AppStudioTestSucceeded", "Passed", "Snapshot Passed"),
    );
    let namespace = snapshot.metadata.namespace.as_deref().unwrap_or_default();
    let name = snapshot.metadata.name.as_deref().unwrap_or_default();
    let patch = serde_json::json!({ "status": { "conditions": conditions } });
    cluster.patch_status(namespace, name, &patch).await
}

/// How to find a snapshot.
#[derive(Clone, Copy, Debug)]
pub enum SnapshotLookup<'a> {
    Name(&'a str),
    /// Created for the build pipeline run of that name.
    BuildPipelineRun(&'a str),
    Component(&'a str),
}

pub async fn get_snapshot(
    cluster: &Cluster,
    lookup: SnapshotLookup<'_>,
    namespace: &str,
) -> Result<Snapshot> {
    let (label, value) = match lookup {
        SnapshotLookup::Name(name) => return cluster.get(namespace, name).await,
        SnapshotLookup::BuildPipelineRun(run) => (labels::BUILD_PIPELINE_RUN, run),
        SnapshotLookup::Component(component) => (labels::COMPONENT, component),
    };
    let snapshots = cluster.list::<Snapshot>(namespace, &[]).await?;
    snapshots
        .into_iter()
        .find(|snapshot| {
            snapshot
                .metadata
                .labels
                .as_ref()
                .and_then(|labels| labels.get(label))
                .is_some_and(|found| found == value)
        })
        .ok_or_else(|| {
            NotFoundSnafu {
                kind: format!("Snapshot with {label}"),
                name: value,
                namespace,
            }
            .build()
        })
}

/// The first component belonging to `application`.
pub async fn component_of(cluster: &Cluster, application: &str, namespace: &str) -> Result<Component> {
    cluster
        .list::<Component>(namespace, &[])
        .await?
        .into_iter()
        .find(|component| component.spec.application == application)
        .ok_or_else(|| {
            NotFoundSnafu {
                kind: "Component of application",
                name: application,
                namespace,
            }
            .build()
        })
}

pub async fn releases(cluster: &Cluster, namespace: &str) -> Result<Vec<Release>> {
    let releases = cluster.list::<Release>(namespace, &[]).await?;
    for release in &releases {
        info!(
            message = "Found release.",
            release = release.metadata.name.as_deref().unwrap_or_default(),
            namespace,
        );
    }
    Ok(releases)
}

pub async fn integration_test_scenarios(
    cluster: &Cluster,
    application: &str,
    namespace: &str,
) -> Result<Vec<IntegrationTestScenario>> {
    let mut scenarios = cluster.list::<IntegrationTestScenario>(namespace, &[]).await?;
    scenarios.retain(|scenario| scenario.spec.application == application);
    Ok(scenarios)
}

fn environment(name: &str, namespace: &str) -> Environment {
    Environment::new(
        name,
        namespace,
        EnvironmentSpec {
            type_: "POC".to_owned(),
            display_name: "my-environment".to_owned(),
            deployment_strategy: "Manual".to_owned(),
            parent_environment: String::new(),
            tags: Vec::new(),
            configuration: EnvironmentConfiguration {
                env: vec![EnvVarPair {
                    name: "var_name".to_owned(),
                    value: "test".to_owned(),
                }],
            },
        },
    )
}

/// Create a manually deployed POC environment, or return the existing one
/// of that name.
pub async fn create_environment(cluster: &Cluster, name: &str, namespace: &str) -> Result<Environment> {
    match cluster.create(namespace, &environment(name, namespace)).await {
        Err(error) if error.is_already_exists() => cluster.get(namespace, name).await,
        result => result,
    }
}

pub async fn delete_environment(cluster: &Cluster, name: &str, namespace: &str) -> Result<()> {
    cluster.delete::<Environment>(namespace, name).await
}

pub async fn environments(cluster: &Cluster, namespace: &str) -> Result<Vec<Environment>> {
    cluster.list(namespace, &[]).await
}

fn snapshot(application: &str, namespace: &str, component: &str, image: &str) -> Snapshot {
    Snapshot::with_metadata(
        ObjectMeta {
            name: Some(format!("snapshot-sample-{}", random_string(4))),
            namespace: Some(namespace.to_owned()),
            labels: Some(BTreeMap::from([
                (labels::TEST_TYPE.to_owned(), "component".to_owned()),
                (labels::COMPONENT.to_owned(), component.to_owned()),
                (labels::PAC_EVENT_TYPE.to_owned(), "push".to_owned()),
            ])),
            ..ObjectMeta::default()
        },
        SnapshotSpec {
            application: application.to_owned(),
            components: vec![SnapshotComponent {
                name: component.to_owned(),
                container_image: image.to_owned(),
            }],
        },
    )
}

/// Create a push snapshot holding one component image.
pub async fn create_snapshot(
    cluster: &Cluster,
    application: &str,
    namespace: &str,
    component: &str,
    image: &str,
) -> Result<Snapshot> {
    cluster
        .create(namespace, &snapshot(application, namespace, component, image))
        .await
}

pub async fn delete_snapshot(cluster: &Cluster, name: &str, namespace: &str) -> Result<()> {
    cluster.delete::<Snapshot>(namespace, name).await
}

fn release_plan(application: &str, namespace: &str) -> ReleasePlan {
    ReleasePlan::with_metadata(
        ObjectMeta {
            generate_name: Some("test-releaseplan-".to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(BTreeMap::from([
                (labels::AUTO_RELEASE.to_owned(), "true".to_owned()),
                (labels::ATTRIBUTION.to_owned(), "true".to_owned()),
            ])),
            ..ObjectMeta::default()
        },
        ReleasePlanSpec {
            application: application.to_owned(),
            target: "default".to_owned(),
        },
    )
}

/// Create an auto-releasing plan targeting the `default` namespace.
pub async fn create_release_plan(
    cluster: &Cluster,
    application: &str,
    namespace: &str,
) -> Result<ReleasePlan> {
    cluster
        .create(namespace, &release_plan(application, namespace))
        .await
}

fn integration_test_scenario(
    application: &str,
    namespace: &str,
    git_url: &str,
    revision: &str,
    path_in_repo: &str,
) -> IntegrationTestScenario {
    IntegrationTestScenario::with_metadata(
        ObjectMeta {
            name: Some(format!("example-resolver-pass-{}", random_string(4))),
            namespace: Some(namespace.to_owned()),
            labels: Some(BTreeMap::from([(
                labels::TEST_OPTIONAL.to_owned(),
                "false".to_owned(),
            )])),
            ..ObjectMeta::default()
        },
        IntegrationTestScenarioSpec {
            application: application.to_owned(),
            resolver_ref: ResolverRef::git(git_url, revision, path_in_repo),
        },
    )
}

/// Create a required scenario whose pipeline is resolved from git.
pub async fn create_integration_test_scenario(
    cluster: &Cluster,
    application: &str,
    namespace: &str,
    git_url: &str,
    revision: &str,
    path_in_repo: &str,
) -> Result<IntegrationTestScenario> {
    let scenario =
        integration_test_scenario(application, namespace, git_url, revision, path_in_repo);
    cluster.create(namespace, &scenario).await
}

pub async fn delete_integration_test_scenario(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
) -> Result<()> {
    cluster.delete::<IntegrationTestScenario>(namespace, name).await
}

/// Start a passing integration pipeline for a snapshot by hand, the way the
/// integration service would.
pub async fn create_integration_pipeline_run(
    cluster: &Cluster,
    snapshot: &str,
    namespace: &str,
    component: &str,
    scenario: &str,
) -> Result<PipelineRun> {
    let run = PipelineRun::with_metadata(
        ObjectMeta {
            generate_name: Some("component-pipelinerun-".to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(BTreeMap::from([
                ("pipelinesascode.tekton.dev/event-type".to_owned(), "push".to_owned()),
                (labels::COMPONENT.to_owned(), component.to_owned()),
                (labels::PIPELINE_TYPE.to_owned(), "test".to_owned()),
                (labels::SNAPSHOT.to_owned(), snapshot.to_owned()),
                (labels::TEST_SCENARIO.to_owned(), scenario.to_owned()),
            ])),
            ..ObjectMeta::default()
        },
        PipelineRunSpec {
            pipeline_ref: Some(PipelineRef {
                name: "integration-pipeline-pass".to_owned(),
                bundle: "quay.io/redhat-appstudio/example-tekton-bundle:integration-pipeline-pass"
                    .to_owned(),
            }),
            params: vec![Param {
                name: "output-image".to_owned(),
                value: "quay.io/redhat-appstudio/sample-image".into(),
            }],
        },
    );
    cluster.create(namespace, &run).await
}

/// The build pipeline run of a component, optionally for one commit.
pub async fn build_pipeline_run(
    cluster: &Cluster,
    component: &str,
    application: &str,
    namespace: &str,
    sha: Option<&str>,
) -> Result<PipelineRun> {
    let mut selector = vec![
        (labels::PIPELINE_TYPE, "build"),
        (labels::APPLICATION, application),
        (labels::COMPONENT, component),
    ];
    if let Some(sha) = sha {
        selector.push((labels::PAC_SHA, sha));
    }
    first_pipeline_run(cluster, namespace, &selector, component).await
}

/// The integration pipeline run of a scenario for a snapshot.
pub async fn integration_pipeline_run(
    cluster: &Cluster,
    scenario: &str,
    snapshot: &str,
    namespace: &str,
) -> Result<PipelineRun> {
    let selector = [
        (labels::PIPELINE_TYPE, "test"),
        (labels::TEST_SCENARIO, scenario),
        (labels::SNAPSHOT, snapshot),
    ];
    first_pipeline_run(cluster, namespace, &selector, scenario).await
}

async fn first_pipeline_run(
    cluster: &Cluster,
    namespace: &str,
    selector: &[(&str, &str)],
    owner: &str,
) -> Result<PipelineRun> {
    let runs = match cluster.list::<PipelineRun>(namespace, selector).await {
        Err(error) if error.is_not_found() => Vec::new(),
        result => result?,
    };
    runs.into_iter().next().ok_or_else(|| {
        NotFoundSnafu {
            kind: "PipelineRun for",
            name: owner,
            namespace,
        }
        .build()
    })
}

async fn integration_pipeline_finished(
    cluster: &Cluster,
    scenario: &str,
    snapshot: &str,
    namespace: &str,
    seen: wait::LastSeen,
) -> Check<Error> {
    let run = match integration_pipeline_run(cluster, scenario, snapshot, namespace).await {
        Ok(run) => run,
        Err(error) => {
            seen.record(error);
            return Check::Pending;
        }
    };
    let summary = PipelineRunSummary::of(&run);
    info!(message = "Integration pipeline progress.", %summary);
    seen.record(&summary);

    if !run.is_done() {
        Check::Pending
    } else if run.succeeded() {
        Check::Done
    } else {
        Check::Failed(tekton::pipeline_failure(cluster, &run).await)
    }
}

/// Wait for the integration pipeline of `scenario` on `snapshot` to
/// succeed. A failed run ends the wait with its failed task logs.
pub async fn wait_for_integration_pipeline(
    cluster: &Cluster,
    scenario: &str,
    snapshot: &str,
    namespace: &str,
) -> Result<()> {
    let spec = wait::spec(INTEGRATION_PIPELINE_INTERVAL, INTEGRATION_PIPELINE_TIMEOUT)?;
    wait::wait_for(
        &format!("integration pipeline of scenario {namespace}/{scenario}"),
        spec,
        |seen| integration_pipeline_finished(cluster, scenario, snapshot, namespace, seen),
    )
    .await
}

/// The binding deploying `application` to `environment`.
pub async fn snapshot_environment_binding(
    cluster: &Cluster,
    application: &str,
    environment: &str,
    namespace: &str,
) -> Result<SnapshotEnvironmentBinding> {
    cluster
        .list::<SnapshotEnvironmentBinding>(namespace, &[])
        .await?
        .into_iter()
        .find(|binding| {
            binding.spec.application == application && binding.spec.environment == environment
        })
        .ok_or_else(|| {
            NotFoundSnafu {
                kind: format!("SnapshotEnvironmentBinding of application {application}"),
                name: environment,
                namespace,
            }
            .build()
        })
}

#[cfg(test)]
mod tests {
    use http_1::Method;

    use super::*;
    use crate::{
        crd::{Condition, SnapshotStatus},
        test_util::{json_response, mock_cluster, serve, status_response},
    };

    fn with_conditions(conditions: Vec<Condition>) -> Snapshot {
        let mut snapshot = snapshot("demo", "e2e", "nodejs", "quay.io/example/nodejs:1");
        snapshot.status = Some(SnapshotStatus { conditions });
        snapshot
    }

    #[test]
    fn test_conditions_accept_both_names() {
        let pending = with_conditions(Vec::new());
        assert!(!have_tests_finished(&pending));
        assert!(!have_tests_succeeded(&pending));

        let legacy = with_conditions(vec![Condition::truthy("HACBSTestSucceeded", "Passed", "")]);
        assert!(have_tests_finished(&legacy));
        assert!(have_tests_succeeded(&legacy));

        let failed = with_conditions(vec![Condition {
            status: "False".to_owned(),
            ..Condition::truthy("AppStudioTestSucceeded", "Failed", "")
        }]);
        assert!(have_tests_finished(&failed));
        assert!(!have_tests_succeeded(&failed));
    }

    #[test]
    fn generated_objects() {
        let snapshot = snapshot("demo", "e2e", "nodejs", "quay.io/example/nodejs:1");
        let name = snapshot.metadata.name.clone().unwrap();
        assert!(name.starts_with("snapshot-sample-"));
        let snapshot_labels = snapshot.metadata.labels.unwrap();
        assert_eq!(snapshot_labels[labels::TEST_TYPE], "component");
        assert_eq!(snapshot_labels[labels::PAC_EVENT_TYPE], "push");

        let plan = release_plan("demo", "e2e");
        assert_eq!(plan.metadata.generate_name.as_deref(), Some("test-releaseplan-"));
        assert_eq!(plan.spec.target, "default");

        let scenario = integration_test_scenario(
            "demo",
            "e2e",
            "https://github.com/example/tests",
            "main",
            "pipelines/pass.yaml",
        );
        let value = serde_json::to_value(&scenario).unwrap();
        assert_eq!(value["spec"]["resolverRef"]["resolver"], "git");
        assert_eq!(
            value["metadata"]["labels"][labels::TEST_OPTIONAL],
            "false"
        );
    }

    #[tokio::test]
    async fn existing_environment_is_returned() {
        let (cluster, handle) = mock_cluster();
        let existing = serde_json::to_value(environment("dev", "e2e")).unwrap();
        let server = tokio::spawn(serve(
            handle,
            vec![
                (
                    "/apis/appstudio.redhat.com/v1alpha1/namespaces/e2e/environments",
                    status_response(409, "AlreadyExists"),
                ),
                (
                    "/apis/appstudio.redhat.com/v1alpha1/namespaces/e2e/environments/dev",
                    json_response(200, &existing),
                ),
            ],
        ));

        let environment = create_environment(&cluster, "dev", "e2e").await.unwrap();
        server.await.unwrap();
        assert_eq!(environment.spec.type_, "POC");
    }

    #[tokio::test]
    async fn snapshot_lookup_by_build_pipeline_run() {
        let (cluster, handle) = mock_cluster();
        let server = tokio::spawn(serve(
            handle,
            vec![(
                "/apis/appstudio.redhat.com/v1alpha1/namespaces/e2e/snapshots",
                json_response(
                    200,
                    &serde_json::json!({
                        "apiVersion": "appstudio.redhat.com/v1alpha1",
                        "kind": "SnapshotList",
                        "metadata": {},
                        "items": [
                            {"metadata": {"name": "other", "labels": {(labels::BUILD_PIPELINE_RUN): "build-0"}}},
                            {"metadata": {"name": "wanted", "labels": {(labels::BUILD_PIPELINE_RUN): "build-1"}}}
                        ]
                    }),
                ),
            )],
        ));

        let snapshot = get_snapshot(&cluster, SnapshotLookup::BuildPipelineRun("build-1"), "e2e")
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(snapshot.metadata.name.as_deref(), Some("wanted"));
    }

    #[tokio::test]
    async fn marking_tests_patches_status() {
        let (cluster, mut handle) = mock_cluster();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), Method::PATCH);
            assert!(request.uri().path().ends_with("/snapshots/snap/status"));
            assert_eq!(
                request.headers()["content-type"],
                "application/merge-patch+json"
            );
            send.send_response(json_response(
                200,
                &serde_json::json!({
                    "metadata": {"name": "snap", "namespace": "e2e"},
                    "status": {"conditions": [{"type": "AppStudioTestSucceeded", "status": "True", "reason": "Passed"}]}
                }),
            ));
        });

        let mut snapshot = with_conditions(Vec::new());
        snapshot.metadata.name = Some("snap".to_owned());
        let patched = mark_tests_succeeded(&cluster, &snapshot).await.unwrap();
        server.await.unwrap();
        assert!(have_tests_succeeded(&patched));
    }

    #[tokio::test(start_paused = true)]
    async fn integration_pipeline_wait_times_out_with_summary() {
        let (cluster, mut handle) = mock_cluster();
        tokio::spawn(async move {
            while let Some((_, send)) = handle.next_request().await {
                send.send_response(json_response(
                    200,
                    &serde_json::json!({
                        "apiVersion": "tekton.dev/v1beta1",
                        "kind": "PipelineRunList",
                        "metadata": {},
                        "items": [{
                            "metadata": {"name": "test-run", "namespace": "e2e"},
                            "status": {
                                "startTime": "2023-01-01T00:00:00Z",
                                "conditions": [{"type": "Succeeded", "status": "Unknown", "reason": "Running"}]
                            }
                        }]
                    }),
                ));
            }
        });

        let error = wait_for_integration_pipeline(&cluster, "scenario", "snap", "e2e")
            .await
            .unwrap_err();
        match error {
            Error::WaitTimedOut { last_state, elapsed, .. } => {
                assert_eq!(
                    last_state,
                    "pipelinerun test-run started, succeeded=Unknown (Running)"
                );
                assert!(elapsed >= INTEGRATION_PIPELINE_TIMEOUT);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
