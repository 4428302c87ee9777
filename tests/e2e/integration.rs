use appstudio_e2e::{
    Cluster, Error,
    config::random_string,
    crd::Snapshot,
    has::{self, NewComponent},
    integration::{self, SnapshotLookup},
    wait::LastSeen,
};
use k8s_test_framework::lock;
use tracing::info;
use wait_until::Check;

use crate::{TestResult, init, suite};

const PYTHON_GIT_URL: &str = "https://github.com/redhat-appstudio-qe/devfile-sample-python-basic";
const SCENARIO_GIT_URL: &str = "https://github.com/redhat-appstudio/integration-examples.git";
const SCENARIO_REVISION: &str = "main";
const SCENARIO_PATH: &str = "pipelines/integration_resolver_pipeline_pass.yaml";
const SAMPLE_IMAGE: &str = "quay.io/redhat-appstudio/sample-image";
const ENVIRONMENT: &str = "development";

async fn snapshot_tests_succeeded(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
    seen: LastSeen,
) -> Check<Error> {
    match integration::get_snapshot(cluster, SnapshotLookup::Name(name), namespace).await {
        Ok(snapshot) if integration::have_tests_succeeded(&snapshot) => Check::Done,
        Ok(snapshot) if integration::have_tests_finished(&snapshot) => {
            seen.record(format!("tests of snapshot {name} finished without success"));
            Check::Pending
        }
        Ok(_) => {
            seen.record(format!("tests of snapshot {name} still running"));
            Check::Pending
        }
        Err(error) => {
            seen.record(error);
            Check::Pending
        }
    }
}

async fn wait_for_scenarios(
    cluster: &Cluster,
    application: &str,
    snapshot: &Snapshot,
    namespace: &str,
) -> Result<(), Error> {
    let snapshot = snapshot.metadata.name.as_deref().unwrap_or_default();
    for scenario in integration::integration_test_scenarios(cluster, application, namespace).await? {
        let scenario = scenario.metadata.name.unwrap_or_default();
        info!(message = "Waiting for integration pipeline.", %scenario, %snapshot);
        integration::wait_for_integration_pipeline(cluster, &scenario, snapshot, namespace)
            .await?;
    }
    Ok(())
}

/// A build creates a snapshot whose integration tests pass; a snapshot
/// created by hand is tested too and promotes the global candidate.
#[tokio::test]
async fn build_snapshot_is_tested() -> TestResult {
    init();

    let _guard = lock();
    let Some(suite) = suite("integ", &["integration-service", "HACBS"]).await? else {
        return Ok(());
    };
    let cluster = &suite.cluster;
    let namespace = suite.namespace.as_str();

    let application = format!("integ-app-{}", random_string(4));
    has::create_application(cluster, &application, namespace).await?;

    let component = format!("integration-component-{}", random_string(4));
    let output_image = format!(
        "quay.io/{}/test-images:{}",
        suite.config.quay_org,
        random_string(32)
    );
    has::create_component(
        cluster,
        &NewComponent {
            application: &application,
            name: &component,
            namespace,
            git_url: PYTHON_GIT_URL,
            output_image: &output_image,
            ..NewComponent::default()
        },
    )
    .await?;
    integration::create_integration_test_scenario(
        cluster,
        &application,
        namespace,
        SCENARIO_GIT_URL,
        SCENARIO_REVISION,
        SCENARIO_PATH,
    )
    .await?;

    has::wait_for_component_pipeline(cluster, &component, &application, namespace).await?;
    let build = integration::build_pipeline_run(cluster, &component, &application, namespace, None)
        .await?;
    let build = build.metadata.name.unwrap_or_default();

    let snapshot =
        integration::get_snapshot(cluster, SnapshotLookup::BuildPipelineRun(&build), namespace)
            .await?;
    wait_for_scenarios(cluster, &application, &snapshot, namespace).await?;

    integration::create_release_plan(cluster, &application, namespace).await?;
    integration::create_environment(cluster, ENVIRONMENT, namespace).await?;

    let pushed =
        integration::create_snapshot(cluster, &application, namespace, &component, SAMPLE_IMAGE)
            .await?;
    wait_for_scenarios(cluster, &application, &pushed, namespace).await?;

    let pushed_name = pushed.metadata.name.clone().unwrap_or_default();
    appstudio_e2e::common::wait_for(
        &format!("tests of snapshot {pushed_name}"),
        suite.config.pipeline_timeout,
        |seen| snapshot_tests_succeeded(cluster, &pushed_name, namespace, seen),
    )
    .await?;

    let candidate = integration::component_of(cluster, &application, namespace).await?;
    assert!(!candidate.spec.container_image.is_empty());

    for release in integration::releases(cluster, namespace).await? {
        info!(
            message = "Release created for snapshot.",
            release = release.metadata.name.as_deref().unwrap_or_default(),
        );
    }

    integration::delete_snapshot(cluster, &pushed_name, namespace).await?;
    for scenario in integration::integration_test_scenarios(cluster, &application, namespace).await? {
        let name = scenario.metadata.name.unwrap_or_default();
        integration::delete_integration_test_scenario(cluster, &name, namespace).await?;
    }
    integration::delete_environment(cluster, ENVIRONMENT, namespace).await?;
    has::delete_component(cluster, &component, namespace).await?;
    has::delete_application(cluster, &application, namespace).await?;
    Ok(())
}
