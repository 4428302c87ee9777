use std::time::Duration;

use appstudio_e2e::{
    Cluster, Error,
    config::random_string,
    github::GitHub,
    has::{self, NewComponent},
    wait::LastSeen,
};
use k8s_test_framework::{lock, wait_for_resource::WaitFor};
use tracing::info;
use wait_until::Check;

use crate::{TestResult, init, suite};

const QUARKUS_GIT_URL: &str = "https://github.com/redhat-appstudio-qe/devfile-sample-code-with-quarkus";
const QUARKUS_DEVFILE_URL: &str = "https://raw.githubusercontent.com/devfile-samples/devfile-sample-code-with-quarkus/main/devfile.yaml";

async fn gitops_repository_created(
    cluster: &Cluster,
    github: &GitHub,
    application: &str,
    namespace: &str,
    seen: LastSeen,
) -> Check<Error> {
    let devfile = match has::get_application(cluster, application, namespace).await {
        Ok(app) => app.status.and_then(|status| status.devfile),
        Err(error) => {
            seen.record(error);
            return Check::Pending;
        }
    };
    let Some(devfile) = devfile else {
        seen.record("application has no devfile yet");
        return Check::Pending;
    };
    let repository = match has::gitops_repository_name(&devfile) {
        Ok(repository) => repository,
        Err(error) => return Check::Failed(error),
    };
    match github.repository_exists(&repository).await {
        Ok(true) => Check::Done,
        Ok(false) => {
            seen.record(format!("repository {repository} missing"));
            Check::Pending
        }
        Err(error) => Check::Failed(error),
    }
}

/// A component built from a git repository with an external devfile gets a
/// GitOps repository, a successful build and a running deployment.
#[tokio::test]
async fn quarkus_component_builds_and_deploys() -> TestResult {
    init();

    let _guard = lock();
    let Some(suite) = suite("has", &["has"]).await? else {
        return Ok(());
    };
    let cluster = &suite.cluster;
    let namespace = suite.namespace.as_str();
    let github = GitHub::from_config(&suite.config);

    let application = format!("has-app-{}", random_string(4));
    has::create_application(cluster, &application, namespace).await?;
    appstudio_e2e::common::wait_for(
        &format!("GitOps repository of application {application}"),
        suite.config.default_timeout,
        |seen| gitops_repository_created(cluster, &github, &application, namespace, seen),
    )
    .await?;

    let component = format!("quarkus-{}", random_string(4));
    let output_image = format!(
        "quay.io/{}/quarkus:{}",
        suite.config.quay_org,
        random_string(12)
    );
    has::create_component(
        cluster,
        &NewComponent {
            application: &application,
            name: &component,
            namespace,
            git_url: QUARKUS_GIT_URL,
            devfile_url: Some(QUARKUS_DEVFILE_URL),
            output_image: &output_image,
            ..NewComponent::default()
        },
    )
    .await?;

    has::wait_for_component_pipeline(cluster, &component, &application, namespace).await?;

    let deployment = format!("deployment/{component}");
    suite
        .framework
        .wait_for_rollout(namespace, &deployment, Duration::from_secs(300))
        .await?;
    suite
        .framework
        .wait(
            namespace,
            [deployment.as_str()],
            WaitFor::Condition("Available"),
            ["--timeout=60s"],
        )
        .await?;
    let logs = suite.framework.logs(namespace, &deployment).await?;
    info!(message = "Component is running.", component = %component, log_lines = logs.lines().count());

    has::delete_component(cluster, &component, namespace).await?;
    // Deleting the component garbage collects its deployment.
    suite
        .framework
        .wait(
            namespace,
            [deployment.as_str()],
            WaitFor::Delete,
            ["--timeout=120s"],
        )
        .await?;
    has::delete_application(cluster, &application, namespace).await?;
    Ok(())
}
