//! Releases and the pipelines processing them in managed namespaces.

use std::time::Duration;

use tracing::info;
use wait_until::{Check, DEFAULT_INTERVAL};

use crate::{
    Cluster, Error, Result,
    crd::{PipelineRun, Release, ReleaseSpec, labels},
    error::NotFoundSnafu,
    tekton::PipelineRunSummary,
    wait,
};

/// How long a release pipeline usually takes.
pub const RELEASE_PIPELINE_TIMEOUT: Duration = Duration::from_secs(2 * 60);

pub async fn get_release(cluster: &Cluster, name: &str, namespace: &str) -> Result<Release> {
    cluster.get(namespace, name).await
}

pub async fn create_release(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
    snapshot: &str,
    release_plan: &str,
) -> Result<Release> {
    let release = Release::new(
        name,
        namespace,
        ReleaseSpec {
            snapshot: snapshot.to_owned(),
            release_plan: release_plan.to_owned(),
        },
    );
    cluster.create(namespace, &release).await
}

/// The pipeline run processing release `release_namespace/release` in the
/// managed namespace.
pub async fn pipeline_run_in_namespace(
    cluster: &Cluster,
    managed_namespace: &str,
    release: &str,
    release_namespace: &str,
) -> Result<PipelineRun> {
    cluster
        .list::<PipelineRun>(
            managed_namespace,
            &[
                (labels::RELEASE_NAME, release),
                (labels::RELEASE_NAMESPACE, release_namespace),
            ],
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            NotFoundSnafu {
                kind: "PipelineRun for release",
                name: release,
                namespace: managed_namespace,
            }
            .build()
        })
}

/// `namespace/name` of a pipeline run, as a release status refers to it.
pub fn pipeline_run_reference(run: &PipelineRun) -> String {
    format!(
        "{}/{}",
        run.metadata.namespace.as_deref().unwrap_or_default(),
        run.metadata.name.as_deref().unwrap_or_default()
    )
}

/// Wait for the release pipeline to have started, finished and succeeded.
///
/// Every observation short of success, including a run not created yet or a
/// failed run, keeps the wait going until the timeout.
pub async fn wait_for_release_pipeline(
    cluster: &Cluster,
    managed_namespace: &str,
    release: &str,
    release_namespace: &str,
    timeout: Duration,
) -> Result<PipelineRun> {
    let spec = wait::spec(DEFAULT_INTERVAL, timeout)?;
    wait::wait_for(
        &format!("release pipeline of {release_namespace}/{release}"),
        spec,
        |seen| release_pipeline_succeeded(cluster, managed_namespace, release, release_namespace, seen),
    )
    .await?;
    pipeline_run_in_namespace(cluster, managed_namespace, release, release_namespace).await
}

async fn release_pipeline_succeeded(
    cluster: &Cluster,
    managed_namespace: &str,
    release: &str,
    release_namespace: &str,
    seen: wait::LastSeen,
) -> Check<Error> {
    match pipeline_run_in_namespace(cluster, managed_namespace, release, release_namespace).await {
        Ok(run) if run.has_started() && run.is_done() && run.succeeded() => Check::Done,
        Ok(run) => {
            seen.record(PipelineRunSummary::of(&run));
            Check::Pending
        }
        Err(error) => {
            seen.record(error);
            Check::Pending
        }
    }
}

async fn release_succeeded(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
    seen: wait::LastSeen,
) -> Check<Error> {
    match get_release(cluster, name, namespace).await {
        Ok(release) if release.is_done() && release.has_succeeded() => {
            info!(message = "Release succeeded.", release = name, namespace);
            Check::Done
        }
        Ok(release) => {
            let state = if release.is_done() { "failed" } else { "in progress" };
            seen.record(format_args!("release {state}"));
            Check::Pending
        }
        Err(error) => {
            seen.record(error);
            Check::Pending
        }
    }
}

pub async fn wait_for_release(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
    timeout: Duration,
) -> Result<()> {
    let spec = wait::spec(DEFAULT_INTERVAL, timeout)?;
    wait::wait_for(
        &format!("release {namespace}/{name}"),
        spec,
        |seen| release_succeeded(cluster, name, namespace, seen),
    )
    .await
}
