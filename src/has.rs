//! Applications and components.

use std::time::Duration;

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use serde::Deserialize;
use snafu::ResultExt;
use tracing::info;
use url::Url;
use wait_until::Check;

use crate::{
    Cluster, Error, Result,
    crd::{
        Application, ApplicationSpec, Component, ComponentSource, ComponentSpec, GitSource,
        PipelineRun, labels,
    },
    error::{ConditionFailedSnafu, DevfileSnafu, NotFoundSnafu},
    tekton::{self, PipelineRunSummary},
    wait,
};

pub const COMPONENT_PIPELINE_INTERVAL: Duration = Duration::from_secs(20);
pub const COMPONENT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub async fn get_application(cluster: &Cluster, name: &str, namespace: &str) -> Result<Application> {
    cluster.get(namespace, name).await
}

/// Create an application whose display name is its name.
pub async fn create_application(
    cluster: &Cluster,
    name: &str,
    namespace: &str,
) -> Result<Application> {
    let application = Application::new(
        name,
        namespace,
        ApplicationSpec {
            display_name: name.to_owned(),
            description: None,
        },
    );
    cluster.create(namespace, &application).await
}

pub async fn delete_application(cluster: &Cluster, name: &str, namespace: &str) -> Result<()> {
    cluster.delete::<Application>(namespace, name).await
}

pub async fn delete_component(cluster: &Cluster, name: &str, namespace: &str) -> Result<()> {
    cluster.delete::<Component>(namespace, name).await
}

pub async fn delete_all_components(cluster: &Cluster, namespace: &str) -> Result<()> {
    cluster.delete_all::<Component>(namespace).await
}

pub async fn delete_all_applications(cluster: &Cluster, namespace: &str) -> Result<()> {
    cluster.delete_all::<Application>(namespace).await
}

/// Everything needed to create a component from a git repository.
#[derive(Clone, Debug, Default)]
pub struct NewComponent<'a> {
    pub application: &'a str,
    pub name: &'a str,
    pub namespace: &'a str,
    pub git_url: &'a str,
    /// Build from this devfile rather than the one in the repository.
    pub devfile_url: Option<&'a str>,
    pub source_image: &'a str,
    /// Where the build pushes its image; wins over `source_image`.
    pub output_image: &'a str,
    pub secret: &'a str,
}

impl NewComponent<'_> {
    fn to_component(&self) -> Component {
        let container_image = if self.output_image.is_empty() {
            self.source_image
        } else {
            self.output_image
        };
        let target_port = if self.devfile_url.is_some() { 8080 } else { 8081 };
        Component::new(
            self.name,
            self.namespace,
            ComponentSpec {
                component_name: self.name.to_owned(),
                application: self.application.to_owned(),
                source: ComponentSource {
                    git: Some(GitSource {
                        url: self.git_url.to_owned(),
                        devfile_url: self.devfile_url.unwrap_or_default().to_owned(),
                        ..GitSource::default()
                    }),
                },
                secret: self.secret.to_owned(),
                container_image: container_image.to_owned(),
                replicas: Some(1),
                target_port: Some(target_port),
            },
        )
    }
}

pub async fn create_component(cluster: &Cluster, new: &NewComponent<'_>) -> Result<Component> {
    info!(
        message = "Creating component.",
        component = new.name,
        application = new.application,
        namespace = new.namespace,
    );
    cluster.create(new.namespace, &new.to_component()).await
}

/// The first build pipeline run of a component.
pub async fn component_pipeline(
    cluster: &Cluster,
    component: &str,
    application: &str,
    namespace: &str,
) -> Result<PipelineRun> {
    let runs = cluster
        .list::<PipelineRun>(
            namespace,
            &[
                (labels::BUILD_COMPONENT, component),
                (labels::BUILD_APPLICATION, application),
            ],
        )
        .await?;
    runs.into_iter().next().ok_or_else(|| {
        NotFoundSnafu {
            kind: "PipelineRun for component",
            name: component,
            namespace,
        }
        .build()
    })
}

/// Deployment the platform rolls out for a component.
pub async fn component_deployment(
    cluster: &Cluster,
    component: &str,
    namespace: &str,
) -> Result<Deployment> {
    cluster.get(namespace, &format!("el-{component}")).await
}

pub async fn component_service(
    cluster: &Cluster,
    component: &str,
    namespace: &str,
) -> Result<Service> {
    cluster.get(namespace, &format!("el-{component}")).await
}

async fn component_pipeline_finished(
    cluster: &Cluster,
    component: &str,
    application: &str,
    namespace: &str,
    seen: wait::LastSeen,
) -> Check<Error> {
    let run = match component_pipeline(cluster, component, application, namespace).await {
        Ok(run) => run,
        Err(error) => {
            seen.record(error);
            return Check::Pending;
        }
    };
    let summary = PipelineRunSummary::of(&run);
    info!(message = "Component pipeline progress.", %summary);
    seen.record(&summary);

    let conditions = run
        .status
        .as_ref()
        .map(|status| status.conditions.as_slice())
        .unwrap_or_default();
    for condition in conditions {
        if condition.reason == "Failed" {
            return Check::Failed(tekton::pipeline_failure(cluster, &run).await);
        }
        if condition.is_true() {
            return Check::Done;
        }
    }
    Check::Pending
}

/// Wait for the build pipeline of a component to succeed.
///
/// A run that cannot be found yet is still pending; a condition with reason
/// `Failed` ends the wait with the failed task logs.
pub async fn wait_for_component_pipeline(
    cluster: &Cluster,
    component: &str,
    application: &str,
    namespace: &str,
) -> Result<()> {
    let spec = wait::spec(COMPONENT_PIPELINE_INTERVAL, COMPONENT_PIPELINE_TIMEOUT)?;
    wait::wait_for(
        &format!("build pipeline of component {namespace}/{component}"),
        spec,
        |seen| component_pipeline_finished(cluster, component, application, namespace, seen),
    )
    .await
}

#[derive(Deserialize)]
struct Devfile {
    #[serde(default)]
    metadata: DevfileMetadata,
}

#[derive(Default, Deserialize)]
struct DevfileMetadata {
    #[serde(default)]
    attributes: serde_yaml::Mapping,
}

/// Name of the GitOps repository the platform generated for an
/// application, read from the devfile in the application status.
pub fn gitops_repository_name(devfile: &str) -> Result<String> {
    let devfile: Devfile = serde_yaml::from_str(devfile).context(DevfileSnafu)?;
    let missing = |message: &str| {
        ConditionFailedSnafu {
            what: "reading the GitOps repository",
            message,
        }
        .build()
    };
    let url = devfile
        .metadata
        .attributes
        .get("gitOpsRepository.url")
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| missing("devfile has no gitOpsRepository.url attribute"))?;
    let url = Url::parse(url).map_err(|error| missing(&error.to_string()))?;
    url.path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_owned)
        .ok_or_else(|| missing("repository URL has no path"))
}
