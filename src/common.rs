//! Namespaces, pods, config maps and secrets.

use std::{collections::BTreeMap, time::Duration};

use base64::prelude::{BASE64_STANDARD, Engine as _};
use k8s_openapi::{
    ByteString,
    api::core::v1::{ConfigMap, Namespace, Pod, Secret, ServiceAccount},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::api::{DeleteParams, ListParams, LogParams, PostParams};
use snafu::ResultExt;
use tracing::info;
use wait_until::{Check, DEFAULT_INTERVAL};

use crate::{
    Cluster, Error, Result,
    cluster::label_selector,
    crd::{TaskRun, labels::ARGOCD_MANAGED_BY},
    error::{ConditionFailedSnafu, DecodeSnafu, KubeSnafu, is_status},
    wait::{self, LastSeen},
};

/// Value of the Argo CD label every test namespace carries.
pub const ARGOCD_MANAGED_BY_VALUE: &str = "gitops-service-argocd";

/// Service account Tekton resources run as.
pub const PIPELINE_SERVICE_ACCOUNT: &str = "pipeline";

const SERVICE_ACCOUNT_TIMEOUT: Duration = Duration::from_secs(30);

/// Make sure namespace `name` exists, carries the Argo CD label and is ready
/// for pipelines.
///
/// An existing, already labelled namespace is returned as is. Otherwise the
/// namespace is created or relabelled, then the `pipeline` service account
/// is awaited for up to 30 seconds.
pub async fn create_test_namespace(cluster: &Cluster, name: &str) -> Result<Namespace> {
    let api = cluster.cluster_api::<Namespace>();
    let existing = api.get_opt(name).await.with_context(|_| KubeSnafu {
        action: format!("get namespace {name}"),
    })?;

    let namespace = match existing {
        None => {
            info!(message = "Creating test namespace.", namespace = name);
            let template = Namespace {
                metadata: ObjectMeta {
                    name: Some(name.to_owned()),
                    labels: Some(argocd_labels()),
                    ..ObjectMeta::default()
                },
                ..Namespace::default()
            };
            api.create(&PostParams::default(), &template)
                .await
                .with_context(|_| KubeSnafu {
                    action: format!("create namespace {name}"),
                })?
        }
        Some(namespace) if has_argocd_label(&namespace) => return Ok(namespace),
        Some(mut namespace) => {
            info!(message = "Labelling existing namespace for Argo CD.", namespace = name);
            namespace
                .metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .extend(argocd_labels());
            api.replace(name, &PostParams::default(), &namespace)
                .await
                .with_context(|_| KubeSnafu {
                    action: format!("update labels of namespace {name}"),
                })?
        }
    };

    wait_for(
        &format!("service account {name}/{PIPELINE_SERVICE_ACCOUNT}"),
        SERVICE_ACCOUNT_TIMEOUT,
        |seen| service_account_present(cluster, name, PIPELINE_SERVICE_ACCOUNT, seen),
    )
    .await?;

    Ok(namespace)
}

fn argocd_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(
        ARGOCD_MANAGED_BY.to_owned(),
        ARGOCD_MANAGED_BY_VALUE.to_owned(),
    )])
}

fn has_argocd_label(namespace: &Namespace) -> bool {
    namespace
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(ARGOCD_MANAGED_BY))
        .is_some_and(|value| value == ARGOCD_MANAGED_BY_VALUE)
}

/// Delete a namespace; a namespace already gone is not an error.
pub async fn delete_namespace(cluster: &Cluster, name: &str) -> Result<()> {
    match cluster
        .cluster_api::<Namespace>()
        .delete(name, &DeleteParams::default())
        .await
    {
        Ok(_) => Ok(()),
        Err(error) if is_status(&error, 404) => Ok(()),
        Err(source) => Err(source).context(KubeSnafu {
            action: format!("delete namespace {name}"),
        }),
    }
}

/// Poll with the one second interval every generic wait uses.
pub async fn wait_for<F, Fut>(what: &str, timeout: Duration, condition: F) -> Result<()>
where
    F: FnMut(LastSeen) -> Fut,
    Fut: std::future::Future<Output = Check<Error>>,
{
    let spec = wait::spec(DEFAULT_INTERVAL, timeout)?;
    wait::wait_for(what, spec, condition).await
}

pub async fn service_account_present(
    cluster: &Cluster,
    namespace: &str,
    name: &str,
    seen: LastSeen,
) -> Check<Error> {
    match cluster.get_opt::<ServiceAccount>(namespace, name).await {
        Ok(Some(_)) => Check::Done,
        Ok(None) => {
            seen.record("service account missing");
            Check::Pending
        }
        Err(error) => {
            seen.record(error);
            Check::Pending
        }
    }
}

/// The pod phase a wait is after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PodState {
    /// The pod is running; completion in either direction is a failure.
    Running,
    /// The pod completed successfully; a failed pod is a failure.
    Succeeded,
}

impl PodState {
    fn evaluate(self, pod: &str, phase: &str) -> Check<Error> {
        let failed = |message: &str| {
            Check::Failed(
                ConditionFailedSnafu {
                    what: format!("pod {pod:?}"),
                    message,
                }
                .build(),
            )
        };
        match (self, phase) {
            (Self::Running, "Running") | (Self::Succeeded, "Succeeded") => Check::Done,
            (Self::Running, "Failed" | "Succeeded") => failed("ran to completion"),
            (Self::Succeeded, "Failed") => failed("has failed"),
            _ => Check::Pending,
        }
    }
}

fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .unwrap_or("Unknown")
}

/// Condition on the phase of a single pod. Lookup errors count as pending.
pub async fn pod_in_state(
    cluster: &Cluster,
    namespace: &str,
    name: &str,
    state: PodState,
    seen: LastSeen,
) -> Check<Error> {
    match cluster.get::<Pod>(namespace, name).await {
        Ok(pod) => {
            let phase = pod_phase(&pod);
            seen.record(format_args!("phase {phase}"));
            state.evaluate(name, phase)
        }
        Err(error) => {
            seen.record(error);
            Check::Pending
        }
    }
}

pub async fn wait_for_pod(
    cluster: &Cluster,
    namespace: &str,
    name: &str,
    state: PodState,
    timeout: Duration,
) -> Result<()> {
    wait_for(
        &format!("pod {namespace}/{name} to be {state:?}"),
        timeout,
        |seen| pod_in_state(cluster, namespace, name, state, seen),
    )
    .await
}

/// Whether the task run has been scheduled on a pod yet.
pub fn task_pod_exists(task_run: &TaskRun) -> bool {
    task_run
        .status
        .as_ref()
        .is_some_and(|status| !status.pod_name.is_empty())
}

/// List at most `limit` pods labelled `key=value`.
pub async fn list_pods(
    cluster: &Cluster,
    namespace: &str,
    key: &str,
    value: &str,
    limit: u32,
) -> Result<Vec<Pod>> {
    let params = ListParams::default()
        .labels(&label_selector(&[(key, value)]))
        .limit(limit);
    let pods = cluster
        .api::<Pod>(namespace)
        .list(&params)
        .await
        .with_context(|_| KubeSnafu {
            action: format!("list pods {key}={value} in {namespace}"),
        })?;
    Ok(pods.items)
}

/// Wait for every pod labelled `key=value` to reach `state`, one after the
/// other, each within `timeout`. Finding no pod at all is an error.
pub async fn wait_for_pod_selector(
    cluster: &Cluster,
    namespace: &str,
    (key, value): (&str, &str),
    state: PodState,
    timeout: Duration,
    limit: u32,
) -> Result<()> {
    let pods = list_pods(cluster, namespace, key, value, limit).await?;
    snafu::ensure!(
        !pods.is_empty(),
        ConditionFailedSnafu {
            what: format!("pod selector {key}={value}"),
            message: format!("no pods in {namespace}"),
        }
    );

    for pod in &pods {
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        wait_for_pod(cluster, namespace, name, state, timeout).await?;
    }
    Ok(())
}

pub async fn container_logs(
    cluster: &Cluster,
    namespace: &str,
    pod: &str,
    container: &str,
) -> Result<String> {
    let params = LogParams {
        container: Some(container.to_owned()),
        ..LogParams::default()
    };
    cluster
        .api::<Pod>(namespace)
        .logs(pod, &params)
        .await
        .with_context(|_| KubeSnafu {
            action: format!("read logs of {namespace}/{pod}/{container}"),
        })
}

pub async fn create_config_map(
    cluster: &Cluster,
    namespace: &str,
    config_map: &ConfigMap,
) -> Result<ConfigMap> {
    cluster.create(namespace, config_map).await
}

pub async fn update_config_map(
    cluster: &Cluster,
    namespace: &str,
    config_map: &ConfigMap,
) -> Result<ConfigMap> {
    cluster.replace(namespace, config_map).await
}

pub async fn get_config_map(cluster: &Cluster, namespace: &str, name: &str) -> Result<ConfigMap> {
    cluster.get(namespace, name).await
}

pub async fn delete_config_map(cluster: &Cluster, namespace: &str, name: &str) -> Result<()> {
    cluster.delete::<ConfigMap>(namespace, name).await
}

pub async fn create_secret(cluster: &Cluster, namespace: &str, secret: &Secret) -> Result<Secret> {
    cluster.create(namespace, secret).await
}

pub async fn get_secret(cluster: &Cluster, namespace: &str, name: &str) -> Result<Secret> {
    cluster.get(namespace, name).await
}

pub async fn delete_secret(cluster: &Cluster, namespace: &str, name: &str) -> Result<()> {
    cluster.delete::<Secret>(namespace, name).await
}

/// Create a `kubernetes.io/dockerconfigjson` secret from a base64 encoded
/// docker config.
pub async fn create_registry_auth_secret(
    cluster: &Cluster,
    namespace: &str,
    name: &str,
    encoded_docker_config: &str,
) -> Result<Secret> {
    let secret = registry_auth_secret(namespace, name, encoded_docker_config)?;
    cluster.create(namespace, &secret).await
}

fn registry_auth_secret(namespace: &str, name: &str, encoded: &str) -> Result<Secret> {
    let docker_config = BASE64_STANDARD
        .decode(encoded.trim())
        .context(DecodeSnafu {
            what: "registry auth",
        })?;
    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        type_: Some("kubernetes.io/dockerconfigjson".to_owned()),
        data: Some(BTreeMap::from([(
            ".dockerconfigjson".to_owned(),
            ByteString(docker_config),
        )])),
        ..Secret::default()
    })
}
