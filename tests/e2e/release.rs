use std::collections::BTreeMap;

use appstudio_e2e::{
    common,
    config::random_string,
    crd::{ReleasePlan, ReleasePlanSpec, Snapshot, SnapshotComponent, SnapshotSpec, labels},
    release::{self, RELEASE_PIPELINE_TIMEOUT},
};
use indoc::formatdoc;
use k8s_test_framework::{lock, manifest, namespace};

use crate::{TestResult, init, suite};

const APPLICATION: &str = "application";
const SNAPSHOT: &str = "snapshot";
const RELEASE_PLAN: &str = "source-release-plan";
const RELEASE: &str = "release";
const RELEASE_PIPELINE: &str = "release-pipeline";
const RELEASE_PIPELINE_BUNDLE: &str = "quay.io/hacbs-release/demo:m5-alpine";

const SNAPSHOT_IMAGES: [(&str, &str); 3] = [
    (
        "component-1",
        "quay.io/redhat-appstudio/component1@sha256:d5e85e49c89df42b221d972f5b96c6507a8124717a6e42e83fd3caae1031d514",
    ),
    (
        "component-2",
        "quay.io/redhat-appstudio/component2@sha256:a01dfd18cf8ca8b68770b09a9b6af0fd7c6d1f8644c7ab97f0e06c34dfc5860e",
    ),
    (
        "component-3",
        "quay.io/redhat-appstudio/component3@sha256:d90a0a33e4c5a1daf5877f8dd989a570bfae4f94211a8143599245e503775b1f",
    ),
];

fn release_plan_admission(origin: &str) -> String {
    formatdoc!(
        r#"
        apiVersion: appstudio.redhat.com/v1alpha1
        kind: ReleasePlanAdmission
        metadata:
          name: target-release-plan-admission
        spec:
          applications:
            - {APPLICATION}
          origin: {origin}
          pipelineRef:
            resolver: bundles
            params:
              - name: bundle
                value: {RELEASE_PIPELINE_BUNDLE}
              - name: name
                value: {RELEASE_PIPELINE}
              - name: kind
                value: pipeline
        "#
    )
}

fn snapshot(namespace: &str) -> Snapshot {
    Snapshot::new(
        SNAPSHOT,
        namespace,
        SnapshotSpec {
            application: APPLICATION.to_owned(),
            components: SNAPSHOT_IMAGES
                .iter()
                .map(|(name, image)| SnapshotComponent {
                    name: (*name).to_owned(),
                    container_image: (*image).to_owned(),
                })
                .collect(),
        },
    )
}

/// A release of a snapshot runs the release pipeline in the managed
/// namespace and references that run once it succeeds.
#[tokio::test]
async fn happy_path_release() -> TestResult {
    init();

    let _guard = lock();
    let Some(suite) = suite("release-dev", &["release"]).await? else {
        return Ok(());
    };
    let cluster = &suite.cluster;
    let dev_namespace = suite.namespace.as_str();

    let managed_namespace = format!("{}-managed-{}", suite.config.namespace_prefix, random_string(4));
    let managed_by = BTreeMap::from([(
        labels::ARGOCD_MANAGED_BY.to_owned(),
        common::ARGOCD_MANAGED_BY_VALUE.to_owned(),
    )]);
    let _managed = suite
        .framework
        .namespace(namespace::Config::from_namespace(
            &namespace::make_namespace(managed_namespace.clone(), Some(managed_by)),
        )?)
        .await?;
    common::create_test_namespace(cluster, &managed_namespace).await?;

    cluster.create(dev_namespace, &snapshot(dev_namespace)).await?;
    let _admission = suite
        .framework
        .manifest(
            manifest::Config::from_resource_string(&release_plan_admission(dev_namespace))?
                .in_namespace(managed_namespace.clone()),
        )
        .await?;
    let plan = ReleasePlan::new(
        RELEASE_PLAN,
        dev_namespace,
        ReleasePlanSpec {
            application: APPLICATION.to_owned(),
            target: managed_namespace.clone(),
        },
    );
    cluster.create(dev_namespace, &plan).await?;
    release::create_release(cluster, RELEASE, dev_namespace, SNAPSHOT, RELEASE_PLAN).await?;

    let run = release::wait_for_release_pipeline(
        cluster,
        &managed_namespace,
        RELEASE,
        dev_namespace,
        RELEASE_PIPELINE_TIMEOUT,
    )
    .await?;
    release::wait_for_release(cluster, RELEASE, dev_namespace, RELEASE_PIPELINE_TIMEOUT).await?;

    let released = release::get_release(cluster, RELEASE, dev_namespace).await?;
    let reference = released
        .status
        .map(|status| status.release_pipeline_run)
        .unwrap_or_default();
    assert_eq!(reference, release::pipeline_run_reference(&run));
    Ok(())
}
