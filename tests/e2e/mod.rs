//! Suites that run against the cluster of the current kubeconfig.
//!
//! Every suite gets its own namespace, removed when the suite ends, and is
//! skipped when `E2E_TEST_SUITE_LABEL` filters its labels out.

use std::collections::BTreeMap;

use appstudio_e2e::{Cluster, E2eConfig, common, crd::labels, trace};
use k8s_test_framework::{Framework, Interface, namespace, up_down};
use tracing::info;

mod has;
mod integration;
mod release;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init() {
    trace::test_init();
}

pub fn make_framework() -> Result<Framework, k8s_test_framework::Error> {
    Ok(Framework::new(Interface::from_env()?))
}

/// Shared state of a running suite.
pub struct Suite {
    pub config: E2eConfig,
    pub cluster: Cluster,
    pub framework: Framework,
    pub namespace: String,
    _namespace: up_down::Manager<namespace::CommandBuilder>,
}

/// Set up a suite, or `None` when the label filter excludes it.
pub async fn suite(
    name: &str,
    suite_labels: &[&str],
) -> Result<Option<Suite>, Box<dyn std::error::Error>> {
    let config = E2eConfig::from_env()?;
    if !config.suites.enabled(suite_labels) {
        info!(message = "Skipping suite.", suite = name, labels = ?suite_labels);
        return Ok(None);
    }

    let cluster = Cluster::connect().await?;
    let framework = make_framework()?;
    let namespace = config.generate_namespace(name);
    let managed_by = BTreeMap::from([(
        labels::ARGOCD_MANAGED_BY.to_owned(),
        common::ARGOCD_MANAGED_BY_VALUE.to_owned(),
    )]);
    let guard = framework
        .namespace(namespace::Config::from_namespace(
            &namespace::make_namespace(namespace.clone(), Some(managed_by)),
        )?)
        .await?;
    // Waits for the pipeline service account as well.
    common::create_test_namespace(&cluster, &namespace).await?;

    Ok(Some(Suite {
        config,
        cluster,
        framework,
        namespace,
        _namespace: guard,
    }))
}
