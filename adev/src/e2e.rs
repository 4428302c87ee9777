//! Steps shared by the local and CI e2e workflows.

use std::{collections::BTreeMap, path::Path, process::Command, time::Duration};

use anyhow::{Context as _, Result, bail};
use appstudio_e2e::{Cluster, sandbox};

use crate::{
    app::{self, CommandExt as _},
    git,
    job_spec::{INFRA_DEPLOYMENTS_REPO, JobContext, UPSTREAM_ORG},
};

pub const REQUIRED_BINARIES: [&str; 5] = ["jq", "kubectl", "oc", "yq", "git"];
pub const REQUIRED_SECRETS: [&str; 2] = ["GITHUB_TOKEN", "QUAY_TOKEN"];

pub const BOOTSTRAP_ATTEMPTS: u32 = 2;
pub const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_secs(10);

const BOOTSTRAP_SCRIPT: &str = "hack/bootstrap-cluster.sh";

/// Secrets that are unset or empty.
pub fn missing_secrets(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    REQUIRED_SECRETS
        .into_iter()
        .filter(|name| lookup(*name).is_none_or(|value| value.is_empty()))
        .collect()
}

pub fn preflight_checks() -> Result<()> {
    let missing = missing_secrets(|name| std::env::var(name).ok());
    if !missing.is_empty() {
        bail!(
            "Required env vars containing secrets ({}) not defined or empty",
            missing.join(", ")
        );
    }
    for binary in REQUIRED_BINARIES {
        let found = Command::new("which")
            .arg(binary)
            .output()
            .is_ok_and(|output| output.status.success());
        if !found {
            bail!("Binary {binary} not found in PATH, please install it first");
        }
    }
    Ok(())
}

/// Fork and branch of `infra-deployments` to install from.
pub fn infra_source(env: &BTreeMap<String, String>) -> (String, String) {
    let org = env
        .get("INFRA_DEPLOYMENTS_ORG")
        .map_or(UPSTREAM_ORG, String::as_str);
    let branch = env
        .get("INFRA_DEPLOYMENTS_BRANCH")
        .map_or("main", String::as_str);
    (git::fork_url(org, INFRA_DEPLOYMENTS_REPO), branch.to_owned())
}

/// Variables the installer runs with on top of `env`.
pub fn installer_env(context: &JobContext, env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut installer = env.clone();
    if context.in_ci && context.repo_name == "e2e-tests" {
        // Installer scripts source helpers from this repository.
        installer.insert("E2E_TESTS_COMMIT_SHA".to_owned(), context.pull_pull_sha.clone());
    }
    installer
}

/// Install the platform in preview mode from `infra-deployments`.
pub fn bootstrap_cluster(env: &BTreeMap<String, String>) -> Result<()> {
    let (url, branch) = infra_source(env);
    let checkout = tempfile::tempdir()?;
    git::clone_branch(&url, &branch, checkout.path())?;

    info!("Bootstrapping the cluster from {url} ({branch})");
    Command::new(checkout.path().join(BOOTSTRAP_SCRIPT))
        .arg("preview")
        .current_dir(checkout.path())
        .envs(env)
        .check_run()
        .context("Error when bootstrapping cluster")
}

pub fn bootstrap_cluster_with_retry(env: &BTreeMap<String, String>) -> Result<()> {
    app::retry(BOOTSTRAP_ATTEMPTS, BOOTSTRAP_RETRY_DELAY, || bootstrap_cluster(env))
}

/// Register the default sandbox user through the toolchain operators.
pub fn register_user() -> Result<()> {
    app::block_on(async {
        let cluster = Cluster::connect().await?;
        sandbox::register_user(&cluster, sandbox::DEFAULT_USER, sandbox::DEFAULT_EMAIL).await
    })?
    .context("Error when registering user via toolchain operators")?;
    success!("Registered {}", sandbox::DEFAULT_USER);
    Ok(())
}

/// Run the live cluster suites with `env` applied.
pub fn run_e2e_tests(env: &BTreeMap<String, String>, artifact_dir: &Path) -> Result<()> {
    Command::new("cargo")
        .in_repo()
        .args(["test", "--features", "e2e-tests", "--test", "e2e", "--", "--test-threads=1"])
        .env("ARTIFACT_DIR", artifact_dir)
        .envs(env)
        .check_run()
}
