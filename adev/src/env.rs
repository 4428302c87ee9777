//! Environment the e2e suites run with, derived from the CI job.

use std::collections::BTreeMap;

use crate::job_spec::{E2E_TESTS_REPO, INFRA_DEPLOYMENTS_REPO, JobContext, PullRequestMetadata};

pub const TEST_SUITE_LABEL_ENV: &str = "E2E_TEST_SUITE_LABEL";
pub const CUSTOM_JAVA_PIPELINE_BUNDLE_ENV: &str = "CUSTOM_JAVA_PIPELINE_BUILD_BUNDLE";

/// How a platform service repository is tested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepoProfile {
    pub repo: &'static str,
    /// Prefix of the `*_IMAGE_REPO`, `*_IMAGE_TAG`, `*_PR_OWNER` and
    /// `*_PR_SHA` variables the installer reads.
    pub env_prefix: &'static str,
    pub image_tag_suffix: &'static str,
    pub test_suite_label: &'static str,
}

pub static REPO_PROFILES: [RepoProfile; 3] = [
    RepoProfile {
        repo: "application-service",
        env_prefix: "HAS",
        image_tag_suffix: "has-image",
        test_suite_label: "has,e2e-demo",
    },
    RepoProfile {
        repo: "build-service",
        env_prefix: "BUILD_SERVICE",
        image_tag_suffix: "build-service-image",
        test_suite_label: "build",
    },
    RepoProfile {
        repo: "jvm-build-service",
        env_prefix: "JVM_BUILD_SERVICE",
        image_tag_suffix: "jvm-build-service-image",
        test_suite_label: "jvm-build",
    },
];

pub fn profile(repo: &str) -> Option<&'static RepoProfile> {
    REPO_PROFILES.iter().find(|profile| profile.repo == repo)
}

/// Whether pull requests of `repo` need a patched Java pipeline bundle.
pub fn needs_java_bundle(repo: &str) -> bool {
    repo == "jvm-build-service"
}

/// Variables to run the suites with.
///
/// `component_image` is the image CI built from the pull request, as
/// `repo@digest`. `infra_pairing` tells whether an `e2e-tests` pull request
/// has a paired `infra-deployments` branch.
pub fn derive_env(
    context: &JobContext,
    component_image: &str,
    pr: Option<&PullRequestMetadata>,
    infra_pairing: bool,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    if context.job_name.contains("hacbs-e2e-periodic") {
        env.insert(TEST_SUITE_LABEL_ENV.to_owned(), "HACBS".to_owned());
        return env;
    }
    if context.job_name.contains("appstudio-e2e-deployment-periodic") {
        env.insert(TEST_SUITE_LABEL_ENV.to_owned(), "!HACBS".to_owned());
        return env;
    }

    let Some(refs) = context.refs() else {
        return env;
    };
    if refs.repo == E2E_TESTS_REPO {
        if infra_pairing {
            insert_infra_branch(&mut env, pr);
        }
    } else if refs.repo == INFRA_DEPLOYMENTS_REPO {
        insert_infra_branch(&mut env, pr);
    } else if refs.repo.contains("-service") {
        let Some(profile) = profile(&refs.repo) else {
            warning!("No test profile for {}, running with defaults", refs.repo);
            return env;
        };
        let prefix = profile.env_prefix;
        let image_repo = component_image.split('@').next().unwrap_or_default();
        env.insert(format!("{prefix}_IMAGE_REPO"), image_repo.to_owned());
        env.insert(
            format!("{prefix}_IMAGE_TAG"),
            format!("redhat-appstudio-{}", profile.image_tag_suffix),
        );
        if let Some(pull) = refs.pulls.first() {
            env.insert(format!("{prefix}_PR_OWNER"), pull.author.clone());
            env.insert(format!("{prefix}_PR_SHA"), pull.sha.clone());
        }
        env.insert(
            TEST_SUITE_LABEL_ENV.to_owned(),
            profile.test_suite_label.to_owned(),
        );
    }

    env
}

fn insert_infra_branch(env: &mut BTreeMap<String, String>, pr: Option<&PullRequestMetadata>) {
    if let Some(pr) = pr {
        env.insert("INFRA_DEPLOYMENTS_ORG".to_owned(), pr.remote_name.clone());
        env.insert("INFRA_DEPLOYMENTS_BRANCH".to_owned(), pr.branch_name.clone());
    }
}
