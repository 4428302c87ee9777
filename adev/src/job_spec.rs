//! The CI job a run belongs to, as described by Prow.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use appstudio_e2e::github::GitHub;
use serde::Deserialize;

/// Organization owning the repositories pull requests are paired across.
pub const UPSTREAM_ORG: &str = "redhat-appstudio";
pub const E2E_TESTS_REPO: &str = "e2e-tests";
pub const INFRA_DEPLOYMENTS_REPO: &str = "infra-deployments";

/// Client for the upstream organization, authenticated with `GITHUB_TOKEN`
/// when set.
pub fn upstream_github() -> GitHub {
    GitHub::new(std::env::var("GITHUB_TOKEN").ok(), UPSTREAM_ORG)
}

/// Prow's `JOB_SPEC`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct JobSpec {
    #[serde(default, rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub refs: Refs,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Refs {
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub repo_link: String,
    #[serde(default)]
    pub base_ref: String,
    #[serde(default)]
    pub pulls: Vec<Pull>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Pull {
    pub number: u64,
    pub author: String,
    pub sha: String,
}

/// The pull request under test, resolved against the GitHub API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PullRequestMetadata {
    pub author: String,
    pub organization: String,
    pub repo_name: String,
    pub commit_sha: String,
    pub number: u64,
    /// Owner of the fork the pull request comes from.
    pub remote_name: String,
    pub branch_name: String,
}

/// Everything a CI run knows about its job, read once from the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobContext {
    pub job_name: String,
    /// `periodic`, `presubmit` or `postsubmit`.
    pub job_type: String,
    pub artifact_dir: PathBuf,
    /// Absent for periodic and rehearsal jobs.
    pub spec: Option<JobSpec>,
    pub repo_owner: String,
    pub repo_name: String,
    pub pull_number: String,
    pub pull_pull_sha: String,
    pub in_ci: bool,
}

impl JobContext {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let mut context = Self {
            job_name: var("JOB_NAME"),
            job_type: var("JOB_TYPE"),
            artifact_dir: PathBuf::from(lookup("ARTIFACT_DIR").unwrap_or_else(|| ".".to_owned())),
            spec: None,
            repo_owner: var("REPO_OWNER"),
            repo_name: var("REPO_NAME"),
            pull_number: var("PULL_NUMBER"),
            pull_pull_sha: var("PULL_PULL_SHA"),
            in_ci: var("CI") == "true",
        };
        if !context.is_periodic_or_rehearsal() {
            let raw = var("JOB_SPEC");
            let spec = serde_json::from_str(&raw).context("Could not parse the JOB_SPEC job spec")?;
            context.spec = Some(spec);
        }
        Ok(context)
    }

    pub fn is_periodic(&self) -> bool {
        self.job_type == "periodic"
    }

    /// Such jobs test `main` of every repository and never pair branches.
    pub fn is_periodic_or_rehearsal(&self) -> bool {
        self.is_periodic() || self.job_name.contains("rehearse")
    }

    pub fn refs(&self) -> Option<&Refs> {
        self.spec.as_ref().map(|spec| &spec.refs)
    }

    /// The first pull of the job, the one under test.
    pub fn pull(&self) -> Result<&Pull> {
        self.refs()
            .and_then(|refs| refs.pulls.first())
            .context("The job spec names no pull request")
    }

    /// Look the pull request up to learn the fork and branch it comes from.
    pub async fn resolve_pull_request(&self, github: &GitHub) -> Result<PullRequestMetadata> {
        let refs = self.refs().context("The job has no job spec")?;
        let pull = self.pull()?;
        let found = github
            .pull_request(&refs.org, &refs.repo, pull.number)
            .await
            .context("Could not look up the pull request under test")?;
        let remote_name = found
            .head
            .repo
            .map_or_else(|| pull.author.clone(), |repo| repo.owner.login);
        Ok(PullRequestMetadata {
            author: pull.author.clone(),
            organization: refs.org.clone(),
            repo_name: refs.repo.clone(),
            commit_sha: pull.sha.clone(),
            number: pull.number,
            remote_name,
            branch_name: found.head.ref_,
        })
    }
}

/// Whether `repo` of the upstream organization has an open pull request from
/// the same fork and branch as the one under test.
///
/// Lookup failures fall back to testing against `main`.
pub async fn is_pairing_required(github: &GitHub, repo: &str, pr: &PullRequestMetadata) -> bool {
    match github.pull_requests(UPSTREAM_ORG, repo).await {
        Ok(pulls) => pulls
            .iter()
            .any(|pull| pull.head.ref_ == pr.branch_name && pull.user.login == pr.remote_name),
        Err(error) => {
            info!(
                "Cannot determine {repo} branches of {}: {error}. Sticking with the {UPSTREAM_ORG}/{repo} main branch.",
                pr.author
            );
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use indoc::indoc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    pub(crate) const PRESUBMIT_SPEC: &str = indoc! {r#"
        {
          "type": "presubmit",
          "job": "pull-ci-redhat-appstudio-build-service-main-e2e",
          "buildid": "1",
          "refs": {
            "org": "redhat-appstudio",
            "repo": "build-service",
            "repo_link": "https://github.com/redhat-appstudio/build-service",
            "base_ref": "main",
            "pulls": [
              {"number": 42, "author": "octocat", "sha": "0123abcd", "link": "https://github.com/redhat-appstudio/build-service/pull/42"}
            ]
          }
        }
    "#};

    pub(crate) fn context(vars: &[(&str, &str)]) -> Result<JobContext> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        JobContext::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn parses_presubmit_job_spec() {
        let context = context(&[("JOB_SPEC", PRESUBMIT_SPEC), ("JOB_TYPE", "presubmit")]).unwrap();
        let refs = context.refs().unwrap();
        assert_eq!(refs.repo, "build-service");
        assert_eq!(refs.repo_link, "https://github.com/redhat-appstudio/build-service");
        assert_eq!(
            context.pull().unwrap(),
            &Pull {
                number: 42,
                author: "octocat".to_owned(),
                sha: "0123abcd".to_owned(),
            }
        );
        assert_eq!(context.artifact_dir, PathBuf::from("."));
    }

    #[test]
    fn periodic_and_rehearsal_jobs_skip_the_job_spec() {
        let periodic = context(&[("JOB_TYPE", "periodic"), ("JOB_SPEC", "not json")]).unwrap();
        assert!(periodic.spec.is_none());

        let rehearsal = context(&[("JOB_NAME", "rehearse-1234-pull-ci-e2e")]).unwrap();
        assert!(rehearsal.is_periodic_or_rehearsal());
        assert!(rehearsal.pull().is_err());
    }

    #[test]
    fn invalid_job_spec_is_an_error() {
        let error = context(&[("JOB_TYPE", "presubmit"), ("JOB_SPEC", "{")]).unwrap_err();
        assert!(error.to_string().contains("JOB_SPEC"));
    }

    fn pull_json(branch: &str, login: &str) -> serde_json::Value {
        serde_json::json!({
            "number": 7,
            "user": {"login": login},
            "head": {
                "ref": branch,
                "sha": "ffff",
                "repo": {"name": "e2e-tests", "owner": {"login": login}}
            }
        })
    }

    #[tokio::test]
    async fn resolves_fork_and_branch_of_the_pull_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/redhat-appstudio/build-service/pulls/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pull_json("feature", "octocat")))
            .mount(&server)
            .await;
        let github = GitHub::with_base_url(&server.uri(), None, "redhat-appstudio-qe");

        let context = context(&[("JOB_SPEC", PRESUBMIT_SPEC)]).unwrap();
        let pr = context.resolve_pull_request(&github).await.unwrap();
        assert_eq!(pr.remote_name, "octocat");
        assert_eq!(pr.branch_name, "feature");
        assert_eq!(pr.commit_sha, "0123abcd");
        assert_eq!(pr.repo_name, "build-service");
    }

    #[tokio::test]
    async fn pairing_matches_branch_and_fork_owner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/redhat-appstudio/e2e-tests/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                pull_json("other", "octocat"),
                pull_json("feature", "octocat"),
            ])))
            .mount(&server)
            .await;
        let github = GitHub::with_base_url(&server.uri(), None, "redhat-appstudio-qe");

        let mut pr = PullRequestMetadata {
            remote_name: "octocat".to_owned(),
            branch_name: "feature".to_owned(),
            ..PullRequestMetadata::default()
        };
        assert!(is_pairing_required(&github, E2E_TESTS_REPO, &pr).await);

        pr.remote_name = "someone-else".to_owned();
        assert!(!is_pairing_required(&github, E2E_TESTS_REPO, &pr).await);
    }

    #[tokio::test]
    async fn pairing_lookup_failure_means_no_pairing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let github = GitHub::with_base_url(&server.uri(), None, "redhat-appstudio-qe");
        assert!(!is_pairing_required(&github, E2E_TESTS_REPO, &PullRequestMetadata::default()).await);
    }
}
