use anyhow::{Context as _, Result};
use appstudio_e2e::github::{GitHub, Repository};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{ArgAction, Args};
use regex::Regex;

use crate::app;

const DEFAULT_REPO_REGEX: &str = "jvm-build-suite|e2e-dotnet|build-suite-test|e2e-multiple-components|e2e-nodejs|pet-clinic-e2e|test-app|multi-component-application|e2e-quayio|petclinic";

/// Delete GitOps repositories the suites left behind in the test organization
///
/// Only repositories older than a day are considered, so concurrent runs keep theirs.
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    /// Names of the repositories to delete
    #[arg(long, env = "REPO_REGEX", default_value = DEFAULT_REPO_REGEX)]
    regex: String,

    /// List the repositories without deleting them
    #[arg(long, env = "DRY_RUN", default_value_t = true, action = ArgAction::Set)]
    dry_run: bool,

    /// Organization to clean up
    #[arg(long, env = "MY_GITHUB_ORG", default_value = "redhat-appstudio-qe")]
    org: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let regex = Regex::new(&self.regex).context("Invalid REPO_REGEX")?;
        let github = GitHub::new(Some(self.github_token), self.org);

        let repositories = app::block_on(github.repositories())??;
        let stale = stale_repositories(&repositories, &regex, Utc::now());
        if stale.is_empty() {
            info!("Nothing to clean up in {}", github.org());
            return Ok(());
        }

        if self.dry_run {
            info!("Dry run, would delete:");
            for repository in &stale {
                display!("{}", repository.html_url);
            }
            return Ok(());
        }

        app::block_on(async {
            for repository in &stale {
                match github.delete_repository(&repository.name).await {
                    Ok(()) => success!("Deleted {}", repository.full_name),
                    Err(error) => warning!("Could not delete {}: {error}", repository.full_name),
                }
            }
        })
    }
}

/// Repositories matching `regex` created more than a day before `now`.
fn stale_repositories<'a>(
    repositories: &'a [Repository],
    regex: &Regex,
    now: DateTime<Utc>,
) -> Vec<&'a Repository> {
    let cutoff = now - TimeDelta::days(1);
    repositories
        .iter()
        .filter(|repository| repository.created_at < cutoff && regex.is_match(&repository.name))
        .collect()
}
