use anyhow::Result;
use clap::Args;

use crate::{
    app, git,
    job_spec::{self, E2E_TESTS_REPO, JobContext},
};

/// Check out the e2e-tests revision the job under test pairs with
///
/// Pull requests against e2e-tests check out their own commit. Pull requests against other
/// repositories check out the e2e-tests branch of the same fork and name, if one is open
/// upstream. Periodic and rehearsal jobs stay on `main`.
#[derive(Args, Debug)]
#[command()]
pub struct Cli {}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let context = JobContext::from_env()?;
        if context.is_periodic_or_rehearsal() {
            info!("Periodic or rehearsal job, testing e2e-tests main");
            return Ok(());
        }

        let github = job_spec::upstream_github();
        let pr = app::block_on(context.resolve_pull_request(&github))??;

        if pr.repo_name == E2E_TESTS_REPO {
            git::checkout_remote_branch(&pr.remote_name, E2E_TESTS_REPO, &pr.commit_sha)?;
            success!("Checked out {} of {}/{E2E_TESTS_REPO}", pr.commit_sha, pr.remote_name);
        } else if app::block_on(job_spec::is_pairing_required(&github, E2E_TESTS_REPO, &pr))? {
            git::checkout_remote_branch(&pr.remote_name, E2E_TESTS_REPO, &pr.branch_name)?;
            success!(
                "Paired with {}/{E2E_TESTS_REPO} branch {}",
                pr.remote_name,
                pr.branch_name
            );
        } else {
            info!("No paired e2e-tests branch, testing e2e-tests main");
        }
        Ok(())
    }
}
