use anyhow::{Result, bail};
use clap::Args;

use crate::{
    app,
    bundle::JavaPatchArgs,
    e2e,
    env::{self, CUSTOM_JAVA_PIPELINE_BUNDLE_ENV},
    job_spec::{self, E2E_TESTS_REPO, INFRA_DEPLOYMENTS_REPO, JobContext},
    webhook::WebhookArgs,
};

/// Install the platform and run the e2e suites for the job under test
///
/// Suite selection and component images follow the repository the job tests. A webhook
/// reports the run once the suites finish, whatever their outcome.
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    /// Image CI built from the pull request, as `repository@digest`
    #[arg(long, env = "COMPONENT_IMAGE", default_value = "")]
    component_image: String,

    #[command(flatten)]
    java: JavaPatchArgs,

    #[command(flatten)]
    webhook: WebhookArgs,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let context = JobContext::from_env()?;
        e2e::preflight_checks()?;

        let github = job_spec::upstream_github();
        let pr = if context.is_periodic_or_rehearsal() {
            None
        } else {
            Some(app::block_on(context.resolve_pull_request(&github))??)
        };
        let infra_pairing = match &pr {
            Some(pr) if pr.repo_name == E2E_TESTS_REPO => app::block_on(
                job_spec::is_pairing_required(&github, INFRA_DEPLOYMENTS_REPO, pr),
            )?,
            _ => false,
        };

        let mut env = env::derive_env(&context, &self.component_image, pr.as_ref(), infra_pairing);
        if context
            .refs()
            .is_some_and(|refs| env::needs_java_bundle(&refs.repo))
        {
            let bundle = self.java.run(&context.pull()?.sha)?;
            env.insert(CUSTOM_JAVA_PIPELINE_BUNDLE_ENV.to_owned(), bundle);
        }

        e2e::bootstrap_cluster_with_retry(&e2e::installer_env(&context, &env))?;
        e2e::register_user()?;

        let tests = e2e::run_e2e_tests(&env, &context.artifact_dir);

        if let Err(error) = self.webhook.send_for_job(&context) {
            warning!("Error when sending webhook: {error:#}");
        }

        if let Err(error) = tests {
            critical!("{error:#}");
            bail!("Error when running e2e tests, see the log above for more details");
        }
        Ok(())
    }
}
