use anyhow::Result;
use clap::Args;

use crate::{job_spec::JobContext, webhook::WebhookArgs};

/// Send the signed webhook describing the current job
///
/// Periodic jobs and pull requests against e2e-tests or infra-deployments report. Other
/// jobs send nothing.
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    #[command(flatten)]
    webhook: WebhookArgs,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let context = JobContext::from_env()?;
        self.webhook.send_for_job(&context)
    }
}
