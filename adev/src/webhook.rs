//! Test result notifications, signed like GitHub webhooks.

use anyhow::{Context as _, Result, bail};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::job_spec::{E2E_TESTS_REPO, INFRA_DEPLOYMENTS_REPO, JobContext, UPSTREAM_ORG};

pub const DEFAULT_SALT: &str = "123456789";
pub const DEFAULT_TARGET_URL: &str = "https://smee.io/JgVqn2oYFPY1CF";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Where webhooks go and how they are signed.
#[derive(clap::Args, Clone, Debug)]
pub struct WebhookArgs {
    /// Key of the payload signature
    #[arg(long = "webhook-salt", env = "WEBHOOK_SALT_SECRET", default_value = DEFAULT_SALT, hide_env_values = true)]
    pub salt: String,

    /// Receiver of the webhook
    #[arg(long = "webhook-target-url", env = "WEBHOOK_TARGET_URL", default_value = DEFAULT_TARGET_URL)]
    pub target_url: String,
}

impl WebhookArgs {
    /// Report the run of `context`, when its job reports at all.
    pub fn send_for_job(&self, context: &JobContext) -> Result<()> {
        let path = std::env::current_exe()
            .context("Could not resolve the adev executable")?
            .display()
            .to_string();
        let Some(webhook) = Webhook::for_job(context, path) else {
            return Ok(());
        };
        let response = crate::app::block_on(webhook.send(&self.salt, &self.target_url))??;
        info!("Webhook response: {response}");
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Webhook {
    /// Executable that sent the webhook.
    pub path: String,
    pub repository: Repository,
    pub repository_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub full_name: String,
    pub pull_number: String,
}

impl Webhook {
    /// The webhook reporting on `context`, if its job reports at all.
    ///
    /// Periodic jobs report against `infra-deployments`; pull request jobs
    /// only for `e2e-tests` and `infra-deployments`.
    pub fn for_job(context: &JobContext, path: String) -> Option<Self> {
        if context.job_name.contains("hacbs-e2e-periodic") {
            info!("Not sending a webhook for the HACBS periodic job");
            return None;
        }

        let (owner, name, pull_number, repository_url) = if context.is_periodic() {
            (
                UPSTREAM_ORG.to_owned(),
                INFRA_DEPLOYMENTS_REPO.to_owned(),
                "periodic".to_owned(),
                format!("https://github.com/{UPSTREAM_ORG}/{INFRA_DEPLOYMENTS_REPO}"),
            )
        } else if context.repo_name == E2E_TESTS_REPO || context.repo_name == INFRA_DEPLOYMENTS_REPO {
            (
                context.repo_owner.clone(),
                context.repo_name.clone(),
                context.pull_number.clone(),
                context
                    .refs()
                    .map(|refs| refs.repo_link.clone())
                    .unwrap_or_default(),
            )
        } else {
            info!(
                "Sending a webhook for job type {}, job {} is not supported",
                context.job_type, context.job_name
            );
            return None;
        };

        Some(Self {
            path,
            repository: Repository {
                full_name: format!("{owner}/{name}"),
                pull_number,
            },
            repository_url,
        })
    }

    /// Post the webhook, returning the response body.
    pub async fn send(&self, salt: &str, target_url: &str) -> Result<String> {
        let body = serde_json::to_vec(self)?;
        let response = reqwest::Client::new()
            .post(target_url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature(salt, &body)?)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Could not send the webhook to {target_url}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Could not read the webhook response")?;
        if !status.is_success() {
            bail!("Webhook receiver answered {status}: {text}");
        }
        Ok(text)
    }
}

/// `sha256=` followed by the hex HMAC-SHA256 of `body` keyed with `salt`.
pub fn signature(salt: &str, body: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes())
        .context("Invalid webhook salt")?;
    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
