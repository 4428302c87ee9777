use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use crate::e2e;

/// Install the platform in preview mode on the current cluster
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    /// Fork of infra-deployments to install from
    #[arg(long, env = "INFRA_DEPLOYMENTS_ORG")]
    infra_org: Option<String>,

    /// Branch of infra-deployments to install from
    #[arg(long, env = "INFRA_DEPLOYMENTS_BRANCH")]
    infra_branch: Option<String>,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        e2e::preflight_checks()?;

        let mut env = BTreeMap::new();
        if let Some(org) = self.infra_org {
            env.insert("INFRA_DEPLOYMENTS_ORG".to_owned(), org);
        }
        if let Some(branch) = self.infra_branch {
            env.insert("INFRA_DEPLOYMENTS_BRANCH".to_owned(), branch);
        }
        e2e::bootstrap_cluster(&env)?;
        e2e::register_user()
    }
}
