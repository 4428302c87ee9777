use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use clap::Args;

use crate::{e2e, env::TEST_SUITE_LABEL_ENV};

/// Run the e2e suites against the current cluster
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    /// Label filter selecting the suites, such as `HACBS` or `!HACBS`
    #[arg(long, env = TEST_SUITE_LABEL_ENV)]
    label_filter: Option<String>,

    /// Where suites write their artifacts
    #[arg(long, env = "ARTIFACT_DIR", default_value = ".")]
    artifact_dir: PathBuf,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let env: BTreeMap<_, _> = self
            .label_filter
            .into_iter()
            .map(|filter| (TEST_SUITE_LABEL_ENV.to_owned(), filter))
            .collect();
        e2e::run_e2e_tests(&env, &self.artifact_dir)
    }
}
