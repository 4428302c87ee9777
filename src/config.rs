//! Harness configuration, read once from the environment.

use std::time::Duration;

use rand::{Rng, distr::Alphanumeric};
use snafu::{OptionExt, ensure};

use crate::{
    Result,
    error::InvalidConfigSnafu,
};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const GITHUB_ORG_ENV: &str = "MY_GITHUB_ORG";
pub const QUAY_ORG_ENV: &str = "QUAY_E2E_ORGANIZATION";
pub const NAMESPACE_PREFIX_ENV: &str = "E2E_NAMESPACE_PREFIX";
pub const TEST_SUITE_LABEL_ENV: &str = "E2E_TEST_SUITE_LABEL";
pub const DEFAULT_TIMEOUT_ENV: &str = "E2E_DEFAULT_TIMEOUT";
pub const PIPELINE_TIMEOUT_ENV: &str = "E2E_PIPELINE_TIMEOUT";

const DEFAULT_ORG: &str = "redhat-appstudio-qe";

/// Settings shared by every suite.
#[derive(Clone, Debug, PartialEq)]
pub struct E2eConfig {
    pub github_token: Option<String>,
    pub github_org: String,
    pub quay_org: String,
    pub namespace_prefix: String,
    pub suites: SuiteFilter,
    /// Used by waits on resources that settle quickly.
    pub default_timeout: Duration,
    /// Used by waits on pipeline runs.
    pub pipeline_timeout: Duration,
}

impl E2eConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let duration = |name: &'static str, default: Duration| -> Result<Duration> {
            match non_empty(name) {
                None => Ok(default),
                Some(value) => {
                    let parsed = humantime::parse_duration(value.trim()).map_err(|error| {
                        InvalidConfigSnafu {
                            name,
                            reason: error.to_string(),
                        }
                        .build()
                    })?;
                    ensure!(
                        !parsed.is_zero(),
                        InvalidConfigSnafu {
                            name,
                            reason: "must be longer than zero",
                        }
                    );
                    Ok(parsed)
                }
            }
        };

        Ok(Self {
            github_token: non_empty(GITHUB_TOKEN_ENV),
            github_org: non_empty(GITHUB_ORG_ENV).unwrap_or_else(|| DEFAULT_ORG.to_owned()),
            quay_org: non_empty(QUAY_ORG_ENV).unwrap_or_else(|| DEFAULT_ORG.to_owned()),
            namespace_prefix: non_empty(NAMESPACE_PREFIX_ENV).unwrap_or_else(|| "e2e".to_owned()),
            suites: SuiteFilter::parse(&non_empty(TEST_SUITE_LABEL_ENV).unwrap_or_default()),
            default_timeout: duration(DEFAULT_TIMEOUT_ENV, Duration::from_secs(2 * 60))?,
            pipeline_timeout: duration(PIPELINE_TIMEOUT_ENV, Duration::from_secs(10 * 60))?,
        })
    }

    pub fn github_token(&self) -> Result<&str> {
        self.github_token.as_deref().context(InvalidConfigSnafu {
            name: GITHUB_TOKEN_ENV,
            reason: "not set",
        })
    }

    /// A fresh namespace name for `suite`, unique enough to run suites in
    /// parallel on one cluster.
    pub fn generate_namespace(&self, suite: &str) -> String {
        format!("{}-{}-{}", self.namespace_prefix, suite, random_string(4))
    }
}

/// Lowercase alphanumeric string usable in Kubernetes object names.
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// Selects suites by label.
///
/// The filter is a comma separated list. A bare label enables suites carrying
/// it, a label prefixed with `!` disables them. An empty filter enables every
/// suite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl SuiteFilter {
    pub fn parse(filter: &str) -> Self {
        let mut parsed = Self::default();
        for label in filter.split(',').map(str::trim).filter(|label| !label.is_empty()) {
            match label.strip_prefix('!') {
                Some(negated) => parsed.exclude.push(negated.trim().to_owned()),
                None => parsed.include.push(label.to_owned()),
            }
        }
        parsed
    }

    pub fn enabled(&self, labels: &[&str]) -> bool {
        if self
            .exclude
            .iter()
            .any(|excluded| labels.contains(&excluded.as_str()))
        {
            return false;
        }
        self.include.is_empty()
            || self
                .include
                .iter()
                .any(|included| labels.contains(&included.as_str()))
    }
}
