use anyhow::Result;
use clap::Args;

use crate::bundle::JavaPatchArgs;

/// Push Java build bundles whose SBOM step runs a custom request processor
///
/// The default Java pipeline bundle is read from the build pipeline selector. Both the
/// pipeline and its `s2i-java` task are pushed under tags derived from `--sha`, and the
/// new pipeline bundle is printed.
#[derive(Args, Debug)]
#[command()]
pub struct Cli {
    /// Commit the bundle tags are derived from
    #[arg(long, env = "PULL_PULL_SHA")]
    sha: String,

    #[command(flatten)]
    patch: JavaPatchArgs,
}

impl Cli {
    pub fn exec(self) -> Result<()> {
        let bundle = self.patch.run(&self.sha)?;
        display!("{bundle}");
        Ok(())
    }
}
