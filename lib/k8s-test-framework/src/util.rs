use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{CommandFailedSnafu, OutputSnafu, Result, SpawnSnafu};

fn render(command: &std::process::Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn run_command(mut command: tokio::process::Command) -> Result<()> {
    let rendered = render(command.as_std());
    debug!(message = "Running command.", command = %rendered);

    let status = command
        .spawn()
        .context(SpawnSnafu {
            command: rendered.clone(),
        })?
        .wait()
        .await
        .context(SpawnSnafu {
            command: rendered.clone(),
        })?;
    ensure!(
        status.success(),
        CommandFailedSnafu {
            command: rendered,
            status
        }
    );
    Ok(())
}

pub fn run_command_blocking(mut command: std::process::Command) -> Result<()> {
    let rendered = render(&command);
    debug!(message = "Running command.", command = %rendered);

    let status = command
        .status()
        .context(SpawnSnafu {
            command: rendered.clone(),
        })?;
    ensure!(
        status.success(),
        CommandFailedSnafu {
            command: rendered,
            status
        }
    );
    Ok(())
}

pub async fn run_command_output(mut command: tokio::process::Command) -> Result<String> {
    let rendered = render(command.as_std());
    debug!(message = "Running command.", command = %rendered);

    let output = command.output().await.context(SpawnSnafu {
        command: rendered.clone(),
    })?;
    ensure!(
        output.status.success(),
        CommandFailedSnafu {
            command: rendered.clone(),
            status: output.status
        }
    );

    String::from_utf8(output.stdout).context(OutputSnafu { command: rendered })
}
