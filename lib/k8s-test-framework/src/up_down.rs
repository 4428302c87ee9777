//! Fixtures that are created once and removed on drop.

use std::process::Command;

use tracing::{error, info};

use super::Result;
use crate::util::{run_command, run_command_blocking};

/// Which half of a fixture's lifecycle to build a command for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CommandToBuild {
    Up,
    Down,
}

/// Builds the `kubectl` invocations for a fixture.
pub trait CommandBuilder {
    fn build(&self, command_to_build: CommandToBuild) -> Command;

    /// Human readable name, used in logs.
    fn describe(&self) -> String;
}

/// Owns a fixture on the cluster.
///
/// Once [`Manager::up`] has run, dropping the manager tears the fixture
/// down with a blocking call unless [`Manager::down`] already did.
#[derive(Debug)]
pub struct Manager<B>
where
    B: CommandBuilder,
{
    command_builder: B,
    needs_drop: bool,
}

impl<B> Manager<B>
where
    B: CommandBuilder,
{
    /// Create a new Manager.
    pub const fn new(command_builder: B) -> Self {
        Self {
            command_builder,
            needs_drop: false,
        }
    }

    /// Bring up the fixture.
    pub async fn up(&mut self) -> Result<()> {
        self.needs_drop = true;
        info!(message = "Creating fixture.", fixture = %self.command_builder.describe());
        self.exec(CommandToBuild::Up).await
    }

    /// Tear down the fixture.
    pub async fn down(&mut self) -> Result<()> {
        self.needs_drop = false;
        info!(message = "Removing fixture.", fixture = %self.command_builder.describe());
        self.exec(CommandToBuild::Down).await
    }

    /// Tear down the fixture, blocking the current thread.
    pub fn down_blocking(&mut self) -> Result<()> {
        self.needs_drop = false;
        run_command_blocking(self.command_builder.build(CommandToBuild::Down))
    }

    /// Keep the fixture on the cluster after this manager is dropped.
    pub fn leak(&mut self) {
        self.needs_drop = false;
    }

    /// The builder this manager drives.
    pub const fn builder(&self) -> &B {
        &self.command_builder
    }

    async fn exec(&self, command_to_build: CommandToBuild) -> Result<()> {
        let command = self.command_builder.build(command_to_build);
        run_command(tokio::process::Command::from(command)).await
    }
}

impl<B> Drop for Manager<B>
where
    B: CommandBuilder,
{
    fn drop(&mut self) {
        if self.needs_drop
            && let Err(error) = self.down_blocking()
        {
            error!(
                message = "Fixture teardown failed.",
                fixture = %self.command_builder.describe(),
                %error,
            );
        }
    }
}
