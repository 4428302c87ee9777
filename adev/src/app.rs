use std::{
    borrow::Cow,
    ffi::OsStr,
    future::Future,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    sync::OnceLock,
    time::Duration,
};

use anyhow::{Context as _, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

static VERBOSITY: OnceLock<LevelFilter> = OnceLock::new();
static PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn verbosity() -> LevelFilter {
    VERBOSITY.get().copied().unwrap_or(LevelFilter::Info)
}

/// Root of the repository the tool operates on.
pub fn path() -> &'static Path {
    PATH.get().map_or(Path::new("."), PathBuf::as_path)
}

pub fn set_global_verbosity(verbosity: LevelFilter) {
    let _ = VERBOSITY.set(verbosity);
}

pub fn set_global_path(path: PathBuf) {
    let _ = PATH.set(path);
}

/// The closest ancestor of the working directory holding the harness
/// `Cargo.toml`.
pub fn find_repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Could not read the current directory")?;
    cwd.ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file() && dir.join("lib/wait-until").is_dir())
        .map(Path::to_path_buf)
        .context("Could not find the repository root, run from inside the repository")
}

/// Run a future to completion on a fresh single threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not start the async runtime")?;
    Ok(runtime.block_on(future))
}

/// Retry `operation` up to `attempts` times, sleeping `delay` between tries.
pub fn retry<T>(attempts: u32, delay: Duration, mut operation: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(error) if attempt < attempts => {
                warning!("Attempt {attempt}/{attempts} failed: {error:#}");
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

pub trait CommandExt {
    fn in_repo(&mut self) -> &mut Self;
    fn check_output(&mut self) -> Result<String>;
    fn check_run(&mut self) -> Result<()>;
    fn run(&mut self) -> Result<ExitStatus>;
    fn wait(&mut self, message: impl Into<Cow<'static, str>>) -> Result<()>;
    fn pre_exec(&self);
}

impl CommandExt for Command {
    fn in_repo(&mut self) -> &mut Self {
        self.current_dir(path())
    }

    fn check_output(&mut self) -> Result<String> {
        self.pre_exec();
        let output = self
            .output()
            .with_context(|| format!("Could not run `{}`", render_command(self)))?;
        if !output.status.success() {
            bail!(
                "command: {}\nfailed with exit code: {}\n{}",
                render_command(self),
                output.status.code().unwrap_or(1),
                String::from_utf8_lossy(&output.stderr),
            );
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    fn check_run(&mut self) -> Result<()> {
        let status = self.run()?;
        if status.success() {
            Ok(())
        } else {
            bail!(
                "command: {}\nfailed with exit code: {}",
                render_command(self),
                status.code().unwrap_or(1)
            )
        }
    }

    fn run(&mut self) -> Result<ExitStatus> {
        self.pre_exec();
        self.status()
            .with_context(|| format!("Could not run `{}`", render_command(self)))
    }

    fn wait(&mut self, message: impl Into<Cow<'static, str>>) -> Result<()> {
        self.pre_exec();
        let progress_bar = get_progress_bar()?;
        progress_bar.set_message(message);

        let result = self.output();
        progress_bar.finish_and_clear();
        let Ok(output) = result else {
            bail!("could not run command: {}", render_command(self))
        };

        if output.status.success() {
            Ok(())
        } else {
            bail!(
                "{}\nfailed with exit code: {}",
                String::from_utf8_lossy(&output.stdout),
                output.status.code().unwrap_or(1)
            )
        }
    }

    fn pre_exec(&self) {
        debug!("Running: {}", render_command(self));
    }
}

fn get_progress_bar() -> Result<ProgressBar> {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.enable_steady_tick(Duration::from_millis(125));
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner} {msg:.magenta.bold}")?
            // https://github.com/sindresorhus/cli-spinners/blob/master/spinners.json
            .tick_strings(&["∙∙∙", "●∙∙", "∙●∙", "∙∙●", "∙∙∙"]),
    );

    Ok(progress_bar)
}

fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}
