use std::process::Command;

use anyhow::Result;

use crate::app::CommandExt as _;

/// Clone URL of `repo` in the fork owned by `owner`.
pub fn fork_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{owner}/{repo}.git")
}

/// Fetch `owner`'s fork of `repo` and check out `revision` from it.
///
/// `revision` is a branch of the fork or a commit SHA.
pub fn checkout_remote_branch(owner: &str, repo: &str, revision: &str) -> Result<()> {
    if !remote_exists(owner)? {
        check_output(&["remote", "add", owner, &fork_url(owner, repo)])?;
    }
    check_output(&["fetch", owner])?;
    check_output(&["checkout", &checkout_target(owner, revision)])?;
    Ok(())
}

fn checkout_target(owner: &str, revision: &str) -> String {
    if is_commit_sha(revision) {
        revision.to_owned()
    } else {
        format!("{owner}/{revision}")
    }
}

fn is_commit_sha(revision: &str) -> bool {
    revision.len() == 40 && revision.chars().all(|c| c.is_ascii_hexdigit())
}

fn remote_exists(name: &str) -> Result<bool> {
    Ok(check_output(&["remote"])?.lines().any(|remote| remote == name))
}

/// Clone `url` at `branch` into `dir`.
pub fn clone_branch(url: &str, branch: &str, dir: &std::path::Path) -> Result<()> {
    Command::new("git")
        .args(["clone", "--depth", "1", "--branch", branch, url])
        .arg(dir)
        .wait(format!("Cloning {url}"))
}

fn check_output(args: &[&str]) -> Result<String> {
    Command::new("git").in_repo().args(args).check_output()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branches_are_checked_out_from_the_fork() {
        assert_eq!(checkout_target("octocat", "feature"), "octocat/feature");
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(checkout_target("octocat", sha), sha);
    }

    #[test]
    fn fork_urls_point_at_github() {
        assert_eq!(
            fork_url("octocat", "e2e-tests"),
            "https://github.com/octocat/e2e-tests.git"
        );
    }
}
