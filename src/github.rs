//! A small GitHub REST client covering what the suites and the CI tooling
//! need: repositories of the test organization and pull requests.

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    E2eConfig, Result,
    error::{GitHubSnafu, GitHubStatusSnafu},
};

pub const API_URL: &str = "https://api.github.com";

const PAGE_SIZE: usize = 100;
const USER_AGENT: &str = concat!("appstudio-e2e/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct User {
    pub login: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub user: User,
    pub head: PullRequestHead,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PullRequestHead {
    /// Branch name.
    #[serde(rename = "ref")]
    pub ref_: String,
    pub sha: String,
    /// Missing when the fork was deleted.
    pub repo: Option<HeadRepository>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct HeadRepository {
    pub name: String,
    pub owner: User,
}

/// Client bound to one organization.
#[derive(Clone, Debug)]
pub struct GitHub {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    org: String,
}

impl GitHub {
    pub fn new(token: Option<String>, org: impl Into<String>) -> Self {
        Self::with_base_url(API_URL, token, org)
    }

    pub fn from_config(config: &E2eConfig) -> Self {
        Self::new(config.github_token.clone(), config.github_org.clone())
    }

    pub fn with_base_url(base_url: &str, token: Option<String>, org: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
            org: org.into(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(message = "GitHub request.", %method, %url);
        let builder = self
            .http
            .request(method, url)
            .header("accept", "application/vnd.github+json")
            .header("user-agent", USER_AGENT);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, action: String, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .context(GitHubSnafu { action: action.clone() })?;
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, action: String, request: RequestBuilder) -> Result<T> {
        let response = self.send(action.clone(), request).await?;
        let response = check_status(&action, response).await?;
        response.json().await.context(GitHubSnafu { action })
    }

    /// Whether `name` exists in the organization.
    pub async fn repository_exists(&self, name: &str) -> Result<bool> {
        let action = format!("get repository {}/{name}", self.org);
        let request = self.request(Method::GET, &format!("/repos/{}/{name}", self.org));
        let response = self.send(action.clone(), request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(&action, response).await?;
        Ok(true)
    }

    /// Every repository of the organization, following pagination.
    pub async fn repositories(&self) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();
        for page in 1.. {
            let request = self
                .request(Method::GET, &format!("/orgs/{}/repos", self.org))
                .query(&[("per_page", PAGE_SIZE), ("page", page)]);
            let batch: Vec<Repository> = self
                .json(format!("list repositories of {} (page {page})", self.org), request)
                .await?;
            let last = batch.len() < PAGE_SIZE;
            repositories.extend(batch);
            if last {
                break;
            }
        }
        Ok(repositories)
    }

    pub async fn delete_repository(&self, name: &str) -> Result<()> {
        let action = format!("delete repository {}/{name}", self.org);
        let request = self.request(Method::DELETE, &format!("/repos/{}/{name}", self.org));
        let response = self.send(action.clone(), request).await?;
        check_status(&action, response).await?;
        Ok(())
    }

    pub async fn pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let request = self.request(Method::GET, &format!("/repos/{owner}/{repo}/pulls/{number}"));
        self.json(format!("get pull request {owner}/{repo}#{number}"), request)
            .await
    }

    /// Open pull requests of a repository, first page only.
    pub async fn pull_requests(&self, owner: &str, repo: &str) -> Result<Vec<PullRequest>> {
        let request = self
            .request(Method::GET, &format!("/repos/{owner}/{repo}/pulls"))
            .query(&[("per_page", PAGE_SIZE)]);
        self.json(format!("list pull requests of {owner}/{repo}"), request)
            .await
    }
}

async fn check_status(action: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    GitHubStatusSnafu {
        action,
        status,
        body,
    }
    .fail()
}
