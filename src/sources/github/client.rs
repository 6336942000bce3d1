use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;

use crate::auth::{require, Token};
use crate::config::GitHubConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

use super::types::{CommitPayload, Repository, RepositoryPayload};

/// GitHub REST client listing a user's repositories.
pub struct GitHubClient {
    /// HTTP client
    client: Client,
    /// Base URL for the REST API
    api_url: String,
    /// Base URL for repository web links
    web_url: String,
    username: Option<String>,
    token: Option<Token>,
}

impl GitHubClient {
    /// Create a new GitHub client from configuration.
    ///
    /// Credentials are only checked when fetching, so a dashboard with a
    /// partially configured environment can still start.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_url: base_url(&config.api_url)?,
            web_url: base_url(&config.web_url)?,
            username: config.username.clone(),
            token: config.token.as_deref().map(Token::from),
        })
    }

    /// Fetch the user's repositories, newest commit first.
    ///
    /// Issues one list request plus one commit request per repository. A
    /// failed commit request only clears that repository's commit date.
    ///
    /// # Errors
    ///
    /// Returns an error if the username or token is missing, or if the
    /// repository list request fails.
    pub async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        let username = require(self.username.as_deref(), "GITHUB_USERNAME")?;
        let token = require(self.token.as_ref(), "GITHUB_ACCESS_TOKEN")?;

        let url = format!("{}/users/{}/repos", self.api_url, username);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Token {}", token.as_str()))
            .send()
            .await?;

        let listed: Vec<RepositoryPayload> = ensure_success(response).await?.json().await?;

        let mut repositories = Vec::with_capacity(listed.len());
        for payload in listed {
            let latest_commit = self.latest_commit(username, token, &payload.name).await;

            repositories.push(Repository {
                url: format!("{}/{}/{}", self.web_url, username, payload.name),
                name: payload.name,
                description: payload.description,
                language: payload.language,
                latest_commit,
            });
        }

        sort_by_latest_commit(&mut repositories);

        info!("Fetched {} GitHub repositories", repositories.len());
        Ok(repositories)
    }

    async fn latest_commit(
        &self,
        username: &str,
        token: &Token,
        repo: &str,
    ) -> Option<DateTime<Utc>> {
        match self.fetch_commits(username, token, repo).await {
            Ok(commits) => commits
                .into_iter()
                .next()
                .and_then(|commit| commit.commit.author)
                .map(|author| author.date),
            Err(e) => {
                warn!("Failed to fetch activity for repository '{repo}': {e}");
                None
            }
        }
    }

    async fn fetch_commits(
        &self,
        username: &str,
        token: &Token,
        repo: &str,
    ) -> Result<Vec<CommitPayload>> {
        let url = format!("{}/repos/{}/{}/commits", self.api_url, username, repo);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Token {}", token.as_str()))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }
}

/// Orders repositories by latest commit, newest first.
///
/// Repositories without a commit date go last and keep their relative order.
pub fn sort_by_latest_commit(repositories: &mut [Repository]) {
    repositories.sort_by(|a, b| b.latest_commit.cmp(&a.latest_commit));
}
