use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::{require, Token};
use crate::config::GitLabConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

/// A GitLab project with its last activity split for display.
///
/// The two activity fields are only present when GitLab reported
/// `last_activity_at`; they are skipped entirely otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub web_url: String,
    pub description: Option<String>,
    /// Last activity date as `MM-DD-YYYY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_at_mdy: Option<String>,
    /// Last activity time as `HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_at_hms: Option<String>,
}

impl Project {
    fn from_payload(payload: ProjectPayload) -> Self {
        let activity = payload
            .last_activity_at
            .as_deref()
            .and_then(|raw| parse_activity(&payload.name, raw));

        Self {
            last_activity_at_mdy: activity.map(|at| at.format("%m-%d-%Y").to_string()),
            last_activity_at_hms: activity.map(|at| at.format("%H:%M:%S").to_string()),
            name: payload.name,
            web_url: payload.web_url,
            description: payload.description,
        }
    }

    /// Both activity parts, when GitLab reported an activity timestamp.
    pub fn last_activity(&self) -> Option<(&str, &str)> {
        match (&self.last_activity_at_mdy, &self.last_activity_at_hms) {
            (Some(mdy), Some(hms)) => Some((mdy.as_str(), hms.as_str())),
            _ => None,
        }
    }
}

fn parse_activity(project: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unparseable last_activity_at '{raw}' on project '{project}': {e}");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectPayload {
    name: String,
    #[serde(default)]
    web_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    last_activity_at: Option<String>,
}

/// GitLab REST client listing the projects of one group.
pub struct GitLabClient {
    client: Client,
    base_url: String,
    token: Option<Token>,
    username: Option<String>,
    group_id: Option<String>,
}

impl GitLabClient {
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url(&config.base_url)?,
            token: config.token.as_deref().map(Token::from),
            username: config.username.clone(),
            group_id: config.group_id.clone(),
        })
    }

    /// Fetch the projects of the configured group in API order.
    ///
    /// # Errors
    ///
    /// Returns an error if the token, username or group id is missing, or if
    /// the request fails.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let token = require(self.token.as_ref(), "GITLAB_TOKEN")?;
        let username = require(self.username.as_deref(), "GITLAB_USERNAME")?;
        let group_id = require(self.group_id.as_deref(), "GITLAB_GROUP_ID")?;

        let url = format!("{}/api/v4/groups/{}/projects", self.base_url, group_id);
        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", token.as_str())
            .send()
            .await?;

        let payloads: Vec<ProjectPayload> = ensure_success(response).await?.json().await?;
        let projects: Vec<Project> = payloads.into_iter().map(Project::from_payload).collect();

        info!(
            "Fetched {} GitLab projects for group {group_id} as {username}",
            projects.len()
        );
        Ok(projects)
    }
}
