use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{require, Token};
use crate::config::JenkinsConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

/// Decoded `/api/json` document of a Jenkins controller.
///
/// Only the job list is interpreted; every other top-level field is kept
/// as-is in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildListing {
    #[serde(default)]
    pub jobs: Vec<JenkinsJob>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A job entry. Jenkins omits fields for some item types (folders, views).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JenkinsJob {
    pub name: Option<String>,
    pub url: Option<String>,
    /// Ball color of the last build, e.g. `blue`, `red`, `notbuilt`
    pub color: Option<String>,
}

pub struct JenkinsClient {
    client: Client,
    url: String,
    username: String,
    token: Option<Token>,
}

impl JenkinsClient {
    pub fn new(config: &JenkinsConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: base_url(&config.url)?,
            username: config.username.clone(),
            token: config.token.as_deref().map(Token::from),
        })
    }

    /// Fetch the controller's job listing using basic auth.
    pub async fn fetch_builds(&self) -> Result<BuildListing> {
        let token = require(self.token.as_ref(), "JENKINS_TOKEN")?;

        let response = self
            .client
            .get(format!("{}/api/json", self.url))
            .basic_auth(&self.username, Some(token.as_str()))
            .send()
            .await?;

        let listing: BuildListing = ensure_success(response).await?.json().await?;

        info!("Fetched {} Jenkins jobs", listing.jobs.len());
        Ok(listing)
    }
}
