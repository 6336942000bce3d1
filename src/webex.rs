use log::info;
use reqwest::Client;
use serde::Serialize;

use crate::auth::{require, Token};
use crate::config::WebexConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

/// Body of `POST /v1/messages`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMessage<'a> {
    room_id: &'a str,
    markdown: &'a str,
}

/// Posts messages to a Webex space.
pub struct WebexClient {
    client: Client,
    base_url: String,
    token: Option<Token>,
    space_id: Option<String>,
}

impl WebexClient {
    pub fn new(config: &WebexConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url(&config.base_url)?,
            token: config.token.as_deref().map(Token::from),
            space_id: config.space_id.clone(),
        })
    }

    /// Check that a token and space id are configured.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first absent variable.
    pub fn ensure_configured(&self) -> Result<()> {
        require(self.token.as_ref(), "WEBEX_TEAMS_ACCESS_TOKEN")?;
        require(self.space_id.as_deref(), "WEBEX_TEAMS_SPACE_ID")?;
        Ok(())
    }

    /// Post a markdown message to the configured space.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or space id is missing, or if Webex
    /// rejects the message.
    pub async fn post_markdown(&self, markdown: &str) -> Result<()> {
        let token = require(self.token.as_ref(), "WEBEX_TEAMS_ACCESS_TOKEN")?;
        let room_id = require(self.space_id.as_deref(), "WEBEX_TEAMS_SPACE_ID")?;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(token.as_str())
            .json(&CreateMessage { room_id, markdown })
            .send()
            .await?;

        ensure_success(response).await?;

        info!("Posted {} byte digest to Webex space", markdown.len());
        Ok(())
    }
}
