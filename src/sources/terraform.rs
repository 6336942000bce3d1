use log::{info, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{require, Token};
use crate::config::TerraformConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

const JSON_API: &str = "application/vnd.api+json";

/// A Terraform Cloud organization with its workspaces attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Filled by a second request per organization; empty if that request failed.
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Option<String>,
    pub attributes: Option<WorkspaceAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workspace {
    pub fn name(&self) -> Option<&str> {
        self.attributes.as_ref()?.name.as_deref()
    }
}

/// JSON:API document envelope.
#[derive(Debug, Deserialize)]
struct Document<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Web link to a workspace in the Terraform Cloud UI.
pub fn workspace_url(base: &str, organization: &str, workspace: &str) -> String {
    format!(
        "{}/app/{organization}/workspaces/{workspace}",
        base.trim_end_matches('/')
    )
}

pub struct TerraformClient {
    client: Client,
    base_url: String,
    token: Option<Token>,
}

impl TerraformClient {
    pub fn new(config: &TerraformConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url(&config.base_url)?,
            token: config.token.as_deref().map(Token::from),
        })
    }

    /// Base URL of the Terraform Cloud UI, for building workspace links.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch organizations, then the workspaces of each one.
    ///
    /// A failed workspace listing leaves that organization with no
    /// workspaces and does not stop the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or the organization list
    /// request fails.
    pub async fn fetch_organizations(&self) -> Result<Vec<Organization>> {
        let token = require(self.token.as_ref(), "TERRAFORM_TOKEN")?;

        let url = format!("{}/api/v2/organizations/", self.base_url);
        let mut organizations: Vec<Organization> = self.get_data(&url, token).await?;

        for organization in &mut organizations {
            let Some(org_id) = organization.id.clone() else {
                warn!("Skipping workspaces for an organization without id");
                continue;
            };

            let url = format!(
                "{}/api/v2/organizations/{}/workspaces",
                self.base_url, org_id
            );
            organization.workspaces = match self.get_data(&url, token).await {
                Ok(workspaces) => workspaces,
                Err(e) => {
                    warn!("Failed to fetch workspaces for organization {org_id}: {e}");
                    Vec::new()
                }
            };
        }

        info!("Fetched {} Terraform organizations", organizations.len());
        Ok(organizations)
    }

    async fn get_data<T>(&self, url: &str, token: &Token) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .header(CONTENT_TYPE, JSON_API)
            .send()
            .await?;

        let document: Document<T> = ensure_success(response).await?.json().await?;
        Ok(document.data)
    }
}
