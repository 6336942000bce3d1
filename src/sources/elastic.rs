use log::info;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{require, Token};
use crate::config::ElasticConfig;
use crate::error::Result;
use crate::sources::{base_url, ensure_success, http_client};

/// Response of `GET /api/v1/deployments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentListing {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub resources: Option<Vec<DeploymentResource>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One resource (Elasticsearch, Kibana, APM, ...) of a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentResource {
    pub ref_id: Option<String>,
    pub kind: Option<String>,
    pub region: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct ElasticClient {
    client: Client,
    base_url: String,
    api_key: Option<Token>,
}

impl ElasticClient {
    pub fn new(config: &ElasticConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url(&config.base_url)?,
            api_key: config.api_key.as_deref().map(Token::from),
        })
    }

    pub async fn fetch_deployments(&self) -> Result<DeploymentListing> {
        let api_key = require(self.api_key.as_ref(), "ELASTIC_API_KEY")?;

        let response = self
            .client
            .get(format!("{}/api/v1/deployments", self.base_url))
            .header(AUTHORIZATION, format!("ApiKey {}", api_key.as_str()))
            .send()
            .await?;

        let listing: DeploymentListing = ensure_success(response).await?.json().await?;

        info!("Fetched {} Elastic Cloud deployments", listing.deployments.len());
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use mockito::Server;

    fn client_for(server: &Server) -> ElasticClient {
        ElasticClient::new(&ElasticConfig {
            api_key: Some("ec-key".to_string()),
            base_url: server.url(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_deployments() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/deployments")
            .match_header("authorization", "ApiKey ec-key")
            .with_status(200)
            .with_body(
                r#"{"deployments": [
                    {"id": "d1", "name": "search", "healthy": true, "resources": [
                        {"ref_id": "main-elasticsearch", "kind": "elasticsearch", "region": "gcp-us-central1"},
                        {"ref_id": "main-kibana", "kind": "kibana"}
                    ]},
                    {"id": "d2", "name": "logs"}
                ]}"#,
            )
            .create_async()
            .await;

        let listing = client_for(&server).fetch_deployments().await.unwrap();

        assert_eq!(listing.deployments.len(), 2);
        let search = &listing.deployments[0];
        assert_eq!(search.name.as_deref(), Some("search"));
        assert_eq!(search.extra["healthy"], true);
        let resources = search.resources.as_ref().unwrap();
        assert_eq!(resources[0].ref_id.as_deref(), Some("main-elasticsearch"));
        assert_eq!(resources[1].kind.as_deref(), Some("kibana"));
        assert!(listing.deployments[1].resources.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/deployments")
            .with_status(502)
            .create_async()
            .await;

        let result = client_for(&server).fetch_deployments().await;
        assert!(matches!(result, Err(DashError::Api { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let client = ElasticClient::new(&ElasticConfig::default()).unwrap();
        let err = client.fetch_deployments().await.unwrap_err();
        assert!(matches!(err, DashError::MissingConfig("ELASTIC_API_KEY")));
    }
}
