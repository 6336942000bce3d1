//! Fetchers for the six external status sources.
//!
//! Each client performs one sequential request/transform cycle and returns a
//! typed record set. Failures are returned as [`DashError`] values; deciding
//! whether a failure hides a section or fails the request is left to the
//! aggregation step.

pub mod docker;
pub mod elastic;
pub mod github;
pub mod gitlab;
pub mod jenkins;
pub mod terraform;

use reqwest::{Client, Response};
use url::Url;

use crate::error::{DashError, Result};

pub use docker::{Container, DockerClient};
pub use elastic::{DeploymentListing, ElasticClient};
pub use github::{GitHubClient, Repository};
pub use gitlab::{GitLabClient, Project};
pub use jenkins::{BuildListing, JenkinsClient};
pub use terraform::{Organization, TerraformClient};

/// Builds the HTTP client shared by every REST source.
pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("devdash/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DashError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Turns a non-success response into `DashError::Api`, keeping the body for logs.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(DashError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Validates a configured base URL and strips trailing slashes so paths can
/// be appended with `format!`.
pub(crate) fn base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| DashError::Config(format!("Invalid base URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DashError::Config(format!(
            "Invalid base URL '{raw}': expected http or https"
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
