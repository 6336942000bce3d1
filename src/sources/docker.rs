use std::sync::Arc;

use async_trait::async_trait;
use bollard::models::ContainerSummary;
use bollard::query_parameters::ListContainersOptionsBuilder;
use bollard::Docker;
use log::{info, warn};
use serde::Serialize;

use crate::error::{DashError, Result};

/// Length of the abbreviated container id shown by `docker ps`.
const SHORT_ID_LEN: usize = 12;

/// A container known to the local engine, running or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub container_id: String,
    pub name: String,
    /// Engine state such as `running`, `exited` or `paused`
    pub status: String,
}

impl From<ContainerSummary> for Container {
    fn from(summary: ContainerSummary) -> Self {
        let container_id = summary
            .id
            .map(|id| id.chars().take(SHORT_ID_LEN).collect())
            .unwrap_or_default();

        // The engine reports names with a leading slash, e.g. "/web"
        let name = summary
            .names
            .and_then(|names| names.into_iter().next())
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_default();

        let status = summary
            .state
            .map(|state| state.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            container_id,
            name,
            status,
        }
    }
}

/// Access to a container engine's listing API.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// List every container regardless of state.
    async fn list_all_containers(&self) -> Result<Vec<Container>>;
}

#[async_trait]
impl ContainerEngine for Docker {
    async fn list_all_containers(&self) -> Result<Vec<Container>> {
        let options = ListContainersOptionsBuilder::default().all(true).build();
        let summaries = self.list_containers(Some(options)).await?;
        Ok(summaries.into_iter().map(Container::from).collect())
    }
}

/// Container source backed by the local engine.
///
/// Connection settings come from the environment (`DOCKER_HOST` or the
/// platform's default socket); there is no explicit configuration.
#[derive(Clone)]
pub struct DockerClient {
    engine: std::result::Result<Arc<dyn ContainerEngine>, String>,
}

impl DockerClient {
    /// Connect with the engine's local defaults.
    ///
    /// A connection failure is remembered and reported on every fetch instead
    /// of preventing startup.
    pub fn connect() -> Self {
        match Docker::connect_with_local_defaults() {
            Ok(docker) => Self::with_engine(Arc::new(docker)),
            Err(e) => {
                warn!("Container engine is not reachable: {e}");
                Self {
                    engine: Err(e.to_string()),
                }
            }
        }
    }

    pub fn with_engine(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine: Ok(engine) }
    }

    pub async fn fetch_containers(&self) -> Result<Vec<Container>> {
        let engine = self
            .engine
            .as_ref()
            .map_err(|reason| DashError::EngineUnavailable(reason.clone()))?;

        let containers = engine.list_all_containers().await?;

        info!("Fetched {} containers", containers.len());
        Ok(containers)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Engine returning a fixed listing, or failing when `containers` is `None`.
    pub(crate) struct FakeEngine {
        pub containers: Option<Vec<Container>>,
    }

    #[async_trait]
    impl ContainerEngine for FakeEngine {
        async fn list_all_containers(&self) -> Result<Vec<Container>> {
            self.containers
                .clone()
                .ok_or_else(|| DashError::EngineUnavailable("socket closed".to_string()))
        }
    }

    pub(crate) fn container(name: &str, status: &str) -> Container {
        Container {
            container_id: format!("{name}-id"),
            name: name.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_summary_conversion_shortens_id_and_trims_name() {
        let summary = ContainerSummary {
            id: Some("4f66ad9a0b2e7c1d3e5f7a9b1c3d5e7f".to_string()),
            names: Some(vec!["/web".to_string(), "/alias".to_string()]),
            ..Default::default()
        };

        let container = Container::from(summary);

        assert_eq!(container.container_id, "4f66ad9a0b2e");
        assert_eq!(container.name, "web");
        assert_eq!(container.status, "unknown");
    }

    #[test]
    fn test_summary_conversion_without_fields() {
        let container = Container::from(ContainerSummary::default());
        assert_eq!(container.container_id, "");
        assert_eq!(container.name, "");
    }

    #[tokio::test]
    async fn test_fetch_containers_from_engine() {
        let client = DockerClient::with_engine(Arc::new(FakeEngine {
            containers: Some(vec![container("db", "running"), container("job", "exited")]),
        }));

        let containers = client.fetch_containers().await.unwrap();

        assert_eq!(containers.len(), 2);
        assert_eq!(containers[1].status, "exited");
    }

    #[tokio::test]
    async fn test_engine_failure_is_an_error() {
        let client = DockerClient::with_engine(Arc::new(FakeEngine { containers: None }));

        let err = client.fetch_containers().await.unwrap_err();

        assert!(!err.is_fatal());
        assert!(err.to_string().contains("socket closed"));
    }
}
