//! Builds [`Snapshot`]s by running every fetcher in sequence.
//!
//! Both the dashboard page and the Webex digest read from the same snapshot,
//! so a digest request costs one round of fetches, not two. When a cache TTL
//! is configured, fresh sections are reused across requests and refreshed by
//! the background scheduler.

use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::snapshot::{Section, Snapshot, Source, SourceError};
use crate::sources::{
    BuildListing, Container, DeploymentListing, DockerClient, ElasticClient, GitHubClient,
    GitLabClient, JenkinsClient, Organization, Project, Repository, TerraformClient,
};

/// One client per external source.
pub struct Sources {
    pub github: GitHubClient,
    pub docker: DockerClient,
    pub gitlab: GitLabClient,
    pub jenkins: JenkinsClient,
    pub terraform: TerraformClient,
    pub elastic: ElasticClient,
}

impl Sources {
    pub fn from_config(config: &Config, docker: DockerClient) -> Result<Self> {
        Ok(Self {
            github: GitHubClient::new(&config.github)?,
            docker,
            gitlab: GitLabClient::new(&config.gitlab)?,
            jenkins: JenkinsClient::new(&config.jenkins)?,
            terraform: TerraformClient::new(&config.terraform)?,
            elastic: ElasticClient::new(&config.elastic)?,
        })
    }
}

/// A cached section and when it was fetched.
struct Slot<T> {
    entry: RwLock<Option<(Instant, T)>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    async fn fresh(&self, ttl: Duration) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < ttl)
            .map(|(_, value)| value.clone())
    }

    async fn store(&self, value: T) {
        *self.entry.write().await = Some((Instant::now(), value));
    }
}

/// Successful sections keyed by source.
struct SectionCache {
    ttl: Duration,
    repositories: Slot<Vec<Repository>>,
    containers: Slot<Vec<Container>>,
    projects: Slot<Vec<Project>>,
    builds: Slot<BuildListing>,
    organizations: Slot<Vec<Organization>>,
    deployments: Slot<DeploymentListing>,
}

impl SectionCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            repositories: Slot::new(),
            containers: Slot::new(),
            projects: Slot::new(),
            builds: Slot::new(),
            organizations: Slot::new(),
            deployments: Slot::new(),
        }
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }
}

/// Runs the fetchers and assembles snapshots.
pub struct Aggregator {
    sources: Sources,
    cache: SectionCache,
}

impl Aggregator {
    /// Create an aggregator. A zero `cache_ttl` fetches everything on every call.
    pub fn new(sources: Sources, cache_ttl: Duration) -> Self {
        Self {
            sources,
            cache: SectionCache::new(cache_ttl),
        }
    }

    /// Fetch (or reuse) every section, one source after another.
    ///
    /// # Errors
    ///
    /// Only configuration errors are returned; any other fetch failure is
    /// logged and recorded in its section.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let sources = &self.sources;
        let cache = &self.cache;

        Ok(Snapshot {
            repositories: self
                .section(Source::GitHub, &cache.repositories, false, || {
                    sources.github.fetch_repositories()
                })
                .await?,
            containers: self
                .section(Source::Docker, &cache.containers, false, || {
                    sources.docker.fetch_containers()
                })
                .await?,
            projects: self
                .section(Source::GitLab, &cache.projects, false, || {
                    sources.gitlab.fetch_projects()
                })
                .await?,
            builds: self
                .section(Source::Jenkins, &cache.builds, false, || {
                    sources.jenkins.fetch_builds()
                })
                .await?,
            organizations: self
                .section(Source::Terraform, &cache.organizations, false, || {
                    sources.terraform.fetch_organizations()
                })
                .await?,
            deployments: self
                .section(Source::Elastic, &cache.deployments, false, || {
                    sources.elastic.fetch_deployments()
                })
                .await?,
            terraform_url: sources.terraform.base_url().to_string(),
        })
    }

    /// Fetch one source now and store the result in the cache.
    ///
    /// Returns the source's failure, if it failed, so the caller can report it.
    pub async fn refresh(&self, source: Source) -> Result<Option<SourceError>> {
        let sources = &self.sources;
        let cache = &self.cache;

        let failure = match source {
            Source::GitHub => self
                .section(source, &cache.repositories, true, || {
                    sources.github.fetch_repositories()
                })
                .await?
                .err(),
            Source::Docker => self
                .section(source, &cache.containers, true, || {
                    sources.docker.fetch_containers()
                })
                .await?
                .err(),
            Source::GitLab => self
                .section(source, &cache.projects, true, || {
                    sources.gitlab.fetch_projects()
                })
                .await?
                .err(),
            Source::Jenkins => self
                .section(source, &cache.builds, true, || sources.jenkins.fetch_builds())
                .await?
                .err(),
            Source::Terraform => self
                .section(source, &cache.organizations, true, || {
                    sources.terraform.fetch_organizations()
                })
                .await?
                .err(),
            Source::Elastic => self
                .section(source, &cache.deployments, true, || {
                    sources.elastic.fetch_deployments()
                })
                .await?
                .err(),
        };

        Ok(failure)
    }

    async fn section<T, F, Fut>(
        &self,
        source: Source,
        slot: &Slot<T>,
        force: bool,
        fetch: F,
    ) -> Result<Section<T>>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.cache.enabled() && !force {
            if let Some(cached) = slot.fresh(self.cache.ttl).await {
                debug!("Serving {source} data from cache");
                return Ok(Ok(cached));
            }
        }

        match fetch().await {
            Ok(value) => {
                if self.cache.enabled() {
                    slot.store(value.clone()).await;
                }
                Ok(Ok(value))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Failed to fetch {source} data: {e}");
                Ok(Err(SourceError {
                    origin: source,
                    reason: e.to_string(),
                }))
            }
        }
    }
}
