use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::sources::{
    BuildListing, Container, DeploymentListing, Organization, Project, Repository,
};

/// The external systems the dashboard reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    GitHub,
    Docker,
    GitLab,
    Jenkins,
    Terraform,
    Elastic,
}

impl Source {
    /// Every source, in dashboard order.
    pub const ALL: [Source; 6] = [
        Source::GitHub,
        Source::Docker,
        Source::GitLab,
        Source::Jenkins,
        Source::Terraform,
        Source::Elastic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Source::GitHub => "GitHub",
            Source::Docker => "Docker",
            Source::GitLab => "GitLab",
            Source::Jenkins => "Jenkins",
            Source::Terraform => "Terraform Cloud",
            Source::Elastic => "Elastic Cloud",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a source produced no data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{origin} unavailable: {reason}")]
pub struct SourceError {
    pub origin: Source,
    pub reason: String,
}

/// Outcome of one fetcher: its records, or the reason they are missing.
pub type Section<T> = std::result::Result<T, SourceError>;

/// Records of a list section, or nothing if the source failed.
pub fn items<T>(section: &Section<Vec<T>>) -> &[T] {
    section.as_ref().map(Vec::as_slice).unwrap_or(&[])
}

/// Everything one page render or one digest is built from.
///
/// Built once per request (or served from the cache) and never modified.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub repositories: Section<Vec<Repository>>,
    pub containers: Section<Vec<Container>>,
    pub projects: Section<Vec<Project>>,
    pub builds: Section<BuildListing>,
    pub organizations: Section<Vec<Organization>>,
    pub deployments: Section<DeploymentListing>,
    /// Terraform Cloud UI base, for workspace links
    pub terraform_url: String,
}
