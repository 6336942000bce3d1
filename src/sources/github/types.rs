use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for commit timestamps on the dashboard and in the digest.
pub const COMMIT_DATE_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// A GitHub repository enriched with its most recent commit.
#[derive(Debug, Clone, Serialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Web URL of the repository
    pub url: String,
    /// Short description, if the owner set one
    pub description: Option<String>,
    /// Primary language detected by GitHub
    pub language: Option<String>,
    /// Author date of the newest commit on the default branch.
    ///
    /// `None` when the repository has no commits or the commit lookup failed.
    pub latest_commit: Option<DateTime<Utc>>,
}

impl Repository {
    /// Latest commit date formatted for display.
    pub fn latest_commit_date(&self) -> Option<String> {
        self.latest_commit
            .map(|date| date.format(COMMIT_DATE_FORMAT).to_string())
    }
}

/// Repository entry from `GET /users/{user}/repos`.
#[derive(Debug, Deserialize)]
pub(super) struct RepositoryPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Commit entry from `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Deserialize)]
pub(super) struct CommitPayload {
    pub commit: CommitDetails,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitDetails {
    #[serde(default)]
    pub author: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitSignature {
    pub date: DateTime<Utc>,
}
