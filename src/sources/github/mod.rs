mod client;
mod types;

#[cfg(test)]
mod tests;

pub use client::{sort_by_latest_commit, GitHubClient};
pub use types::Repository;
