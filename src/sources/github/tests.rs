use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};

use super::*;
use crate::config::GitHubConfig;
use crate::error::DashError;

fn client_for(server: &Server) -> GitHubClient {
    GitHubClient::new(&GitHubConfig {
        username: Some("octocat".to_string()),
        token: Some("ghp_test".to_string()),
        api_url: server.url(),
        web_url: "https://github.com".to_string(),
    })
    .unwrap()
}

fn commits_body(date: &str) -> String {
    format!(r#"[{{"sha": "abc", "commit": {{"author": {{"name": "Octo", "date": "{date}"}}}}}}]"#)
}

fn repository(name: &str, latest_commit: Option<chrono::DateTime<Utc>>) -> Repository {
    Repository {
        name: name.to_string(),
        url: format!("https://github.com/octocat/{name}"),
        description: None,
        language: None,
        latest_commit,
    }
}

#[tokio::test]
async fn test_fetch_repositories_sorted_by_latest_commit() {
    let mut server = Server::new_async().await;

    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .match_header("authorization", "Token ghp_test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"name": "old", "language": "Rust"}, {"name": "new", "description": "fresh"}]"#)
        .create_async()
        .await;
    let _old = server
        .mock("GET", "/repos/octocat/old/commits")
        .with_status(200)
        .with_body(commits_body("2022-03-01T10:00:00Z"))
        .create_async()
        .await;
    let _new = server
        .mock("GET", "/repos/octocat/new/commits")
        .with_status(200)
        .with_body(commits_body("2023-07-15T08:30:00Z"))
        .create_async()
        .await;

    let repos = client_for(&server).fetch_repositories().await.unwrap();

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].name, "new");
    assert_eq!(repos[0].url, "https://github.com/octocat/new");
    assert_eq!(repos[0].description.as_deref(), Some("fresh"));
    assert_eq!(
        repos[0].latest_commit_date().as_deref(),
        Some("07-15-2023 08:30:00")
    );
    assert_eq!(repos[1].name, "old");
    assert_eq!(repos[1].language.as_deref(), Some("Rust"));
}

#[tokio::test]
async fn test_commit_failure_only_affects_that_repository() {
    let mut server = Server::new_async().await;

    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .with_status(200)
        .with_body(r#"[{"name": "alpha"}, {"name": "broken"}, {"name": "gamma"}]"#)
        .create_async()
        .await;
    let _alpha = server
        .mock("GET", "/repos/octocat/alpha/commits")
        .with_status(200)
        .with_body(commits_body("2023-01-01T00:00:00Z"))
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/repos/octocat/broken/commits")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let _gamma = server
        .mock("GET", "/repos/octocat/gamma/commits")
        .with_status(200)
        .with_body(commits_body("2023-02-01T00:00:00Z"))
        .create_async()
        .await;

    let repos = client_for(&server).fetch_repositories().await.unwrap();

    let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["gamma", "alpha", "broken"]);
    assert!(repos[0].latest_commit.is_some());
    assert!(repos[1].latest_commit.is_some());
    assert!(repos[2].latest_commit.is_none());
}

#[tokio::test]
async fn test_empty_commit_list_means_no_commit_date() {
    let mut server = Server::new_async().await;

    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .with_status(200)
        .with_body(r#"[{"name": "empty"}]"#)
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octocat/empty/commits")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let repos = client_for(&server).fetch_repositories().await.unwrap();

    assert_eq!(repos.len(), 1);
    assert!(repos[0].latest_commit_date().is_none());
}

#[tokio::test]
async fn test_list_failure_is_an_error() {
    let mut server = Server::new_async().await;

    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .with_status(401)
        .with_body(r#"{"message": "Bad credentials"}"#)
        .create_async()
        .await;
    let commits = server
        .mock("GET", Matcher::Regex(r"^/repos/.*".to_string()))
        .expect(0)
        .create_async()
        .await;

    let result = client_for(&server).fetch_repositories().await;

    assert!(matches!(result, Err(DashError::Api { status: 401, .. })));
    commits.assert_async().await;
}

#[tokio::test]
async fn test_missing_token_is_fatal() {
    let client = GitHubClient::new(&GitHubConfig {
        username: Some("octocat".to_string()),
        ..GitHubConfig::default()
    })
    .unwrap();

    let err = client.fetch_repositories().await.unwrap_err();

    assert!(err.is_fatal());
    assert!(err.to_string().contains("GITHUB_ACCESS_TOKEN"));
}

#[test]
fn test_undated_repositories_sort_last() {
    let date = |day| Some(Utc.with_ymd_and_hms(2023, 5, day, 12, 0, 0).unwrap());

    let mut repos = vec![
        repository("none-1", None),
        repository("mid", date(10)),
        repository("none-2", None),
        repository("latest", date(20)),
        repository("earliest", date(1)),
    ];

    sort_by_latest_commit(&mut repos);

    let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["latest", "mid", "earliest", "none-1", "none-2"]);
}
