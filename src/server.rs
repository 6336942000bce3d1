use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::aggregate::{Aggregator, Sources};
use crate::config::Config;
use crate::digest::format_digest;
use crate::error::DashError;
use crate::output::page::render_dashboard;
use crate::scheduler;
use crate::sources::DockerClient;
use crate::webex::WebexClient;

const SCRIPT: &str = include_str!("../static/script.js");

/// Shared by every request handler.
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub webex: WebexClient,
}

impl AppState {
    pub fn from_config(config: &Config, docker: DockerClient) -> crate::error::Result<Self> {
        let sources = Sources::from_config(config, docker)?;
        Ok(Self {
            aggregator: Arc::new(Aggregator::new(sources, config.scheduler.cache_ttl())),
            webex: WebexClient::new(&config.webex)?,
        })
    }
}

/// A failed request, answered with 500 and the error text.
struct AppError(DashError);

impl From<DashError> for AppError {
    fn from(e: DashError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/post_to_webex", get(post_to_webex))
        .route("/static/script.js", get(script))
        .route("/health", get(health))
        .with_state(state)
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let snapshot = state.aggregator.snapshot().await?;
    Ok(Html(render_dashboard(&snapshot)))
}

async fn post_to_webex(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    state.webex.ensure_configured()?;
    let snapshot = state.aggregator.snapshot().await?;
    state.webex.post_markdown(&format_digest(&snapshot)).await?;
    Ok("Data posted to Webex Teams")
}

async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], SCRIPT)
}

async fn health() -> &'static str {
    "ok"
}

/// Run the dashboard until Ctrl+C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(
        AppState::from_config(config, DockerClient::connect())
            .context("Failed to initialize source clients")?,
    );

    let shutdown = CancellationToken::new();
    let refreshers = if config.scheduler.enabled {
        scheduler::spawn(
            Arc::clone(&state.aggregator),
            config.scheduler.interval(),
            &shutdown,
        )
    } else {
        Vec::new()
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Dashboard running at http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    shutdown.cancel();
    for handle in refreshers {
        if let Err(e) = handle.await {
            warn!("Refresh task ended abnormally: {e}");
        }
    }

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{config_for, fake_docker, mock_sources};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mockito::{Matcher, Server};
    use tower::ServiceExt;

    fn router_for(config: &Config) -> Router {
        build_router(Arc::new(
            AppState::from_config(config, fake_docker()).unwrap(),
        ))
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_dashboard_renders_every_source() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &[]).await;

        let (status, body) = get_text(router_for(&config_for(&server)), "/").await;

        assert_eq!(status, StatusCode::OK);
        for expected in ["devdash", "web", "infra", "nightly", "prod", "main-es"] {
            assert!(body.contains(expected), "missing {expected}");
        }
        assert!(!body.contains("Unavailable"));
    }

    #[tokio::test]
    async fn test_dashboard_survives_a_failed_source() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &["/api/json"]).await;
        let _jobs = server
            .mock("GET", "/api/json")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let (status, body) = get_text(router_for(&config_for(&server)), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("Unavailable:").count(), 1);
        assert!(body.contains("maintenance"));
        for expected in ["devdash", "web", "infra", "prod", "main-es"] {
            assert!(body.contains(expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_missing_configuration_is_a_server_error() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &[]).await;
        let mut config = config_for(&server);
        config.github.token = None;

        let (status, body) = get_text(router_for(&config), "/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("GITHUB_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn test_post_to_webex_sends_digest() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &[]).await;
        let message = server
            .mock("POST", "/v1/messages")
            .match_header("authorization", "Bearer wx")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({"roomId": "room"})),
                Matcher::Regex("Ref ID: main-es".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"id": "msg-1"}"#)
            .create_async()
            .await;

        let (status, body) = get_text(router_for(&config_for(&server)), "/post_to_webex").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Data posted to Webex Teams");
        message.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_to_webex_checks_credentials_before_fetching() {
        let mut server = Server::new_async().await;
        let repos = server
            .mock("GET", "/users/octocat/repos")
            .expect(0)
            .create_async()
            .await;
        let mut config = config_for(&server);
        config.webex.token = None;

        let (status, body) = get_text(router_for(&config), "/post_to_webex").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("WEBEX_TEAMS_ACCESS_TOKEN"));
        repos.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_webex_post_is_a_server_error() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &[]).await;
        let _message = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body("bad token")
            .create_async()
            .await;

        let (status, _) = get_text(router_for(&config_for(&server)), "/post_to_webex").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let server = Server::new_async().await;

        let (status, body) = get_text(router_for(&config_for(&server)), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_script_is_served() {
        let server = Server::new_async().await;
        let app = router_for(&config_for(&server));
        let req = Request::builder()
            .uri("/static/script.js")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/javascript");
    }
}
