//! Background refresh of every source.
//!
//! Each source gets its own recurring task and its own child cancellation
//! token. Refreshed sections land in the aggregator's cache, which request
//! handlers read from, so scheduled and request-triggered fetches do not
//! duplicate work while the cache entry is fresh.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregator;
use crate::snapshot::Source;

/// Spawn one refresh loop per source.
///
/// The loops run until `shutdown` is cancelled. The first refresh happens
/// immediately so the cache is warm before the first page load.
pub fn spawn(
    aggregator: Arc<Aggregator>,
    interval: Duration,
    shutdown: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    info!(
        "Refreshing {} sources every {}s",
        Source::ALL.len(),
        interval.as_secs()
    );

    Source::ALL
        .into_iter()
        .map(|source| {
            let token = shutdown.child_token();
            let aggregator = Arc::clone(&aggregator);
            tokio::spawn(refresh_loop(aggregator, source, interval, token))
        })
        .collect()
}

async fn refresh_loop(
    aggregator: Arc<Aggregator>,
    source: Source,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = token.cancelled() => {
                debug!("Stopping {source} refresh");
                break;
            }
            _ = ticker.tick() => {
                match aggregator.refresh(source).await {
                    Ok(None) => debug!("Refreshed {source} data"),
                    // Already logged by the aggregator
                    Ok(Some(_)) => {}
                    Err(e) => warn!("Scheduled {source} refresh failed: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{config_for, fake_docker, mock_sources};
    use crate::aggregate::Sources;
    use mockito::Server;

    #[tokio::test]
    async fn test_scheduler_refreshes_until_cancelled() {
        let mut server = Server::new_async().await;
        let _mocks = mock_sources(&mut server, &["/api/json"]).await;
        let jobs = server
            .mock("GET", "/api/json")
            .with_status(200)
            .with_body(r#"{"jobs": []}"#)
            .expect_at_least(2)
            .create_async()
            .await;

        let sources = Sources::from_config(&config_for(&server), fake_docker()).unwrap();
        let aggregator = Arc::new(Aggregator::new(sources, Duration::from_secs(600)));
        let shutdown = CancellationToken::new();

        let handles = spawn(aggregator, Duration::from_millis(20), &shutdown);
        assert_eq!(handles.len(), Source::ALL.len());

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.cancel();

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("refresh loop did not stop")
                .unwrap();
        }

        jobs.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancelled_before_start_exits() {
        let server = Server::new_async().await;
        let sources = Sources::from_config(&config_for(&server), fake_docker()).unwrap();
        let aggregator = Arc::new(Aggregator::new(sources, Duration::ZERO));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let handles = spawn(aggregator, Duration::from_secs(3600), &shutdown);

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("refresh loop did not stop")
                .unwrap();
        }
    }
}
