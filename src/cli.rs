use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::{Aggregator, Sources};
use crate::config::Config;
use crate::digest::format_digest;
use crate::server;
use crate::sources::DockerClient;
use crate::webex::WebexClient;

#[derive(Parser)]
#[command(name = "devdash")]
#[command(author, version, about = "DIY DevOps Dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./devdash.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(long, env = "DEVDASH_HOST")]
        host: Option<String>,

        #[arg(short, long, env = "DEVDASH_PORT")]
        port: Option<u16>,

        /// Refresh every source in the background every SECS seconds
        #[arg(long, value_name = "SECS")]
        refresh_interval: Option<u64>,

        /// Reuse fetched sections for SECS seconds
        #[arg(long, value_name = "SECS")]
        cache_ttl: Option<u64>,
    },

    /// Print the markdown digest
    Digest {
        /// Also post the digest to the configured Webex space
        #[arg(long, default_value_t = false)]
        post: bool,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref())
    }

    async fn execute_serve(
        &self,
        host: Option<&str>,
        port: Option<u16>,
        refresh_interval: Option<u64>,
        cache_ttl: Option<u64>,
    ) -> Result<()> {
        let mut config = self.load_config()?;

        if let Some(host) = host {
            config.server.host = host.to_owned();
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        if let Some(secs) = refresh_interval {
            anyhow::ensure!(secs > 0, "--refresh-interval must be at least 1 second");
            config.scheduler.enabled = true;
            config.scheduler.interval_secs = secs;
        }
        if let Some(secs) = cache_ttl {
            config.scheduler.cache_ttl_secs = secs;
        }

        server::serve(&config).await
    }

    async fn execute_digest(&self, post: bool) -> Result<()> {
        let config = self.load_config()?;

        let sources = Sources::from_config(&config, DockerClient::connect())
            .context("Failed to initialize source clients")?;
        let snapshot = Aggregator::new(sources, Duration::ZERO)
            .snapshot()
            .await
            .context("Failed to collect dashboard data")?;
        let digest = format_digest(&snapshot);

        println!("{digest}");

        if post {
            WebexClient::new(&config.webex)?
                .post_markdown(&digest)
                .await
                .context("Failed to post digest to Webex")?;
            info!("Digest posted to Webex Teams");
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Serve {
                host,
                port,
                refresh_interval,
                cache_ttl,
            } => {
                self.execute_serve(host.as_deref(), *port, *refresh_interval, *cache_ttl)
                    .await
            }
            Commands::Digest { post } => self.execute_digest(*post).await,
        }
    }
}
