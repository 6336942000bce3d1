use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration file structure for devdash.
///
/// Values come from an optional configuration file and are then overridden by
/// environment variables (including those listed in a local `.env` file), so
/// credentials never have to be written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// GitHub repositories source
    #[serde(default)]
    pub github: GitHubConfig,

    /// GitLab group projects source
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Jenkins job listing source
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Terraform Cloud organizations source
    #[serde(default)]
    pub terraform: TerraformConfig,

    /// Elastic Cloud deployments source
    #[serde(default)]
    pub elastic: ElasticConfig,

    /// Webex space receiving the digest
    #[serde(default)]
    pub webex: WebexConfig,

    /// Background refresh and cache settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Account whose repositories are listed
    pub username: Option<String>,

    /// Personal access token
    pub token: Option<String>,

    /// REST API base URL
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Web URL used to build repository links
    #[serde(default = "default_github_web_url")]
    pub web_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// Private access token
    pub token: Option<String>,

    pub username: Option<String>,

    /// Group whose projects are listed
    pub group_id: Option<String>,

    /// GitLab instance base URL
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// API token used as the basic-auth password
    pub token: Option<String>,

    /// Basic-auth user the token belongs to
    #[serde(default = "default_jenkins_username")]
    pub username: String,

    #[serde(default = "default_jenkins_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TerraformConfig {
    pub token: Option<String>,

    /// Terraform Cloud base URL, also used for workspace links
    #[serde(default = "default_terraform_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElasticConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_elastic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebexConfig {
    /// Bot or integration access token
    pub token: Option<String>,

    /// Room the digest is posted to
    pub space_id: Option<String>,

    #[serde(default = "default_webex_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Refresh every source in the background
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between background refreshes of a source
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds a fetched section stays fresh; 0 disables caching
    #[serde(default)]
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            api_url: default_github_api_url(),
            web_url: default_github_web_url(),
        }
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            group_id: None,
            base_url: default_gitlab_base_url(),
        }
    }
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: default_jenkins_username(),
            url: default_jenkins_url(),
        }
    }
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_terraform_base_url(),
        }
    }
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_elastic_base_url(),
        }
    }
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            token: None,
            space_id: None,
            base_url: default_webex_base_url(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            cache_ttl_secs: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// How long fetched sections stay fresh.
    ///
    /// With the scheduler on and no explicit TTL, sections live for one
    /// refresh interval so page loads read what the scheduler fetched.
    pub fn cache_ttl(&self) -> Duration {
        if self.enabled && self.cache_ttl_secs == 0 {
            self.interval()
        } else {
            Duration::from_secs(self.cache_ttl_secs)
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_web_url() -> String {
    "https://github.com".to_string()
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_jenkins_username() -> String {
    "admin".to_string()
}

fn default_jenkins_url() -> String {
    // Jenkins runs on the host while devdash usually runs in a container
    "http://host.docker.internal:8080".to_string()
}

fn default_terraform_base_url() -> String {
    "https://app.terraform.io".to_string()
}

fn default_elastic_base_url() -> String {
    "https://api.elastic-cloud.com".to_string()
}

fn default_webex_base_url() -> String {
    "https://webexapis.com".to_string()
}

fn default_interval_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./devdash.toml
    /// 3. ./devdash.json
    /// 4. ./devdash.yaml
    /// 5. ./devdash.yml
    ///
    /// Starts from defaults if no file is found. A `.env` file in the current
    /// directory is loaded into the process environment, then environment
    /// variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;

        if let Ok(dotenv_path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", dotenv_path.display());
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail once the server is running.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.scheduler.enabled || self.scheduler.interval_secs > 0,
            "scheduler.interval-secs must be at least 1 second when the scheduler is enabled"
        );
        Ok(())
    }

    fn load_file(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["devdash.toml", "devdash.json", "devdash.yaml", "devdash.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Override file values with environment variables.
    ///
    /// Empty variables are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let overrides: [(&str, &mut Option<String>); 10] = [
            ("GITHUB_USERNAME", &mut self.github.username),
            ("GITHUB_ACCESS_TOKEN", &mut self.github.token),
            ("GITLAB_TOKEN", &mut self.gitlab.token),
            ("GITLAB_USERNAME", &mut self.gitlab.username),
            ("GITLAB_GROUP_ID", &mut self.gitlab.group_id),
            ("JENKINS_TOKEN", &mut self.jenkins.token),
            ("TERRAFORM_TOKEN", &mut self.terraform.token),
            ("ELASTIC_API_KEY", &mut self.elastic.api_key),
            ("WEBEX_TEAMS_ACCESS_TOKEN", &mut self.webex.token),
            ("WEBEX_TEAMS_SPACE_ID", &mut self.webex.space_id),
        ];

        for (key, slot) in overrides {
            if let Some(value) = var(key) {
                *slot = Some(value);
            }
        }

        if let Some(username) = var("JENKINS_USERNAME") {
            self.jenkins.username = username;
        }
        if let Some(url) = var("JENKINS_URL") {
            self.jenkins.url = url;
        }
    }
}
