//! Configuration types for the API clients and the verification plugin

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.tenderly.co";
pub const DEFAULT_RPC_URL: &str = "https://rpc.tenderly.co";
pub const DEFAULT_DASHBOARD_URL: &str = "https://dashboard.tenderly.co";

/// Environment variable consulted when no access key is set in the config file
pub const ACCESS_KEY_ENV: &str = "TENDERLY_ACCESS_KEY";

/// Main configuration shared by the service client and the plugin
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PluginConfig {
    /// Endpoints and transport settings
    pub api: ApiSettings,

    /// Project the contracts are pushed to and how they are verified
    pub project: ProjectSettings,
}

/// Endpoints and transport settings for the API clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the REST API
    pub base_url: Url,

    /// Base URL of the RPC-style API used for fork endpoints
    pub rpc_url: Url,

    /// Base URL of the dashboard used in printed links
    pub dashboard_url: Url,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Project and verification mode settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectSettings {
    /// Account (user or organization) owning the project
    pub username: Option<String>,

    /// Project slug
    pub project: Option<String>,

    /// Push contracts to the project instead of verifying them publicly
    pub private_verification: bool,

    /// Verify on this fork instead of a public network
    pub fork_id: Option<String>,

    /// Fork transaction the tracked contracts were deployed on top of
    pub head: Option<String>,

    /// Chain the tracked contracts are deployed on
    pub chain_id: Option<u64>,

    /// API access key. Falls back to `TENDERLY_ACCESS_KEY` when absent.
    pub access_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: parse_default_url(DEFAULT_API_URL),
            rpc_url: parse_default_url(DEFAULT_RPC_URL),
            dashboard_url: parse_default_url(DEFAULT_DASHBOARD_URL),
            timeout_secs: 30,
        }
    }
}

fn parse_default_url(url: &str) -> Url {
    Url::parse(url).expect("default url is valid")
}

impl ApiSettings {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Dashboard base without a trailing slash, used to build links
    pub fn dashboard_base(&self) -> &str {
        self.dashboard_url.as_str().trim_end_matches('/')
    }
}

impl PluginConfig {
    /// Reads the configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: PluginConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Credentials to use for API calls.
    ///
    /// The key from the config file wins over the environment.
    pub fn credentials(&self) -> Credentials {
        match &self.project.access_key {
            Some(key) => Credentials::new(key.clone()),
            None => Credentials::from_env(),
        }
    }

    /// Validates the entire configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(eyre::eyre!("api.timeout_secs must be greater than zero"));
        }

        if self.project.private_verification || self.project.fork_id.is_some() {
            if self.project.username.is_none() {
                return Err(eyre::eyre!(
                    "project.username is required for private or fork verification"
                ));
            }
            if self.project.project.is_none() {
                return Err(eyre::eyre!(
                    "project.project is required for private or fork verification"
                ));
            }
        }

        Ok(())
    }

    /// Create a new builder for PluginConfig
    pub fn builder() -> PluginConfigBuilder {
        PluginConfigBuilder::default()
    }
}

/// Builder for creating PluginConfig with a fluent API
#[derive(Default)]
pub struct PluginConfigBuilder {
    config: PluginConfig,
}

impl PluginConfigBuilder {
    /// Set the REST API base URL
    pub fn base_url(mut self, url: Url) -> Self {
        self.config.api.base_url = url;
        self
    }

    /// Set the RPC API base URL
    pub fn rpc_url(mut self, url: Url) -> Self {
        self.config.api.rpc_url = url;
        self
    }

    /// Set the dashboard base URL
    pub fn dashboard_url(mut self, url: Url) -> Self {
        self.config.api.dashboard_url = url;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.api.timeout_secs = secs;
        self
    }

    /// Set the project owner and slug
    pub fn project(mut self, username: impl Into<String>, project: impl Into<String>) -> Self {
        self.config.project.username = Some(username.into());
        self.config.project.project = Some(project.into());
        self
    }

    /// Push contracts privately instead of verifying them publicly
    pub fn private_verification(mut self, private: bool) -> Self {
        self.config.project.private_verification = private;
        self
    }

    /// Verify on a fork
    pub fn fork(mut self, fork_id: impl Into<String>) -> Self {
        self.config.project.fork_id = Some(fork_id.into());
        self
    }

    /// Set the fork head sent with fork verifications
    pub fn fork_head(mut self, head: impl Into<String>) -> Self {
        self.config.project.head = Some(head.into());
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.config.project.chain_id = Some(chain_id);
        self
    }

    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.config.project.access_key = Some(key.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PluginConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Explicit authentication state passed to every client-constructing call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    access_key: Option<String>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            access_key: Some(access_key.into()),
        }
    }

    /// No credentials; only anonymous endpoints are reachable
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Reads the access key from `TENDERLY_ACCESS_KEY`
    pub fn from_env() -> Self {
        match std::env::var(ACCESS_KEY_ENV) {
            Ok(key) => Self::new(key),
            Err(_) => Self::anonymous(),
        }
    }

    /// True when a non-blank access key is present
    pub fn is_authenticated(&self) -> bool {
        self.access_key().is_some()
    }

    pub fn access_key(&self) -> Option<&str> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
