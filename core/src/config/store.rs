//! Configuration Store
//!
//! Loads and saves the studio's TOML config file and layers environment
//! overrides on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::AgentRole;
use crate::util::{sanitize_base_url, sanitize_stream_url, validate_api_key};

pub const ENV_BASE_URL: &str = "STUDIO_BASE_URL";
pub const ENV_STREAM_URL: &str = "STUDIO_STREAM_URL";
pub const ENV_API_KEY: &str = "STUDIO_API_KEY";

/// Unified studio configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Reject agent payloads that match no known response shape
    #[serde(default)]
    pub strict_decoding: bool,

    /// Agent invocation endpoint
    #[serde(default)]
    pub backend: BackendConfig,

    /// Live activity channel
    #[serde(default)]
    pub stream: StreamConfig,

    /// Agent ids per role
    #[serde(default)]
    pub agents: AgentIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_invoke_path")]
    pub invoke_path: String,

    /// Sent as `x-api-key` when present
    #[serde(default)]
    pub api_key: Option<String>,

    /// Unset means wait for the backend indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            invoke_path: default_invoke_path(),
            api_key: None,
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,

    /// Delay between the invocation settling and stream teardown
    #[serde(default = "default_disconnect_grace_ms")]
    pub disconnect_grace_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            disconnect_grace_ms: default_disconnect_grace_ms(),
        }
    }
}

impl StreamConfig {
    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_millis(self.disconnect_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIds {
    #[serde(default = "default_coordinator")]
    pub coordinator: String,

    #[serde(default = "default_post_writer")]
    pub post_writer: String,

    #[serde(default = "default_image_creator")]
    pub image_creator: String,
}

impl Default for AgentIds {
    fn default() -> Self {
        Self {
            coordinator: default_coordinator(),
            post_writer: default_post_writer(),
            image_creator: default_image_creator(),
        }
    }
}

impl AgentIds {
    pub fn for_role(&self, role: AgentRole) -> &str {
        match role {
            AgentRole::ContentCoordinator => &self.coordinator,
            AgentRole::PostWriter => &self.post_writer,
            AgentRole::ImageCreator => &self.image_creator,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Serialize as it would be saved
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when no file exists, then apply environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("studio").join("config.toml"))
    }

    /// Directory for the debug log
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("studio"))
    }

    /// Apply environment variable overrides
    ///
    /// - `STUDIO_BASE_URL` → `backend.base_url`
    /// - `STUDIO_STREAM_URL` → `stream.url`
    /// - `STUDIO_API_KEY` → `backend.api_key`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            if !base_url.is_empty() {
                self.backend.base_url = base_url;
            }
        }

        if let Ok(stream_url) = env::var(ENV_STREAM_URL) {
            if !stream_url.is_empty() {
                self.stream.url = stream_url;
            }
        }

        if let Ok(api_key) = env::var(ENV_API_KEY) {
            if !api_key.is_empty() {
                self.backend.api_key = Some(api_key);
            }
        }
    }

    /// Check URLs, API key and agent ids before any network use
    pub fn validate(&self) -> Result<()> {
        sanitize_base_url(&self.backend.base_url, "backend.base_url")?;
        sanitize_stream_url(&self.stream.url, "stream.url")?;
        if let Some(key) = &self.backend.api_key {
            validate_api_key(key)?;
        }
        for role in AgentRole::ALL {
            if self.agents.for_role(role).trim().is_empty() {
                anyhow::bail!("agent id for {} cannot be empty", role.label());
            }
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_invoke_path() -> String {
    "api/agent".to_string()
}

fn default_stream_url() -> String {
    "ws://localhost:3000/ws".to_string()
}

fn default_disconnect_grace_ms() -> u64 {
    2000
}

fn default_coordinator() -> String {
    AgentRole::ContentCoordinator.default_id().to_string()
}

fn default_post_writer() -> String {
    AgentRole::PostWriter.default_id().to_string()
}

fn default_image_creator() -> String {
    AgentRole::ImageCreator.default_id().to_string()
}
