use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Listener for send requests and session notices
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Media arrives inline as base64, so request bodies get large
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Sent as the `apikey` header on every gateway call
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
    /// Six-field cron expression for periodic roster re-sync (e.g. "0 */30 * * * *")
    #[serde(default)]
    pub resync_cron: Option<String>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:3100".to_string()
}

fn default_settle_delay() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            api_key: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay(),
            resync_cron: None,
        }
    }
}

impl SyncConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;

        // Endpoints are joined as "{base}/path"
        trim_trailing_slash(&mut config.backend.base_url);
        trim_trailing_slash(&mut config.session.gateway_url);

        if config.backend.base_url.is_empty() {
            anyhow::bail!("[backend] base_url must not be empty");
        }
        if config.session.gateway_url.is_empty() {
            anyhow::bail!("[session] gateway_url must not be empty");
        }

        Ok(config)
    }
}

fn trim_trailing_slash(url: &mut String) {
    if url.ends_with('/') {
        url.pop();
    }
}
