//! Client Configuration
//!
//! Connection, addressing and polling settings for one management server.
//! Several configurations may coexist in one process; nothing here is global.

use crate::error::{Error, Result};
use crate::job::PollSettings;
use crate::uri::UriBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API version used when a call does not name one
pub const DEFAULT_API_VERSION: &str = "90";

/// Path of the REST service below the server root
pub const DEFAULT_BASE_PATH: &str = "/univmax/restapi";

/// Categories whose paths never carry a version segment
pub const DEFAULT_VERSION_EXEMPT: [&str; 2] = ["performance", "common"];

/// Configuration for an array client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Management server address
    pub server_ip: String,
    /// Management server port
    pub port: u16,
    /// REST service path below the server root
    pub base_path: String,
    /// Username
    pub username: String,
    /// Password (should use secrets in production)
    pub password: String,
    /// Verify the server TLS certificate
    pub verify_tls: bool,
    /// Optional PEM bundle to trust in addition to system roots
    pub ca_cert: Option<PathBuf>,
    /// Default array serial number
    pub array_id: Option<String>,
    /// Default API version segment
    pub api_version: String,
    /// Categories addressed without a version segment
    pub version_exempt_categories: Vec<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Interval between job polls in seconds
    pub poll_interval_secs: u64,
    /// Maximum time to wait for a job in seconds
    pub max_wait_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: "127.0.0.1".to_string(),
            port: 8443,
            base_path: DEFAULT_BASE_PATH.to_string(),
            username: "smc".to_string(),
            password: String::new(),
            verify_tls: true,
            ca_cert: None,
            array_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            version_exempt_categories: DEFAULT_VERSION_EXEMPT
                .iter()
                .map(|c| c.to_string())
                .collect(),
            request_timeout_secs: 120,
            poll_interval_secs: 3,
            max_wait_secs: 600,
        }
    }
}

impl ClientConfig {
    /// Load a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.server_ip.trim().is_empty() {
            return Err(Error::Configuration("server_ip must not be empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Configuration("port must be non-zero".into()));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(Error::Configuration(format!(
                "base_path must start with '/': {}",
                self.base_path
            )));
        }
        if self.api_version.trim().is_empty() || self.api_version.contains('/') {
            return Err(Error::Configuration(format!(
                "invalid api_version: {:?}",
                self.api_version
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be non-zero".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Configuration(
                "poll_interval_secs must be non-zero".into(),
            ));
        }
        if let Some(array) = &self.array_id {
            if array.trim().is_empty() {
                return Err(Error::Configuration("array_id must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Full URL of the REST service root
    pub fn base_url(&self) -> String {
        format!(
            "https://{}:{}{}",
            self.server_ip,
            self.port,
            self.base_path.trim_end_matches('/')
        )
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Job polling cadence and bound
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
        }
    }

    /// URI builder carrying this configuration's version policy
    pub fn uri_builder(&self) -> UriBuilder {
        UriBuilder::new(self.api_version.clone())
            .with_version_exempt(self.version_exempt_categories.iter().cloned())
    }
}
