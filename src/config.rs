//! Client configuration
//!
//! `ClientConfig` holds everything needed to talk to the API: endpoint URLs,
//! the connect/read timeout pair, the retry budget, the parts that make up
//! the app-id string, and transport switches. It can be built in code or
//! loaded from YAML.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Raw query API endpoint (POST)
pub const API_URL: &str = "https://api.recordedfuture.com/query/";

/// Connect API endpoint (GET)
pub const CONNECT_API_URL: &str = "https://api.recordedfuture.com/v2/";

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of retries for gateway errors and read timeouts
pub const DEFAULT_RETRIES: u32 = 3;

/// Library identification, always the last part of the app-id
pub fn library_id() -> String {
    format!("rfapi-rust/{}", crate::VERSION)
}

/// Configuration for an API client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Raw query API URL
    pub api_url: String,
    /// Connect API URL
    pub connect_url: String,
    /// Connection timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Read timeout
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,
    /// Retry budget for 502/503 and read timeouts
    pub max_retries: u32,
    /// Calling application name
    pub app_name: Option<String>,
    /// Calling application version (only used together with `app_name`)
    pub app_version: Option<String>,
    /// Package name
    pub pkg_name: Option<String>,
    /// Package version (only used together with `pkg_name`)
    pub pkg_version: Option<String>,
    /// Id of the platform running the client (ex "Splunk_1.2.3")
    pub platform_id: Option<String>,
    /// Whether gzip-compressed transfers are accepted
    pub accept_gzip: bool,
    /// Proxy URL applied to all requests
    pub proxy: Option<String>,
    /// Verify TLS certificates
    pub verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            connect_url: CONNECT_API_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_retries: DEFAULT_RETRIES,
            app_name: None,
            app_version: None,
            pkg_name: None,
            pkg_version: None,
            platform_id: None,
            accept_gzip: true,
            proxy: None,
            verify: true,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Compose the app-id string sent as `User-Agent` and `app_id` parameter
    pub fn app_id(&self) -> String {
        let os = os_description();
        let mut parts = Vec::new();

        match (&self.app_name, &self.app_version) {
            (Some(name), Some(version)) => parts.push(format!("{name}/{version} ({os})")),
            (Some(name), None) => parts.push(format!("{name} ({os})")),
            _ => {}
        }

        match (&self.pkg_name, &self.pkg_version) {
            (Some(name), Some(version)) => parts.push(format!("{name}/{version}")),
            (Some(name), None) => parts.push(name.clone()),
            _ => {}
        }

        match &self.platform_id {
            Some(platform) => parts.push(format!("{} ({platform})", library_id())),
            None => parts.push(library_id()),
        }

        parts.join(" ")
    }

    /// Check the config for values the transport cannot work with
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)?;
        url::Url::parse(&self.connect_url)?;
        if self.read_timeout.is_zero() {
            return Err(Error::config("read_timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the raw API URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the connect API URL
    pub fn connect_url(mut self, url: impl Into<String>) -> Self {
        self.config.connect_url = url.into();
        self
    }

    /// Set the connect and read timeouts
    pub fn timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.config.connect_timeout = connect;
        self.config.read_timeout = read;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set calling application name and optional version
    pub fn app(mut self, name: impl Into<String>, version: Option<&str>) -> Self {
        self.config.app_name = Some(name.into());
        self.config.app_version = version.map(String::from);
        self
    }

    /// Set package name and optional version
    pub fn package(mut self, name: impl Into<String>, version: Option<&str>) -> Self {
        self.config.pkg_name = Some(name.into());
        self.config.pkg_version = version.map(String::from);
        self
    }

    /// Set platform id
    pub fn platform_id(mut self, platform: impl Into<String>) -> Self {
        self.config.platform_id = Some(platform.into());
        self
    }

    /// Accept or refuse gzip transfers
    pub fn accept_gzip(mut self, accept: bool) -> Self {
        self.config.accept_gzip = accept;
        self
    }

    /// Route all requests through a proxy
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    /// Toggle TLS certificate verification
    pub fn verify(mut self, verify: bool) -> Self {
        self.config.verify = verify;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

fn os_description() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Durations are written as (possibly fractional) seconds in YAML
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
