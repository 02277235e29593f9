//! Configuration for the removal client and session front end
//!
//! Values are layered: built-in defaults, an optional JSON file, environment
//! variables, and finally explicit overrides (CLI flags or builder calls).

use crate::error::{RemovalError, Result};
use crate::intake::DEFAULT_MAX_UPLOAD_BYTES;
use crate::session::Theme;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default remote endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Header carrying the API credential
pub const DEFAULT_API_KEY_HEADER: &str = "X-Api-Key";

/// Environment variable holding the API credential
pub const ENV_API_KEY: &str = "REMOVE_BG_API_KEY";

/// Environment variable overriding the endpoint
pub const ENV_ENDPOINT: &str = "REMOVE_BG_ENDPOINT";

/// Host that requires a client-side credential; any other host is treated as a proxy
const REMOVE_BG_HOST: &str = "api.remove.bg";

/// Settings for the cosmetic liveness ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Milliseconds between ticks
    pub interval_ms: u64,
    /// Percentage points added per tick
    pub step: u8,
    /// Highest value the ticker may reach; only completion sets 100
    pub cap: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            step: 10,
            cap: 90,
        }
    }
}

impl ProgressConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuration for remote background removal sessions
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    /// Remote endpoint (the service itself or a proxy that holds the key)
    pub endpoint: String,

    /// API credential; optional when the endpoint is a proxy
    pub api_key: Option<String>,

    /// Header the credential is sent in
    pub api_key_header: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Largest file the intake filter admits
    pub max_upload_bytes: u64,

    /// Cosmetic progress ticker
    pub progress: ProgressConfig,

    /// Initial presentation theme
    pub theme: Theme,

    /// Directory downloads are written to (None = current directory)
    pub output_dir: Option<PathBuf>,
}

// The credential must never end up in logs.
impl std::fmt::Debug for RemovalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_header", &self.api_key_header)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("progress", &self.progress)
            .field("theme", &self.theme)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout_secs: 60,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            progress: ProgressConfig::default(),
            theme: Theme::default(),
            output_dir: None,
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgremove_remote::RemovalConfig;
    ///
    /// let config = RemovalConfig::builder()
    ///     .api_key("my-key")
    ///     .timeout_secs(30)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.timeout_secs, 30);
    /// ```
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }

    /// Default location of the config file, if the platform has a config dir
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bgremove-remote").join("config.json"))
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RemovalError::file_io_error("read config file", path, &e))?;
        serde_json::from_str(&content).map_err(|e| {
            RemovalError::invalid_config(format!("{}: {}", path.display(), e))
        })
    }

    /// Load defaults, then the file (explicit path, or the default path if it exists)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(default) if default.exists() => {
                    log::debug!("Loading config from {}", default.display());
                    Self::from_file(default)
                },
                _ => Ok(Self::default()),
            },
        }
    }

    /// Apply environment overrides from a lookup function
    #[must_use]
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed endpoint URL
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            RemovalError::invalid_config(format!("endpoint '{}': {}", self.endpoint, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RemovalError::invalid_config(format!(
                "endpoint scheme must be http or https, got '{}'",
                other
            ))),
        }
    }

    /// Whether requests go to a proxy rather than the service itself
    #[must_use]
    pub fn uses_proxy(&self) -> bool {
        self.endpoint_url()
            .ok()
            .and_then(|url| url.host_str().map(|h| h != REMOVE_BG_HOST))
            .unwrap_or(false)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.api_key.is_none() && !self.uses_proxy() {
            return Err(RemovalError::invalid_config(format!(
                "no API key configured for {}; set {} or `api_key` in the config file",
                REMOVE_BG_HOST, ENV_API_KEY
            )));
        }
        if self.api_key_header.trim().is_empty() {
            return Err(RemovalError::invalid_config("API key header must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(RemovalError::invalid_config("timeout must be at least 1 second"));
        }
        if self.max_upload_bytes == 0 {
            return Err(RemovalError::invalid_config("max upload size must be positive"));
        }
        if self.progress.interval_ms == 0 || self.progress.step == 0 {
            return Err(RemovalError::invalid_config(
                "progress interval and step must be positive",
            ));
        }
        if self.progress.cap >= 100 {
            return Err(RemovalError::invalid_config(format!(
                "progress cap must stay below 100 (got {})",
                self.progress.cap
            )));
        }
        Ok(())
    }
}

/// Builder for `RemovalConfig` with fluent API
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    /// Start from an already loaded configuration
    #[must_use]
    pub fn from_config(config: RemovalConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn api_key_header<S: Into<String>>(mut self, header: S) -> Self {
        self.config.api_key_header = header.into();
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: ProgressConfig) -> Self {
        self.config.progress = progress;
        self
    }

    #[must_use]
    pub fn theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RemovalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
