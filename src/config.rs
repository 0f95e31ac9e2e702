//! Loader configuration, optionally read from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EngineError, LoaderResult};
use crate::segment::{DEFAULT_RANGE, RetryPolicy};

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Host of the server instance (typically segment 0).
    #[serde(default = "default_host")]
    pub host: String,
    /// Web service port of the server instance.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Operations buffered per segment before an automatic flush.
    #[serde(default = "default_range")]
    pub range: usize,
    /// Pause between flush attempts.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Stop retrying a flush after this long. Unset retries forever.
    #[serde(default)]
    pub flush_deadline_ms: Option<u64>,
    /// Timeout for a single HTTP request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Treat every `/convert_object` reply as success, whatever its status.
    #[serde(default)]
    pub lenient_object_status: bool,
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    3000
}
fn default_range() -> usize {
    DEFAULT_RANGE
}
fn default_retry_interval_ms() -> u64 {
    500
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            range: default_range(),
            retry_interval_ms: default_retry_interval_ms(),
            flush_deadline_ms: None,
            request_timeout_ms: default_request_timeout_ms(),
            lenient_object_status: false,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> LoaderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LoaderResult<()> {
        if self.range == 0 {
            return Err(EngineError::InvalidConfig {
                message: "range must be > 0".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(self.retry_interval_ms),
            deadline: self.flush_deadline_ms.map(Duration::from_millis),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
