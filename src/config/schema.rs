//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumented client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Client settings (concurrency, user agent, timeouts).
    pub client: HttpClientConfig,

    /// Transfer log settings.
    pub stats: StatsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Maximum transfers in flight at once; also reported in the log preamble.
    pub concurrent_transfers: usize,

    /// `User-Agent` sent on requests that lack one; also the log version.
    pub user_agent: String,

    /// Deadline for receiving response headers, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            concurrent_transfers: 8,
            user_agent: default_user_agent(),
            request_timeout_secs: 30,
        }
    }
}

/// Default `User-Agent`: `<crate name>/<crate version>`.
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Transfer log configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StatsConfig {
    /// File the transfer log is appended to. Logging is off when unset.
    pub log_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install a Prometheus recorder for transfer metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}
