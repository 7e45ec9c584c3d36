//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capabilities::CapabilityValue;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Site root and reload behaviour.
    pub site: SiteConfig,

    /// Builds, most capable first. The first one a client can run wins.
    pub builds: Vec<BuildConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time to produce a response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty (development) or JSON (production) log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Where files are served from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding every build's output.
    pub root: PathBuf,

    /// Reload builds when the config file changes.
    pub watch: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            watch: false,
        }
    }
}

/// One application build.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BuildConfig {
    /// Label for logs and metrics. Defaults to `build-<index>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Absolute path (within the site root) served for app routes.
    pub entrypoint: String,

    /// Capabilities the client must have, all of them.
    #[serde(default)]
    pub requires: Vec<String>,

    /// Capabilities that must have exactly these values.
    #[serde(default)]
    pub requires_values: BTreeMap<String, CapabilityValue>,

    /// Push manifest path, relative to the site root.
    #[serde(default)]
    pub push_manifest: Option<String>,
}

impl BuildConfig {
    /// A build without requirements, serving `entrypoint` to everyone.
    pub fn fallback(entrypoint: impl Into<String>) -> Self {
        Self {
            name: None,
            entrypoint: entrypoint.into(),
            requires: Vec::new(),
            requires_values: BTreeMap::new(),
            push_manifest: None,
        }
    }

    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("build-{}", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [observability]
            log_format = "json"

            [site]
            root = "build"
            watch = true

            [[builds]]
            name = "modern"
            entrypoint = "/modern/index.html"
            requires = ["es2015", "modules"]
            push_manifest = "modern/push-manifest.json"

            [[builds]]
            entrypoint = "/legacy/index.html"
            requires_values = { browser = "ie" }
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.site.root, PathBuf::from("build"));
        assert!(config.site.watch);
        assert_eq!(config.builds.len(), 2);
        assert_eq!(config.builds[0].requires, vec!["es2015", "modules"]);
        assert_eq!(config.builds[1].display_name(1), "build-1");
        assert_eq!(
            config.builds[1].requires_values.get("browser"),
            Some(&CapabilityValue::Text("ie".into()))
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.builds.is_empty());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(toml::from_str::<ServerConfig>("[observability]\nlog_format = \"xml\"").is_err());
    }
}
