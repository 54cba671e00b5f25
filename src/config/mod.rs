//
//  jira-bridge
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! This module loads the connection and cache settings the core consumes. The
//! configuration lives in a TOML file in the platform-specific config
//! directory; the API token lives separately in the owner-only secrets file
//! (see [`crate::auth::SecretFile`]) or in the `JIRA_API_TOKEN` environment
//! variable.
//!
//! ## Configuration File Location
//!
//! - **Linux**: `~/.config/jira-bridge/config.toml`
//! - **macOS**: `~/Library/Application Support/jira-bridge/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\jira-bridge\config\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! base_url = "https://acme.atlassian.net"
//! identity = "me@example.com"
//! auth_mode = "basic"
//! request_timeout_secs = 10
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//! max_size = 100
//! snapshot_interval_secs = 60
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `JIRA_BASE_URL` | `base_url` |
//! | `JIRA_IDENTITY` | `identity` |
//! | `JIRA_AUTH_MODE` | `auth_mode` |
//! | `JIRA_API_TOKEN` | the secret (never written to disk by this module) |
//!
//! ## Submodules
//!
//! - [`file`]: Low-level configuration file I/O operations
//! - [`hosts`]: Cloud host detection and host normalization

mod file;
mod hosts;

pub use file::*;
pub use hosts::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthMode, ConnectionSettings, SecretFile, ServerFlavor};
use crate::cache::CacheSettings;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default cache time-to-live.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default maximum number of entries per cache namespace.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 100;

/// Default interval between cache snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 60;

/// Configuration consumed by the core.
///
/// # Fields
///
/// * `base_url` - Jira base URL
/// * `identity` - Email (Cloud) or username (Server) for basic auth
/// * `auth_mode` - `basic` or `bearer`
/// * `server_flavor` - Optional explicit `cloud`/`self-hosted`; detected when absent
/// * `request_timeout_secs` - Per-request timeout
/// * `cache` - Cache settings
///
/// # Examples
///
/// ```rust
/// use jira_bridge::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     base_url = "https://acme.atlassian.net"
///     identity = "me@example.com"
/// "#)?;
///
/// assert_eq!(config.request_timeout_secs, 10);
/// assert!(config.cache.enabled);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub identity: Option<String>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default)]
    pub server_flavor: Option<ServerFlavor>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Secret picked up from the environment; never serialized.
    #[serde(skip)]
    pub secret: Option<String>,
}

/// Cache section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When `false`, every lookup misses and nothing is stored.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sliding time-to-live of an entry, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Maximum entries per namespace before a prune pass.
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Seconds between periodic snapshots; `0` disables the timer.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,

    /// Snapshot directory; defaults to the platform cache directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_cache_max_size() -> usize {
    DEFAULT_CACHE_MAX_SIZE
}

fn default_snapshot_interval() -> u64 {
    DEFAULT_SNAPSHOT_INTERVAL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_size: DEFAULT_CACHE_MAX_SIZE,
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
            directory: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            identity: None,
            auth_mode: AuthMode::default(),
            server_flavor: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache: CacheConfig::default(),
            secret: None,
        }
    }
}

impl Config {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .ok_or_else(|| anyhow!("Could not determine the home directory"))
    }

    /// Platform configuration directory for this library.
    pub fn config_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Platform cache directory, used for snapshots unless overridden.
    pub fn default_cache_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().to_path_buf())
    }

    /// Path to the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads the configuration from the default location, applies
    /// environment overrides, and resolves the secret.
    ///
    /// A missing file is not an error: defaults plus environment variables
    /// are used instead.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed, or if the
    /// secrets file is present but has unsafe permissions.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if config_exists(&path) {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;

        if config.secret.is_none() && !config.base_url.is_empty() {
            config.secret = SecretFile::new(SecretFile::default_path()?).get(&config.base_url)?;
        }
        Ok(config)
    }

    /// Parses a configuration file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = read_config_file(path)?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Writes the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        write_config_file(path, &content)
    }

    /// Applies environment overrides using the given lookup.
    ///
    /// The lookup is injected so overrides can be tested without touching
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("JIRA_BASE_URL") {
            self.base_url = url;
        }
        if let Some(identity) = lookup("JIRA_IDENTITY") {
            self.identity = Some(identity);
        }
        if let Some(mode) = lookup("JIRA_AUTH_MODE") {
            self.auth_mode = mode.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(token) = lookup("JIRA_API_TOKEN") {
            self.secret = Some(token);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Settings the credential context is built from.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            base_url: self.base_url.clone(),
            identity: self.identity.clone(),
            secret: self.secret.clone(),
            auth_mode: self.auth_mode,
            server_flavor: self.server_flavor,
        }
    }

    /// Settings the cache service is built from.
    ///
    /// Falls back to no snapshot directory when the platform cache directory
    /// cannot be determined.
    pub fn cache_settings(&self) -> CacheSettings {
        let directory = self
            .cache
            .directory
            .clone()
            .or_else(|| Self::default_cache_dir().ok());

        CacheSettings {
            enabled: self.cache.enabled,
            ttl: cache_ttl(self.cache.ttl_secs),
            max_size: self.cache.max_size.max(1),
            snapshot_interval: (self.cache.snapshot_interval_secs > 0)
                .then(|| Duration::from_secs(self.cache.snapshot_interval_secs)),
            directory,
        }
    }
}

/// Converts the configured TTL, clamped to at least one second and at most
/// the largest representable delta.
fn cache_ttl(secs: u64) -> chrono::TimeDelta {
    i64::try_from(secs.max(1))
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .unwrap_or(chrono::TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("base_url = \"https://jira.acme.io\"").unwrap();
        assert_eq!(config.auth_mode, AuthMode::Basic);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.cache.max_size, DEFAULT_CACHE_MAX_SIZE);
        assert!(config.secret.is_none());
    }

    #[test]
    fn test_full_file() {
        let config: Config = toml::from_str(
            r#"
            base_url = "https://jira.acme.io"
            auth_mode = "bearer"
            server_flavor = "self-hosted"
            request_timeout_secs = 3

            [cache]
            enabled = false
            ttl_secs = 30
            max_size = 10
            snapshot_interval_secs = 0
            directory = "/tmp/jb"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth_mode, AuthMode::Bearer);
        assert_eq!(config.server_flavor, Some(ServerFlavor::SelfHosted));

        let cache = config.cache_settings();
        assert!(!cache.enabled);
        assert_eq!(cache.ttl, chrono::Duration::seconds(30));
        assert_eq!(cache.max_size, 10);
        assert!(cache.snapshot_interval.is_none());
        assert_eq!(cache.directory, Some(PathBuf::from("/tmp/jb")));
    }

    #[test]
    fn test_cache_ttl_is_clamped() {
        let mut config = Config::default();

        config.cache.ttl_secs = 0;
        assert_eq!(config.cache_settings().ttl, chrono::TimeDelta::seconds(1));

        config.cache.ttl_secs = u64::MAX;
        assert_eq!(config.cache_settings().ttl, chrono::TimeDelta::MAX);
    }

    #[test]
    fn test_huge_ttl_from_file_caches_without_overflow() {
        let config: Config = toml::from_str(
            r#"
            base_url = "https://jira.acme.io"

            [cache]
            ttl_secs = 1000000000000000
            "#,
        )
        .unwrap();

        let settings = CacheSettings {
            directory: None,
            ..config.cache_settings()
        };
        assert!(settings.ttl > chrono::TimeDelta::zero());

        let cache = crate::cache::CacheService::new(settings);
        cache.set(crate::cache::ResourceKind::Issues, "ABC-1", serde_json::json!(1));
        assert_eq!(
            cache.get(crate::cache::ResourceKind::Issues, "ABC-1"),
            Some(serde_json::json!(1))
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("JIRA_BASE_URL", "https://acme.atlassian.net"),
            ("JIRA_AUTH_MODE", "bearer"),
            ("JIRA_API_TOKEN", "tok"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        let settings = config.connection_settings();
        assert_eq!(settings.base_url, "https://acme.atlassian.net");
        assert_eq!(settings.auth_mode, AuthMode::Bearer);
        assert_eq!(settings.secret.as_deref(), Some("tok"));
    }

    #[test]
    fn test_invalid_auth_mode_env_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "JIRA_AUTH_MODE").then(|| "kerberos".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_is_never_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            base_url: "https://jira.acme.io".to_string(),
            secret: Some("tok".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let written = read_config_file(&path).unwrap();
        assert!(!written.contains("tok"));
        assert_eq!(Config::load_from(&path).unwrap().base_url, "https://jira.acme.io");
    }
}
