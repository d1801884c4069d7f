use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_AUTH_RPM, DEFAULT_REFRESH_TTL_DAYS,
};

/// Check whether a host string binds all interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub access_ttl_minutes: Option<u64>,
    pub refresh_ttl_days: Option<u64>,
}

/// Rate limit configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RateLimitFileConfig {
    pub enabled: Option<bool>,
    pub auth_rpm: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub rate_limit: Option<RateLimitFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
}

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth_rpm: u32,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match overlay_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                tracing::debug!(path = %path.display(), "Config file loaded");
                config
            }
            None => FileConfig::default(),
        };

        let config = Self::merge(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            access_ttl_minutes = config.auth.access_ttl_minutes,
            refresh_ttl_days = config.auth.refresh_ttl_days,
            rate_limit_enabled = config.rate_limit.enabled,
            rate_limit_auth_rpm = config.rate_limit.auth_rpm,
            debug = config.debug,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn merge(cli: &CliConfig, file: FileConfig) -> Self {
        let file_server = file.server.unwrap_or_default();
        let file_auth = file.auth.unwrap_or_default();
        let file_rate_limit = file.rate_limit.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let access_ttl_minutes = cli
            .access_ttl_minutes
            .or(file_auth.access_ttl_minutes)
            .unwrap_or(DEFAULT_ACCESS_TTL_MINUTES);
        let refresh_ttl_days = cli
            .refresh_ttl_days
            .or(file_auth.refresh_ttl_days)
            .unwrap_or(DEFAULT_REFRESH_TTL_DAYS);

        let rate_limit_enabled = cli
            .rate_limit_enabled
            .or(file_rate_limit.enabled)
            .unwrap_or(true);
        let rate_limit_auth_rpm = cli
            .rate_limit_auth_rpm
            .or(file_rate_limit.auth_rpm)
            .unwrap_or(DEFAULT_RATE_LIMIT_AUTH_RPM);

        let debug = cli.debug || file.debug.unwrap_or(false);

        Self {
            server: ServerConfig { host, port },
            auth: AuthConfig {
                access_ttl_minutes,
                refresh_ttl_days,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                auth_rpm: rate_limit_auth_rpm,
            },
            debug,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.auth.access_ttl_minutes == 0 {
            anyhow::bail!("Configuration error: auth.access_ttl_minutes must be greater than 0");
        }
        if self.auth.refresh_ttl_days == 0 {
            anyhow::bail!("Configuration error: auth.refresh_ttl_days must be greater than 0");
        }
        if self.rate_limit.enabled && self.rate_limit.auth_rpm == 0 {
            anyhow::bail!("Configuration error: rate_limit.auth_rpm must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_sources() {
        let config = AppConfig::merge(&CliConfig::default(), FileConfig::default());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.auth.access_ttl_minutes, DEFAULT_ACCESS_TTL_MINUTES);
        assert_eq!(config.auth.refresh_ttl_days, DEFAULT_REFRESH_TTL_DAYS);
        assert!(config.rate_limit.enabled);
        assert!(!config.debug);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{"server": {"host": "10.0.0.1", "port": 8000}, "auth": {"access_ttl_minutes": 5}}"#,
        )
        .unwrap();
        let cli = CliConfig {
            port: Some(9000),
            ..Default::default()
        };

        let config = AppConfig::merge(&cli, file);
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.access_ttl_minutes, 5);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::merge(&CliConfig::default(), FileConfig::default());
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = AppConfig::merge(&CliConfig::default(), FileConfig::default());
        config.auth.access_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_via_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyline.json");
        std::fs::write(&path, r#"{"server": {"port": 7777}, "debug": true}"#).unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 7777);
        assert!(config.debug);
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
