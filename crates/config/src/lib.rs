//! Configuration loading and validation for assetmill.
//!
//! Loads configuration from `assetmill.toml` in the working directory with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "assetmill.toml";

/// The root configuration structure.
///
/// Maps directly to `assetmill.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name, used as the title of the generated index page
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Directory generated bundles are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// URL prefix for the script, style, sprite and favicon bundles
    #[serde(default)]
    pub assets_url_prefix: String,

    /// Serve every bundle with caching disabled
    #[serde(default)]
    pub dev_mode: bool,

    /// Write bundles to `output_dir` whenever the watcher changes them
    #[serde(default = "default_true")]
    pub build_on_disk: bool,

    /// HTML document used as the index shell instead of the generated one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_template: Option<PathBuf>,

    /// Script emitted at the top of the script bundle, re-read on every rebuild
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_init_js: Option<PathBuf>,

    /// Source directories to seed from and watch
    #[serde(default = "default_sources")]
    pub sources: Vec<PathBuf>,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_app_name() -> String {
    "MyApp".into()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("web/public")
}
fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from("web/modules")]
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Delay between the two reads that must agree before content is accepted
    #[serde(default = "default_stability_interval_ms")]
    pub stability_interval_ms: u64,

    /// Reads attempted before a still-changing file is given up on
    #[serde(default = "default_stability_attempts")]
    pub stability_attempts: u32,
}

fn default_stability_interval_ms() -> u64 {
    100
}
fn default_stability_attempts() -> u32 {
    5
}

impl WatchConfig {
    pub fn stability_interval(&self) -> Duration {
        Duration::from_millis(self.stability_interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            stability_interval_ms: default_stability_interval_ms(),
            stability_attempts: default_stability_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `assetmill.toml` in the working directory.
    ///
    /// Environment variables override file values:
    /// - `ASSETMILL_OUTPUT_DIR`
    /// - `ASSETMILL_URL_PREFIX`
    /// - `ASSETMILL_PORT`
    /// - `ASSETMILL_DEV_MODE` (`1`/`true` to enable)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(Path::new(CONFIG_FILE))
    }

    /// Load configuration from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("ASSETMILL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Some(prefix) = lookup("ASSETMILL_URL_PREFIX") {
            self.assets_url_prefix = prefix;
        }

        if let Some(port) = lookup("ASSETMILL_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("ASSETMILL_PORT is not a valid port: {port}"))
            })?;
        }

        if let Some(dev) = lookup("ASSETMILL_DEV_MODE") {
            self.dev_mode = matches!(dev.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::ValidationError("app_name must not be empty".into()));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("output_dir must not be empty".into()));
        }

        if self.assets_url_prefix.contains(['?', '#', '\\']) {
            return Err(ConfigError::ValidationError(
                "assets_url_prefix must be a plain path".into(),
            ));
        }

        if self.watch.stability_attempts < 2 {
            return Err(ConfigError::ValidationError(
                "watch.stability_attempts must be at least 2".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be > 0".into()));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            output_dir: default_output_dir(),
            assets_url_prefix: String::new(),
            dev_mode: false,
            build_on_disk: true,
            html_template: None,
            runtime_init_js: None,
            sources: default_sources(),
            watch: WatchConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "MyApp");
        assert_eq!(config.output_dir, PathBuf::from("web/public"));
        assert_eq!(config.gateway.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.app_name, config.app_name);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.sources, config.sources);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/assetmill.toml")).unwrap();
        assert_eq!(config.app_name, "MyApp");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "app_name = \"Shop\"\nhtml_template = \"web/index.tmpl.html\"\n\n[watch]\nstability_interval_ms = 50\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.app_name, "Shop");
        assert_eq!(config.html_template, Some(PathBuf::from("web/index.tmpl.html")));
        assert_eq!(config.watch.stability_interval(), Duration::from_millis(50));
        assert_eq!(config.watch.stability_attempts, 5);
        assert!(config.build_on_disk);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "app_name = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let config = AppConfig {
            app_name: "  ".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.watch.stability_attempts = 1;
        assert!(config.validate().is_err());

        let config = AppConfig {
            assets_url_prefix: "/static?v=1".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("ASSETMILL_OUTPUT_DIR", "dist"),
            ("ASSETMILL_URL_PREFIX", "/static"),
            ("ASSETMILL_PORT", "9000"),
            ("ASSETMILL_DEV_MODE", "TRUE"),
        ]
        .into();

        let mut config = AppConfig::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.assets_url_prefix, "/static");
        assert_eq!(config.gateway.port, 9000);
        assert!(config.dev_mode);
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == "ASSETMILL_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("MyApp"));
        assert!(toml_str.contains("8080"));
        assert!(toml_str.contains("[watch]"));
    }
}
