//! Configuration management for `Sentinel`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SentinelError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `Sentinel` monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Upstream service endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Reading cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Entropy sampling settings
    #[serde(default)]
    pub entropy: EntropyConfig,
    /// Push notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Upstream service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Name-search geocoding endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Forecast endpoint providing surface pressure and wind
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Random byte endpoint
    #[serde(default = "default_entropy_url")]
    pub entropy_url: String,
    /// Push relay endpoint
    #[serde(default = "default_push_url")]
    pub push_url: String,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds for geocoding, forecast and push calls
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Request timeout in seconds for the entropy call
    #[serde(default = "default_entropy_timeout")]
    pub entropy_timeout_seconds: u32,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Reading cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached reading in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

/// Geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Number of candidates requested per lookup
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u32,
}

/// Entropy sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyConfig {
    /// Number of random bytes requested per sample
    #[serde(default = "default_sample_length")]
    pub sample_length: u32,
}

/// Push notification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Push relay access token
    #[serde(default)]
    pub token: Option<String>,
    /// Send a notification automatically whenever the tier is HIGH ALERT
    #[serde(default)]
    pub on_high_alert: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Location monitored when none is given on the command line
    #[serde(default = "default_location")]
    pub location: String,
    /// Seconds between refresh cycles in watch mode
    #[serde(default = "default_watch_interval")]
    pub watch_interval_seconds: u64,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_entropy_url() -> String {
    "https://qrng.anu.edu.au/API/jsonI.php".to_string()
}

fn default_push_url() -> String {
    "https://api.pushbullet.com/v2/pushes".to_string()
}

fn default_http_timeout() -> u32 {
    30
}

fn default_entropy_timeout() -> u32 {
    5
}

fn default_user_agent() -> String {
    format!("Sentinel/{}", crate::VERSION)
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_candidate_count() -> u32 {
    10
}

fn default_sample_length() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_location() -> String {
    "Galena, KS".to_string()
}

fn default_watch_interval() -> u64 {
    30
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            entropy_url: default_entropy_url(),
            push_url: default_push_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            entropy_timeout_seconds: default_entropy_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            candidate_count: default_candidate_count(),
        }
    }
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            sample_length: default_sample_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            watch_interval_seconds: default_watch_interval(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn entropy_timeout(&self) -> Duration {
        Duration::from_secs(self.entropy_timeout_seconds.into())
    }
}

impl SentinelConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // An explicit path must exist; the default location is optional
        match config_path {
            Some(config_file) => {
                builder = builder.add_source(
                    File::from(config_file)
                        .required(true)
                        .format(config::FileFormat::Toml),
                );
            }
            None => {
                let config_file = Self::get_config_path()
                    .unwrap_or_else(|| PathBuf::from("sentinel.toml"));
                if config_file.exists() {
                    builder = builder.add_source(
                        File::from(config_file)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // Environment overrides, e.g. SENTINEL_NOTIFY__TOKEN
        builder = builder.add_source(
            Environment::with_prefix("SENTINEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SentinelConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sentinel").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.endpoints.geocoding_url.is_empty() {
            self.endpoints.geocoding_url = default_geocoding_url();
        }
        if self.endpoints.forecast_url.is_empty() {
            self.endpoints.forecast_url = default_forecast_url();
        }
        if self.endpoints.entropy_url.is_empty() {
            self.endpoints.entropy_url = default_entropy_url();
        }
        if self.endpoints.push_url.is_empty() {
            self.endpoints.push_url = default_push_url();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.entropy_timeout_seconds == 0 {
            self.http.entropy_timeout_seconds = default_entropy_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.location.trim().is_empty() {
            self.defaults.location = default_location();
        }
        if self.defaults.watch_interval_seconds == 0 {
            self.defaults.watch_interval_seconds = default_watch_interval();
        }
        // A blank token means "not configured"
        if self
            .notify
            .token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            self.notify.token = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_endpoints()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_endpoints(&self) -> Result<()> {
        let endpoints = [
            ("geocoding", &self.endpoints.geocoding_url),
            ("forecast", &self.endpoints.forecast_url),
            ("entropy", &self.endpoints.entropy_url),
            ("push", &self.endpoints.push_url),
        ];

        for (name, url) in endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SentinelError::config(format!(
                    "The {name} endpoint must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(SentinelError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.entropy_timeout_seconds > 300 {
            return Err(SentinelError::config("Entropy timeout cannot exceed 300 seconds").into());
        }

        if self.cache.ttl_seconds > 3600 {
            return Err(SentinelError::config("Cache TTL cannot exceed 3600 seconds").into());
        }

        if !(1..=100).contains(&self.geocoding.candidate_count) {
            return Err(
                SentinelError::config("Geocoding candidate count must be between 1 and 100").into(),
            );
        }

        if !(2..=1024).contains(&self.entropy.sample_length) {
            return Err(
                SentinelError::config("Entropy sample length must be between 2 and 1024").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SentinelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SentinelError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SentinelConfig::default();
        assert_eq!(
            config.endpoints.forecast_url,
            "https://api.open-meteo.com/v1/forecast"
        );
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.http.entropy_timeout_seconds, 5);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.entropy.sample_length, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.location, "Galena, KS");
        assert!(config.notify.token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SentinelConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SentinelConfig::default();
        config.http.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = SentinelConfig::default();
        config.entropy.sample_length = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_non_http_endpoint() {
        let mut config = SentinelConfig::default();
        config.endpoints.push_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("push endpoint"));
    }

    #[test]
    fn test_apply_defaults_clears_blank_token() {
        let mut config = SentinelConfig::default();
        config.notify.token = Some("   ".to_string());
        config.http.timeout_seconds = 0;
        config.apply_defaults();
        assert!(config.notify.token.is_none());
        assert_eq!(config.http.timeout_seconds, 30);
    }

    #[test]
    fn test_load_partial_toml_file() {
        let dir = std::env::temp_dir().join(format!("sentinel-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[cache]\nttl_seconds = 15\n\n[defaults]\nlocation = \"Paris, TX\"").unwrap();

        let config = SentinelConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.cache.ttl_seconds, 15);
        assert_eq!(config.defaults.location, "Paris, TX");
        assert_eq!(config.geocoding.candidate_count, 10);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("sentinel-missing-{}", std::process::id()))
            .join("config.toml");

        let result = SentinelConfig::load_from_path(Some(path));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = SentinelConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("sentinel"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
