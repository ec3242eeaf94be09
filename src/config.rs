//! Configuration management for the `NoFlame` dashboard
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::NoFlameError;
use crate::models::Coordinate;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `NoFlame` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoFlameConfig {
    /// Forecast lookup (National Weather Service)
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Fire-risk lookup
    #[serde(default)]
    pub fire_risk: FireRiskConfig,
    /// Reverse geocoding lookup
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// How the position is acquired
    #[serde(default)]
    pub location: LocationConfig,
    /// Map widget settings
    #[serde(default)]
    pub map: MapConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Base URL of the forecast API
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    /// User agent sent with every request (required by the NWS API)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Fire-risk API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireRiskConfig {
    /// Base URL of the fire-risk backend
    #[serde(default = "default_fire_risk_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Reverse geocoding configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of the Nominatim-compatible service
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// User agent sent with every request (required by Nominatim)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
}

/// Where the position comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// Coordinates given in this config or on the command line
    Fixed,
    /// Approximate position from the public IP address
    #[default]
    Ip,
    /// No geolocation capability
    None,
}

/// Location acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationMode,
    /// Latitude used in fixed mode
    pub latitude: Option<f64>,
    /// Longitude used in fixed mode
    pub longitude: Option<f64>,
    /// IP geolocation endpoint
    #[serde(default = "default_ip_base_url")]
    pub ip_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
}

/// Map widget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map provider API key
    pub api_key: Option<String>,
    /// Zoom level used when centering on the user
    #[serde(default = "default_map_zoom")]
    pub zoom: u8,
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

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_forecast_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_fire_risk_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_ip_base_url() -> String {
    "http://ip-api.com/json/".to_string()
}

fn default_user_agent() -> String {
    format!("NoFlame/{} (wildfire dashboard)", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u32 {
    30
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_map_zoom() -> u8 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for FireRiskConfig {
    fn default() -> Self {
        Self {
            base_url: default_fire_risk_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::default(),
            latitude: None,
            longitude: None,
            ip_base_url: default_ip_base_url(),
            timeout_seconds: default_geocoding_timeout(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            zoom: default_map_zoom(),
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl NoFlameConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. NOFLAME_MAP__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("NOFLAME")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: NoFlameConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("noflame").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_forecast_base_url();
        }
        if self.forecast.user_agent.is_empty() {
            self.forecast.user_agent = default_user_agent();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_timeout();
        }
        if self.fire_risk.base_url.is_empty() {
            self.fire_risk.base_url = default_fire_risk_base_url();
        }
        if self.fire_risk.timeout_seconds == 0 {
            self.fire_risk.timeout_seconds = default_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.location.ip_base_url.is_empty() {
            self.location.ip_base_url = default_ip_base_url();
        }
        if self.location.timeout_seconds == 0 {
            self.location.timeout_seconds = default_geocoding_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_location()?;
        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        let urls = [
            ("Forecast", &self.forecast.base_url),
            ("Fire-risk", &self.fire_risk.base_url),
            ("Geocoding", &self.geocoding.base_url),
            ("IP geolocation", &self.location.ip_base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(NoFlameError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            self.forecast.timeout_seconds,
            self.fire_risk.timeout_seconds,
            self.geocoding.timeout_seconds,
            self.location.timeout_seconds,
        ];
        if timeouts.iter().any(|t| *t > 300) {
            return Err(NoFlameError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.map.zoom > 21 {
            return Err(NoFlameError::config("Map zoom cannot exceed 21").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(NoFlameError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(NoFlameError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.map.api_key.as_ref().is_some_and(|key| key.trim().is_empty()) {
            return Err(NoFlameError::config(
                "Map API key cannot be empty if provided. Either remove it or provide a valid key.",
            )
            .into());
        }

        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        if let (Some(lat), Some(lon)) = (self.location.latitude, self.location.longitude) {
            Coordinate::new(lat, lon).with_context(|| "Invalid fixed location")?;
        } else if self.location.latitude.is_some() || self.location.longitude.is_some() {
            return Err(NoFlameError::config(
                "Fixed location needs both latitude and longitude",
            )
            .into());
        }
        Ok(())
    }
}
