//! Location Provider
//!
//! Wraps the host's one-shot geolocation capability. The provider is consumed
//! by [`LocationProvider::acquire_location`], so a session can only ask for
//! its position once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{LocationConfig, LocationMode};
use crate::models::Coordinate;

/// Why the position could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
}

/// A platform capability that can produce the current position once
#[async_trait]
pub trait GeolocationCapability: Send + Sync {
    async fn request_position(&self) -> Result<Coordinate, LocationError>;
}

/// A position supplied by the host (CLI flags, config, or a browser that
/// already ran its own geolocation prompt).
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl GeolocationCapability for FixedPosition {
    async fn request_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// The host reported that the user refused the location prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedPosition;

#[async_trait]
impl GeolocationCapability for DeniedPosition {
    async fn request_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

const IP_API_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address (ip-api.com format)
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: Client,
    base_url: String,
}

impl IpGeolocation {
    pub fn new(timeout: Duration) -> Result<Self, LocationError> {
        Self::new_with_base_url(IP_API_URL, timeout)
    }

    pub fn new_with_base_url(base_url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl GeolocationCapability for IpGeolocation {
    #[instrument(name = "ip_geolocation", skip(self), fields(url = %self.base_url))]
    async fn request_position(&self) -> Result<Coordinate, LocationError> {
        let url = format!("{}?fields=status,message,lat,lon", self.base_url);
        let unavailable = |e: reqwest::Error| LocationError::PositionUnavailable(e.to_string());

        let response = self.client.get(&url).send().await.map_err(unavailable)?;
        if !response.status().is_success() {
            return Err(LocationError::PositionUnavailable(format!(
                "geolocation service returned {}",
                response.status()
            )));
        }
        let body: IpApiResponse = response.json().await.map_err(unavailable)?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| body.status.clone());
            warn!("IP geolocation refused: {}", reason);
            return Err(LocationError::PositionUnavailable(reason));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
                .map_err(|e| LocationError::PositionUnavailable(e.to_string())),
            _ => Err(LocationError::PositionUnavailable(
                "geolocation response carried no coordinates".to_string(),
            )),
        }
    }
}

/// Single-use wrapper around an optional geolocation capability
pub struct LocationProvider {
    capability: Option<Box<dyn GeolocationCapability>>,
}

impl LocationProvider {
    #[must_use]
    pub fn new(capability: Option<Box<dyn GeolocationCapability>>) -> Self {
        Self { capability }
    }

    /// Provider with no capability at all; acquisition always fails
    #[must_use]
    pub fn unsupported() -> Self {
        Self { capability: None }
    }

    #[must_use]
    pub fn fixed(coordinate: Coordinate) -> Self {
        Self::new(Some(Box::new(FixedPosition(coordinate))))
    }

    /// Build the provider described by the `[location]` config section
    pub fn from_config(config: &LocationConfig) -> crate::Result<Self> {
        let capability: Option<Box<dyn GeolocationCapability>> = match config.mode {
            LocationMode::Fixed => match (config.latitude, config.longitude) {
                (Some(lat), Some(lon)) => Some(Box::new(FixedPosition(Coordinate::new(lat, lon)?))),
                _ => None,
            },
            LocationMode::Ip => Some(Box::new(IpGeolocation::new_with_base_url(
                &config.ip_base_url,
                Duration::from_secs(config.timeout_seconds.into()),
            )?)),
            LocationMode::None => None,
        };
        Ok(Self::new(capability))
    }

    /// Request the position once
    pub async fn acquire_location(self) -> Result<Coordinate, LocationError> {
        let Some(capability) = self.capability else {
            warn!("Geolocation is not supported in this environment");
            return Err(LocationError::PositionUnavailable(
                "geolocation is not supported in this environment".to_string(),
            ));
        };

        debug!("Requesting current position");
        match capability.request_position().await {
            Ok(coordinate) => {
                info!("Acquired position {}", coordinate.format_coordinates());
                Ok(coordinate)
            }
            Err(e) => {
                warn!("Error fetching location: {}", e);
                Err(e)
            }
        }
    }
}
