//! External environmental lookups
//!
//! The dashboard depends on three independent data sources, each keyed only
//! by the captured [`Coordinate`]: the current forecast, the wildfire-risk
//! score and the reverse-geocoded place name. They sit behind the
//! [`EnvironmentalLookups`] trait so the aggregator can be driven by the real
//! HTTP clients or by a test double.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::NoFlameError;
use crate::config::NoFlameConfig;
use crate::models::{Coordinate, RiskScore, WeatherReading};

pub mod fire_risk;
pub mod forecast;
pub mod geocode;

pub use fire_risk::FireRiskClient;
pub use forecast::ForecastClient;
pub use geocode::GeocodeClient;

/// Which of the three lookups a result or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Forecast,
    FireRisk,
    PlaceName,
}

impl LookupKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::Forecast => "forecast",
            LookupKind::FireRisk => "fire-risk",
            LookupKind::PlaceName => "place-name",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{lookup} lookup failed: {message}")]
pub struct LookupError {
    pub lookup: LookupKind,
    pub message: String,
}

impl LookupError {
    pub fn new<S: Into<String>>(lookup: LookupKind, message: S) -> Self {
        Self {
            lookup,
            message: message.into(),
        }
    }
}

/// The three data sources the aggregator consults, in the order it consults them
#[async_trait]
pub trait EnvironmentalLookups: Send + Sync {
    async fn current_forecast(&self, coord: Coordinate) -> Result<WeatherReading, LookupError>;

    async fn fire_risk(&self, coord: Coordinate) -> Result<RiskScore, LookupError>;

    async fn city_name(&self, coord: Coordinate) -> Result<String, LookupError>;
}

/// Production lookups backed by HTTP services
#[derive(Debug, Clone)]
pub struct HttpLookups {
    forecast: ForecastClient,
    fire_risk: FireRiskClient,
    geocode: GeocodeClient,
}

impl HttpLookups {
    #[must_use]
    pub fn new(forecast: ForecastClient, fire_risk: FireRiskClient, geocode: GeocodeClient) -> Self {
        Self {
            forecast,
            fire_risk,
            geocode,
        }
    }

    /// Build all three clients from the loaded configuration
    pub fn from_config(config: &NoFlameConfig) -> crate::Result<Self> {
        let forecast = ForecastClient::new(
            &config.forecast.base_url,
            build_client(
                Some(&config.forecast.user_agent),
                config.forecast.timeout_seconds,
            )?,
        );
        let fire_risk = FireRiskClient::new(
            &config.fire_risk.base_url,
            build_client(None, config.fire_risk.timeout_seconds)?,
        );
        let geocode = GeocodeClient::new(
            &config.geocoding.base_url,
            build_client(
                Some(&config.geocoding.user_agent),
                config.geocoding.timeout_seconds,
            )?,
        );
        Ok(Self::new(forecast, fire_risk, geocode))
    }
}

#[async_trait]
impl EnvironmentalLookups for HttpLookups {
    async fn current_forecast(&self, coord: Coordinate) -> Result<WeatherReading, LookupError> {
        self.forecast.current_forecast(coord).await
    }

    async fn fire_risk(&self, coord: Coordinate) -> Result<RiskScore, LookupError> {
        self.fire_risk.fire_risk(coord).await
    }

    async fn city_name(&self, coord: Coordinate) -> Result<String, LookupError> {
        self.geocode.city_name(coord).await
    }
}

/// Build an HTTP client with a timeout and optional user agent
pub(crate) fn build_client(user_agent: Option<&str>, timeout_seconds: u32) -> crate::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_seconds.into()));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| NoFlameError::api(format!("Failed to create HTTP client: {e}")))
}

/// GET a URL and decode a JSON body, mapping every failure onto `kind`
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    kind: LookupKind,
) -> Result<T, LookupError> {
    debug!("{} request URL: {}", kind, url);

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| LookupError::new(kind, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::new(kind, format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| LookupError::new(kind, format!("invalid response body: {e}")))
}
