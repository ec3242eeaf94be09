//! Current forecast from the US National Weather Service API
//!
//! Two requests: `/points/{lat},{lng}` resolves the grid forecast office and
//! hands back the hourly forecast URL, whose first period is the current
//! reading.

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{LookupError, LookupKind, get_json};
use crate::models::{CompassPoint, Coordinate, WeatherReading};

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    properties: HourlyProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyProperties {
    #[serde(default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Period {
    start_time: Option<DateTime<FixedOffset>>,
    temperature: Option<f64>,
    temperature_unit: Option<String>,
    relative_humidity: Option<QuantitativeValue>,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuantitativeValue {
    value: Option<f64>,
}

impl Period {
    fn into_reading(self) -> Result<WeatherReading, LookupError> {
        let temperature = self.temperature.ok_or_else(|| {
            LookupError::new(LookupKind::Forecast, "forecast period has no temperature")
        })?;
        let temperature_f = match self.temperature_unit.as_deref() {
            Some("C") => WeatherReading::celsius_to_fahrenheit(temperature),
            _ => temperature,
        };

        let wind_direction = self.wind_direction.as_deref().and_then(|label| {
            label
                .parse::<CompassPoint>()
                .inspect_err(|_| debug!("Ignoring unknown wind direction '{}'", label))
                .ok()
        });

        Ok(WeatherReading {
            temperature_f,
            relative_humidity_pct: self.relative_humidity.and_then(|h| h.value),
            wind_speed_mph: self.wind_speed.as_deref().and_then(parse_wind_speed),
            wind_direction,
            observed_at: self.start_time.map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// Parse NWS wind speed strings such as `"12 mph"` or `"10 to 15 mph"`.
///
/// Ranges yield their lower bound.
#[must_use]
pub fn parse_wind_speed(raw: &str) -> Option<f64> {
    raw.split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|speed| speed.is_finite() && *speed >= 0.0)
}

/// Client for the forecast lookup
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    #[must_use]
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the current reading for a coordinate
    #[instrument(name = "forecast_lookup", skip(self), fields(lat = coord.latitude(), lng = coord.longitude()))]
    pub async fn current_forecast(&self, coord: Coordinate) -> Result<WeatherReading, LookupError> {
        // NWS rejects more than four decimal places
        let points_url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url,
            coord.latitude(),
            coord.longitude()
        );
        let points: PointsResponse =
            get_json(&self.client, &points_url, LookupKind::Forecast).await?;

        let hourly_url = points.properties.forecast_hourly.ok_or_else(|| {
            warn!("No hourly forecast available for {}", coord.format_coordinates());
            LookupError::new(LookupKind::Forecast, "no hourly forecast for this location")
        })?;

        let hourly: HourlyResponse =
            get_json(&self.client, &hourly_url, LookupKind::Forecast).await?;

        let period = hourly
            .properties
            .periods
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::new(LookupKind::Forecast, "forecast has no periods"))?;

        let reading = period.into_reading()?;
        info!("Current temperature {}", reading.format_temperature());
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coord() -> Coordinate {
        Coordinate::new(37.77, -122.42).unwrap()
    }

    async fn mount_points(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/points/37.7700,-122.4200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": {
                    "forecastHourly": format!("{}/gridpoints/MTR/85,105/forecast/hourly", server.uri())
                }
            })))
            .mount(server)
            .await;
    }

    #[rstest]
    #[case("12 mph", Some(12.0))]
    #[case("10 to 15 mph", Some(10.0))]
    #[case("4.5 mph", Some(4.5))]
    #[case("calm", None)]
    #[case("", None)]
    fn test_parse_wind_speed(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_wind_speed(raw), expected);
    }

    #[tokio::test]
    async fn test_current_forecast() {
        let mock_server = MockServer::start().await;
        mount_points(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/MTR/85,105/forecast/hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": {
                    "periods": [
                        {
                            "startTime": "2024-08-01T14:00:00-07:00",
                            "temperature": 68,
                            "temperatureUnit": "F",
                            "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 40 },
                            "windSpeed": "12 mph",
                            "windDirection": "NW"
                        },
                        {
                            "startTime": "2024-08-01T15:00:00-07:00",
                            "temperature": 70,
                            "temperatureUnit": "F",
                            "windSpeed": "14 mph",
                            "windDirection": "W"
                        }
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let client = ForecastClient::new(&mock_server.uri(), Client::new());
        let reading = client.current_forecast(coord()).await.unwrap();

        assert_eq!(reading.temperature_f, 68.0);
        assert_eq!(reading.relative_humidity_pct, Some(40.0));
        assert_eq!(reading.wind_speed_mph, Some(12.0));
        assert_eq!(reading.wind_direction, Some(CompassPoint::NW));
        assert_eq!(
            reading.observed_at.unwrap().to_rfc3339(),
            "2024-08-01T21:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_current_forecast_missing_fields_and_celsius() {
        let mock_server = MockServer::start().await;
        mount_points(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/MTR/85,105/forecast/hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": {
                    "periods": [
                        {
                            "temperature": 20,
                            "temperatureUnit": "C",
                            "relativeHumidity": { "value": null },
                            "windDirection": "VRB"
                        }
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let client = ForecastClient::new(&mock_server.uri(), Client::new());
        let reading = client.current_forecast(coord()).await.unwrap();

        assert_eq!(reading.temperature_f, 68.0);
        assert_eq!(reading.relative_humidity_pct, None);
        assert_eq!(reading.wind_speed_mph, None);
        assert_eq!(reading.wind_direction, None);
    }

    #[tokio::test]
    async fn test_points_outside_coverage_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "title": "Data Unavailable For Requested Point"
            })))
            .mount(&mock_server)
            .await;

        let client = ForecastClient::new(&mock_server.uri(), Client::new());
        let err = client.current_forecast(coord()).await.unwrap_err();
        assert_eq!(err.lookup, LookupKind::Forecast);
        assert!(err.message.contains("404"));
    }

    #[tokio::test]
    async fn test_empty_periods_fails() {
        let mock_server = MockServer::start().await;
        mount_points(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/MTR/85,105/forecast/hourly"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "properties": { "periods": [] } })),
            )
            .mount(&mock_server)
            .await;

        let client = ForecastClient::new(&mock_server.uri(), Client::new());
        let err = client.current_forecast(coord()).await.unwrap_err();
        assert_eq!(err.message, "forecast has no periods");
    }
}
