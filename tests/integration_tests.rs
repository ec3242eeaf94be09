//! Integration tests for the NoFlame dashboard pipeline and CLI

use std::process::Command;

use noflame::config::NoFlameConfig;
use noflame::location::DeniedPosition;
use noflame::{
    Aggregator, Coordinate, DashboardView, HttpLookups, LocationProvider, MapSettings,
    PipelinePhase, PlaceName, RiskTier,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount forecast, fire-risk and geocoding responses for (37.77, -122.42)
async fn mount_san_francisco(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/points/37.7700,-122.4200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": {
                "forecastHourly": format!("{}/gridpoints/MTR/85,105/forecast/hourly", server.uri())
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gridpoints/MTR/85,105/forecast/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": {
                "periods": [{
                    "startTime": "2024-08-01T14:00:00-07:00",
                    "temperature": 68,
                    "temperatureUnit": "F",
                    "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 40 },
                    "windSpeed": "12 mph",
                    "windDirection": "NW"
                }]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fire-risk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "risk": 62 })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "city": "San Francisco", "state": "California" }
        })))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> NoFlameConfig {
    let mut config = NoFlameConfig::default();
    config.forecast.base_url = server.uri();
    config.fire_risk.base_url = server.uri();
    config.geocoding.base_url = server.uri();
    config
}

fn san_francisco() -> Coordinate {
    Coordinate::new(37.77, -122.42).unwrap()
}

#[tokio::test]
async fn test_end_to_end_dashboard() {
    let server = MockServer::start().await;
    mount_san_francisco(&server).await;
    let config = config_for(&server);

    let mut aggregator = Aggregator::new(HttpLookups::from_config(&config).unwrap());
    let state = aggregator.run(LocationProvider::fixed(san_francisco())).await;
    assert_eq!(state.phase, PipelinePhase::Loaded);

    let view = DashboardView::from_state(&state, &MapSettings::from(&config.map));
    let rendered = view.to_string();

    assert!(rendered.contains("San Francisco: 68°F"));
    assert!(rendered.contains("Humidity: 40%"));
    assert!(rendered.contains("Wind Speed: 12 mph"));
    assert_eq!(view.wind_arrow.as_ref().unwrap().rotation_deg, 315.0);

    let risk = view.risk.as_ref().unwrap();
    assert_eq!(risk.value, "62%");
    assert_eq!(risk.gradient.tier, RiskTier::High);
    assert_eq!(risk.gradient_css, "linear-gradient(135deg, orange 20%, red 80%)");
    assert_eq!(risk.flame_scale, Some(0.62));

    assert_eq!(view.place, "San Francisco");
    assert_eq!(view.map.as_ref().unwrap().zoom, 15);
}

#[tokio::test]
async fn test_forecast_outage_never_reaches_other_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/points/37.7700,-122.4200"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fire-risk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(10)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let mut aggregator = Aggregator::new(HttpLookups::from_config(&config).unwrap());
    let state = aggregator.aggregate(san_francisco()).await;

    assert_eq!(state.phase, PipelinePhase::PartiallyLoaded);
    assert!(!state.is_loading());
    assert!(state.weather.is_none());
    assert!(state.risk.is_none());
    assert_eq!(state.place, PlaceName::Unavailable);

    server.verify().await;
}

#[tokio::test]
async fn test_location_denied_never_reaches_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let mut aggregator = Aggregator::new(HttpLookups::from_config(&config).unwrap());
    let state = aggregator
        .run(LocationProvider::new(Some(Box::new(DeniedPosition))))
        .await;

    assert_eq!(state.phase, PipelinePhase::LocationFailed);
    let view = DashboardView::from_state(&state, &MapSettings::default());
    assert!(view.risk.is_none());
    assert!(view.map.is_none());

    server.verify().await;
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_noflame"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("noflame"));
    assert!(stdout.contains("wildfire risk dashboard"));
}

/// Test that half a coordinate is rejected by argument parsing
#[test]
fn test_cli_requires_both_coordinates() {
    let output = Command::new(env!("CARGO_BIN_EXE_noflame"))
        .args(["show", "--lat", "37.77"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

/// Test the show command against mocked services
#[tokio::test(flavor = "multi_thread")]
async fn test_cli_show_json() {
    let server = MockServer::start().await;
    mount_san_francisco(&server).await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_noflame"))
            .env("NOFLAME_FORECAST__BASE_URL", &uri)
            .env("NOFLAME_FIRE_RISK__BASE_URL", &uri)
            .env("NOFLAME_GEOCODING__BASE_URL", &uri)
            .args(["show", "--lat", "37.77", "--lng", "-122.42", "--json"])
            .output()
            .expect("Failed to execute command")
    })
    .await
    .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "show failed: {stderr}");

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["phase"], "loaded");
    assert_eq!(view["weather"]["value"], "68°F");
    assert_eq!(view["risk"]["value"], "62%");
    assert_eq!(view["place"], "San Francisco");
}
