//! Dashboard Renderer
//!
//! Turns a [`DashboardState`] snapshot into the visual tree of the dashboard.
//! Purely reactive: everything shown is derived from the snapshot and the
//! mapper functions in [`crate::visual`].

use std::fmt;

use serde::Serialize;

use crate::aggregator::{DashboardState, PipelinePhase};
use crate::config::MapConfig;
use crate::models::{Coordinate, WeatherReading};
use crate::visual::{self, RiskGradient};

const LOCATION_FAILED: &str = "Unable to determine your location";

/// Map widget inputs; the map provider renders on its own schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSettings {
    pub api_key: Option<String>,
    pub zoom: u8,
}

impl From<&MapConfig> for MapSettings {
    fn from(config: &MapConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            zoom: config.zoom,
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings::from(&MapConfig::default())
    }
}

/// A map centred on the user with a single marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapWidget {
    pub api_key: Option<String>,
    pub center: Coordinate,
    pub zoom: u8,
    pub marker: Coordinate,
}

/// One box on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Loading { message: String },
    Value { title: String, value: String },
    Unavailable { message: String },
}

impl Panel {
    fn loading(what: &str) -> Self {
        Panel::Loading {
            message: format!("Loading {what}..."),
        }
    }

    fn value(title: impl Into<String>, value: impl Into<String>) -> Self {
        Panel::Value {
            title: title.into(),
            value: value.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Panel::Unavailable {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindArrow {
    pub direction: String,
    pub rotation_deg: f64,
}

/// Risk readout, flame and "likelihood of fire" box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskView {
    pub value: String,
    /// `None` suppresses the flame entirely
    pub flame_scale: Option<f64>,
    pub gradient: RiskGradient,
    pub gradient_css: String,
}

/// The complete visual tree for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub phase: PipelinePhase,
    pub loading: bool,
    pub place: String,
    pub weather: Panel,
    pub humidity: Panel,
    pub wind_speed: Panel,
    pub wind_direction: Panel,
    pub wind_arrow: Option<WindArrow>,
    pub risk: Option<RiskView>,
    pub map: Option<MapWidget>,
}

impl DashboardView {
    #[must_use]
    pub fn from_state(state: &DashboardState, map: &MapSettings) -> Self {
        let place = state.place.to_string();
        let weather = state.weather.as_ref();

        let panel = |what: &str, unable: &str, build: &dyn Fn(&WeatherReading) -> Option<Panel>| {
            match state.phase {
                phase if phase.is_loading() => Panel::loading(what),
                PipelinePhase::LocationFailed => Panel::unavailable(LOCATION_FAILED),
                _ => weather
                    .and_then(build)
                    .unwrap_or_else(|| Panel::unavailable(unable)),
            }
        };

        let weather_panel = panel("weather", "Unable to fetch weather", &|w| {
            Some(Panel::value(place.clone(), w.format_temperature()))
        });
        let humidity = panel("humidity", "Unable to fetch humidity data", &|w| {
            w.format_humidity().map(|h| Panel::value("Humidity", h))
        });
        let wind_speed = panel("wind speed", "Unable to fetch wind speed", &|w| {
            w.format_wind_speed().map(|s| Panel::value("Wind Speed", s))
        });
        let wind_direction = panel("wind direction", "Unable to fetch wind direction", &|w| {
            w.wind_direction
                .map(|d| Panel::value("Wind Direction", d.label()))
        });

        let wind_arrow = if state.phase.is_loading() {
            None
        } else {
            weather
                .and_then(|w| w.wind_direction)
                .map(|direction| WindArrow {
                    direction: direction.label().to_string(),
                    rotation_deg: visual::rotation_for(Some(direction)),
                })
        };

        // No score, no gradient box
        let risk = state
            .risk
            .zip(visual::risk_gradient_for(state.risk))
            .map(|(score, gradient)| RiskView {
                value: score.to_string(),
                flame_scale: visual::flame_scale(score),
                gradient_css: gradient.css(),
                gradient,
            });

        let map = state.coordinate.map(|coordinate| MapWidget {
            api_key: map.api_key.clone(),
            center: coordinate,
            zoom: map.zoom,
            marker: coordinate,
        });

        Self {
            phase: state.phase,
            loading: state.is_loading(),
            place,
            weather: weather_panel,
            humidity,
            wind_speed,
            wind_direction,
            wind_arrow,
            risk,
            map,
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Loading { message } | Panel::Unavailable { message } => f.write_str(message),
            Panel::Value { title, value } => write!(f, "{title}: {value}"),
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NO FLAME")?;
        writeln!(f, "========")?;
        writeln!(f, "{}", self.weather)?;
        writeln!(f, "{}", self.humidity)?;
        writeln!(f, "{}", self.wind_speed)?;
        match &self.wind_arrow {
            Some(arrow) => writeln!(f, "{} (arrow {}°)", self.wind_direction, arrow.rotation_deg)?,
            None => writeln!(f, "{}", self.wind_direction)?,
        }

        if let Some(risk) = &self.risk {
            writeln!(f, "Risk Factor: {}", risk.value)?;
            if let Some(scale) = risk.flame_scale {
                writeln!(f, "Flame scale: {scale:.2}")?;
            }
            writeln!(f, "Likelihood of fire: {}", risk.gradient_css)?;
        }

        match (&self.map, self.phase) {
            (Some(map), _) => write!(
                f,
                "Map: {} (zoom {})",
                map.center.format_coordinates(),
                map.zoom
            ),
            (None, PipelinePhase::LocationFailed) => write!(f, "Map: {LOCATION_FAILED}"),
            (None, _) => write!(f, "Loading map..."),
        }
    }
}
