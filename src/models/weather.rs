//! Weather reading model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NoFlameError;

/// The 16 points of the compass, clockwise from north
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassPoint {
    /// All points in clockwise order starting at north
    pub const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::NNE,
        CompassPoint::NE,
        CompassPoint::ENE,
        CompassPoint::E,
        CompassPoint::ESE,
        CompassPoint::SE,
        CompassPoint::SSE,
        CompassPoint::S,
        CompassPoint::SSW,
        CompassPoint::SW,
        CompassPoint::WSW,
        CompassPoint::W,
        CompassPoint::WNW,
        CompassPoint::NW,
        CompassPoint::NNW,
    ];

    /// Canonical upper-case label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NNE => "NNE",
            CompassPoint::NE => "NE",
            CompassPoint::ENE => "ENE",
            CompassPoint::E => "E",
            CompassPoint::ESE => "ESE",
            CompassPoint::SE => "SE",
            CompassPoint::SSE => "SSE",
            CompassPoint::S => "S",
            CompassPoint::SSW => "SSW",
            CompassPoint::SW => "SW",
            CompassPoint::WSW => "WSW",
            CompassPoint::W => "W",
            CompassPoint::WNW => "WNW",
            CompassPoint::NW => "NW",
            CompassPoint::NNW => "NNW",
        }
    }
}

impl FromStr for CompassPoint {
    type Err = NoFlameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CompassPoint::ALL
            .into_iter()
            .find(|point| point.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NoFlameError::validation(format!("unknown compass direction '{s}'")))
    }
}

impl TryFrom<String> for CompassPoint {
    type Error = NoFlameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CompassPoint> for &'static str {
    fn from(point: CompassPoint) -> Self {
        point.label()
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current conditions at the captured coordinate.
///
/// Every field except the temperature may be missing from the source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReading {
    /// Temperature in Fahrenheit
    pub temperature_f: f64,
    /// Relative humidity in percent
    pub relative_humidity_pct: Option<f64>,
    /// Wind speed in mph
    pub wind_speed_mph: Option<f64>,
    /// Direction the wind blows from
    pub wind_direction: Option<CompassPoint>,
    /// Start of the forecast period this reading belongs to
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherReading {
    /// Convert temperature from Celsius to Fahrenheit
    #[must_use]
    pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
        celsius * 9.0 / 5.0 + 32.0
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}°F", format_number(self.temperature_f))
    }

    #[must_use]
    pub fn format_humidity(&self) -> Option<String> {
        self.relative_humidity_pct
            .map(|pct| format!("{}%", format_number(pct)))
    }

    #[must_use]
    pub fn format_wind_speed(&self) -> Option<String> {
        self.wind_speed_mph
            .map(|mph| format!("{} mph", format_number(mph)))
    }
}

/// Whole numbers print without a fractional part, everything else with one decimal
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
