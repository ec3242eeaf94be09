//! Derived-Visualization Mapper
//!
//! Pure functions turning aggregated data into display parameters: the wind
//! arrow rotation, the "likelihood of fire" gradient and the flame scale.

use serde::Serialize;

use crate::models::{CompassPoint, RiskScore};

/// Rotation of the wind arrow for each compass label, 22.5° apart from N = 0°
pub const COMPASS_ROTATION_TABLE: [(CompassPoint, f64); 16] = [
    (CompassPoint::N, 0.0),
    (CompassPoint::NNE, 22.5),
    (CompassPoint::NE, 45.0),
    (CompassPoint::ENE, 67.5),
    (CompassPoint::E, 90.0),
    (CompassPoint::ESE, 112.5),
    (CompassPoint::SE, 135.0),
    (CompassPoint::SSE, 157.5),
    (CompassPoint::S, 180.0),
    (CompassPoint::SSW, 202.5),
    (CompassPoint::SW, 225.0),
    (CompassPoint::WSW, 247.5),
    (CompassPoint::W, 270.0),
    (CompassPoint::WNW, 292.5),
    (CompassPoint::NW, 315.0),
    (CompassPoint::NNW, 337.5),
];

/// Rotation in degrees for a compass label; 0 when absent or unrecognized
#[must_use]
pub fn rotation_angle(direction: Option<&str>) -> f64 {
    rotation_for(direction.and_then(|label| label.parse::<CompassPoint>().ok()))
}

/// Rotation in degrees for an already parsed compass point
#[must_use]
pub fn rotation_for(direction: Option<CompassPoint>) -> f64 {
    direction
        .and_then(|point| {
            COMPASS_ROTATION_TABLE
                .iter()
                .find(|(candidate, _)| *candidate == point)
                .map(|(_, degrees)| *degrees)
        })
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// risk <= 25
    Low,
    /// 25 < risk <= 50
    Moderate,
    /// 50 < risk <= 75
    High,
    /// 75 < risk <= 100
    Extreme,
}

impl RiskTier {
    #[must_use]
    pub fn for_risk(risk: RiskScore) -> Self {
        let value = risk.value();
        if value <= 25.0 {
            RiskTier::Low
        } else if value <= 50.0 {
            RiskTier::Moderate
        } else if value <= 75.0 {
            RiskTier::High
        } else {
            RiskTier::Extreme
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradientStop {
    pub color: &'static str,
    /// Stop position in percent; `None` lets the renderer distribute evenly
    pub position: Option<u8>,
}

impl GradientStop {
    const fn plain(color: &'static str) -> Self {
        Self {
            color,
            position: None,
        }
    }

    const fn at(color: &'static str, position: u8) -> Self {
        Self {
            color,
            position: Some(position),
        }
    }

    fn css(self) -> String {
        match self.position {
            Some(position) => format!("{} {}%", self.color, position),
            None => self.color.to_string(),
        }
    }
}

/// Two-colour gradient painted behind the "likelihood of fire" box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskGradient {
    pub tier: RiskTier,
    pub start: GradientStop,
    pub end: GradientStop,
}

impl RiskGradient {
    /// CSS `background` value
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "linear-gradient(135deg, {}, {})",
            self.start.css(),
            self.end.css()
        )
    }
}

/// Four-tier colour mapping, upper bound of each tier inclusive
#[must_use]
pub fn risk_gradient(risk: RiskScore) -> RiskGradient {
    let tier = RiskTier::for_risk(risk);
    let (start, end) = match tier {
        RiskTier::Low => (GradientStop::plain("green"), GradientStop::plain("yellow")),
        RiskTier::Moderate => (GradientStop::plain("yellow"), GradientStop::plain("orange")),
        RiskTier::High => (GradientStop::at("orange", 20), GradientStop::at("red", 80)),
        RiskTier::Extreme => (GradientStop::at("red", 50), GradientStop::at("darkred", 100)),
    };
    RiskGradient { tier, start, end }
}

/// Gradient for a possibly missing score; a missing score suppresses the box
#[must_use]
pub fn risk_gradient_for(risk: Option<RiskScore>) -> Option<RiskGradient> {
    risk.map(risk_gradient)
}

/// Scale factor for the flame visual, `None` when the flame is suppressed
#[must_use]
pub fn flame_scale(risk: RiskScore) -> Option<f64> {
    let value = risk.value();
    if value <= 0.0 {
        return None;
    }
    Some((value / 100.0).clamp(0.0, 1.0))
}
