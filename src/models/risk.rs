//! Wildfire risk percentage

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NoFlameError;

/// Wildfire risk in percent, always within [0, 100].
///
/// A missing score is modelled as `Option<RiskScore>::None`, which is
/// distinct from a score of zero.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, PartialOrd)]
#[serde(try_from = "f64", into = "f64")]
pub struct RiskScore(f64);

impl RiskScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Create a risk score, rejecting NaN and values outside [0, 100]
    pub fn new(value: f64) -> crate::Result<Self> {
        if value.is_nan() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(NoFlameError::validation(format!(
                "risk score {value} is outside [0, 100]"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RiskScore {
    type Error = NoFlameError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RiskScore> for f64 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
