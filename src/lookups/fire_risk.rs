//! Wildfire-risk lookup against the risk backend

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{LookupError, LookupKind, get_json};
use crate::models::{Coordinate, RiskScore};

/// The backend answers with either a bare number or `{"risk": n}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RiskResponse {
    Bare(f64),
    Wrapped { risk: f64 },
}

impl RiskResponse {
    fn value(&self) -> f64 {
        match self {
            RiskResponse::Bare(value) | RiskResponse::Wrapped { risk: value } => *value,
        }
    }
}

/// Client for the fire-risk lookup
#[derive(Debug, Clone)]
pub struct FireRiskClient {
    client: Client,
    base_url: String,
}

impl FireRiskClient {
    #[must_use]
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(name = "fire_risk_lookup", skip(self), fields(lat = coord.latitude(), lng = coord.longitude()))]
    pub async fn fire_risk(&self, coord: Coordinate) -> Result<RiskScore, LookupError> {
        let url = format!(
            "{}/fire-risk?lat={}&lng={}",
            self.base_url,
            coord.latitude(),
            coord.longitude()
        );
        let response: RiskResponse = get_json(&self.client, &url, LookupKind::FireRisk).await?;

        let score = RiskScore::new(response.value())
            .map_err(|e| LookupError::new(LookupKind::FireRisk, e.to_string()))?;
        info!("Fire risk {}", score);
        Ok(score)
    }
}
