//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap), no API key required.

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{LookupError, LookupKind, get_json};
use crate::models::Coordinate;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
}

impl NominatimAddress {
    /// Prefer city > town > village > municipality > county > state
    fn place(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.county)
            .or(self.state)
            .filter(|name| !name.trim().is_empty())
    }
}

/// Client for the place-name lookup
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
}

impl GeocodeClient {
    #[must_use]
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(name = "place_name_lookup", skip(self), fields(lat = coord.latitude(), lng = coord.longitude()))]
    pub async fn city_name(&self, coord: Coordinate) -> Result<String, LookupError> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&addressdetails=1&zoom=10",
            self.base_url,
            coord.latitude(),
            coord.longitude()
        );
        let body: NominatimResponse = get_json(&self.client, &url, LookupKind::PlaceName).await?;

        if let Some(error) = body.error {
            return Err(LookupError::new(LookupKind::PlaceName, error));
        }

        let place = body
            .address
            .and_then(NominatimAddress::place)
            .ok_or_else(|| LookupError::new(LookupKind::PlaceName, "no place name at this location"))?;

        info!("Reverse geocoded to: {}", place);
        Ok(place)
    }
}
