//! JSON API consumed by the browser dashboard
//!
//! Each `GET /api/dashboard` request is one pipeline session. The browser runs
//! its own geolocation prompt and forwards the outcome: coordinates become a
//! fixed position, `denied=true` a refused prompt, and nothing at all means
//! the browser has no geolocation support.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::aggregator::Aggregator;
use crate::location::{DeniedPosition, LocationProvider};
use crate::lookups::EnvironmentalLookups;
use crate::models::Coordinate;
use crate::render::{DashboardView, MapSettings};

/// Shared handler state
pub struct AppState<L> {
    pub lookups: L,
    pub map: MapSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub denied: bool,
}

impl DashboardQuery {
    fn into_provider(self) -> crate::Result<LocationProvider> {
        Ok(match (self.denied, self.lat, self.lng) {
            (true, _, _) => LocationProvider::new(Some(Box::new(DeniedPosition))),
            (false, Some(lat), Some(lng)) => LocationProvider::fixed(Coordinate::new(lat, lng)?),
            _ => LocationProvider::unsupported(),
        })
    }
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router<L>(state: Arc<AppState<L>>) -> Router
where
    L: EnvironmentalLookups + Clone + 'static,
{
    Router::new()
        .route("/health", get(get_health))
        .route("/dashboard", get(get_dashboard::<L>))
        .with_state(state)
}

async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: crate::VERSION,
    })
}

#[instrument(skip(state))]
async fn get_dashboard<L>(
    State(state): State<Arc<AppState<L>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, (StatusCode, String)>
where
    L: EnvironmentalLookups + Clone + 'static,
{
    let provider = query
        .into_provider()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.user_message()))?;

    let mut aggregator = Aggregator::new(state.lookups.clone());
    let snapshot = aggregator.run(provider).await;
    Ok(Json(DashboardView::from_state(&snapshot, &state.map)))
}
