//! `NoFlame` - local weather and wildfire risk dashboard
//!
//! This library provides the dashboard pipeline: acquiring the user's
//! position once, looking up the forecast, fire risk and place name for it,
//! and deriving the values the dashboard draws from the results.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod lookups;
pub mod models;
pub mod render;
pub mod visual;
pub mod web;

// Re-export core types for public API
pub use aggregator::{Aggregator, DashboardState, PipelinePhase};
pub use config::NoFlameConfig;
pub use error::NoFlameError;
pub use location::{GeolocationCapability, LocationError, LocationProvider};
pub use lookups::{EnvironmentalLookups, HttpLookups, LookupError, LookupKind};
pub use models::{CompassPoint, Coordinate, PlaceName, RiskScore, WeatherReading};
pub use render::{DashboardView, MapSettings};
pub use visual::{RiskGradient, RiskTier, flame_scale, risk_gradient, rotation_angle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NoFlameError>;
