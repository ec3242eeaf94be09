//! Data models for the NoFlame dashboard
//!
//! This module contains the core domain models organized by concern:
//! - Coordinate: the position captured once per session
//! - Weather: the current reading and compass labels
//! - Risk: the wildfire-risk percentage
//! - Place: the reverse-geocoded place label

pub mod coordinate;
pub mod place;
pub mod risk;
pub mod weather;

// Re-export all public types for convenient access
pub use coordinate::Coordinate;
pub use place::PlaceName;
pub use risk::RiskScore;
pub use weather::{CompassPoint, WeatherReading};
