//! Place label shown above the temperature

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reverse-geocoded place label
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "status", content = "name", rename_all = "snake_case")]
pub enum PlaceName {
    /// The lookup has not settled yet
    #[default]
    Fetching,
    Resolved(String),
    /// The lookup failed or never ran
    Unavailable,
}

impl PlaceName {
    #[must_use]
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            PlaceName::Resolved(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceName::Fetching => f.write_str("Fetching..."),
            PlaceName::Resolved(name) => f.write_str(name),
            PlaceName::Unavailable => f.write_str("Unavailable"),
        }
    }
}
