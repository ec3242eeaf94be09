//! Error types and handling for the `NoFlame` dashboard

use thiserror::Error;

use crate::location::LocationError;
use crate::lookups::LookupError;

/// Main error type for the `NoFlame` application
#[derive(Error, Debug)]
pub enum NoFlameError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors outside the lookup pipeline
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The position could not be obtained
    #[error("Location error: {source}")]
    Location {
        #[from]
        source: LocationError,
    },

    /// One of the environmental lookups failed
    #[error("Lookup error: {source}")]
    Lookup {
        #[from]
        source: LookupError,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl NoFlameError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NoFlameError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            NoFlameError::Api { .. } | NoFlameError::Lookup { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            NoFlameError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            NoFlameError::Location { .. } => {
                "Unable to determine your location. Check location permissions.".to_string()
            }
            NoFlameError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
