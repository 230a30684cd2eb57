//! Core error types for todo5-core.
//!
//! This module defines the error hierarchy using thiserror. Each
//! collaborator (configuration, OAuth, the Todoist and Google HTTP clients)
//! has its own enum, and [`CoreError`] wraps them for callers that drive a
//! whole scheduling run.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for todo5-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// OAuth-related errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Task source or calendar errors
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credential store errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The config directory could not be determined or created
    #[error("Config directory unavailable: {0}")]
    DirUnavailable(String),
}

/// OAuth-specific errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// Not authenticated
    #[error("Not authenticated with {service}")]
    NotAuthenticated { service: String },

    /// Credentials not configured
    #[error("OAuth credentials not configured for {service}")]
    CredentialsNotConfigured { service: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Errors raised by the Todoist and Google Calendar clients.
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("{service} network error: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: u16,
    },

    #[error("{service} API error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("{service} response malformed: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("{service} credentials missing")]
    MissingCredentials { service: &'static str },

    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl IntegrationError {
    pub(crate) fn network(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Network { service, source }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// A required field is absent from an external record
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_error_messages_name_the_service() {
        let err = IntegrationError::Status {
            service: "todoist",
            status: 401,
        };
        assert_eq!(err.to_string(), "todoist returned HTTP 401");

        let err = IntegrationError::MissingCredentials { service: "google" };
        assert_eq!(err.to_string(), "google credentials missing");
    }

    #[test]
    fn core_error_wraps_config_error() {
        let err: CoreError = ConfigError::UnknownKey("nope.nope".into()).into();
        assert!(err.to_string().contains("nope.nope"));
    }
}
