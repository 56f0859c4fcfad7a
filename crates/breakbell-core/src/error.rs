//! Core error types for breakbell-core.
//!
//! The scheduling tick itself never fails; these errors come from the
//! edges: rejected reminder definitions, configuration I/O and the
//! holiday data source.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breakbell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Holiday data source errors
    #[error("Holiday data error: {0}")]
    Holiday(#[from] HolidayError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Rejected reminder or calendar definitions.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Enabled interval reminders need a finite, positive period.
    #[error("Reminder '{id}' has an invalid interval: {value}")]
    InvalidInterval { id: String, value: f64 },

    #[error("Reminder id must not be empty")]
    EmptyId,

    #[error("Reminder id '{0}' is reserved")]
    ReservedId(String),

    #[error("Unknown reminder id '{0}'")]
    UnknownReminder(String),

    #[error("Reminder id '{0}' appears more than once")]
    DuplicateId(String),

    /// Active-hours boundaries must be `HH:MM`.
    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTimeOfDay(String),
}

/// Holiday data fetch failures. None of these are cached.
#[derive(Error, Debug)]
pub enum HolidayError {
    #[error("request for {year} failed: {source}")]
    Http {
        year: i32,
        #[source]
        source: reqwest::Error,
    },

    #[error("holiday source returned HTTP {status} for {year}")]
    Status { year: i32, status: u16 },

    #[error("could not decode holiday data for {year}: {message}")]
    Decode { year: i32, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
