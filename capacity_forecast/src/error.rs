//! Error types for the capacity_forecast crate

use thiserror::Error;

/// Custom error types for the capacity_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed repository input such as non-finite values or a bad capacity
    #[error("Data error: {0}")]
    DataError(String),

    /// Configuration could not be read, parsed or validated
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from numerical primitives
    #[error("Math error: {0}")]
    MathError(#[from] capacity_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reading CSV input
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error serializing forecast output
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(format!("Failed to parse config: {}", err))
    }
}
