//! # Capacity Math
//!
//! Numerical building blocks for capacity forecasting.
//! This crate provides descriptive statistics, least-squares polynomial
//! fitting, a small dense linear-algebra kernel, the Student-t significance
//! test used for model selection, and real root finding for quadratics.

use thiserror::Error;

// Numerical modules
pub mod distribution;
pub mod linalg;
pub mod regression;
pub mod roots;
pub mod stats;

pub use regression::{fit_linear, fit_quadratic, LinearFit, QuadraticFit};

/// Errors that can occur in capacity math operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Matrix is singular: {0}")]
    SingularMatrix(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for capacity math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Check that two series are paired, non-empty and finite
pub(crate) fn validate_xy(x: &[f64], y: &[f64], min_len: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "x and y must have the same length ({} != {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < min_len {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} points, got {}",
            min_len,
            x.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Series contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
