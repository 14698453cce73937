//! Growth models for capacity series

use serde::{Deserialize, Serialize};

pub mod fitter;

pub use fitter::GrowthModelFitter;

/// Shape of the selected growth model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelKind {
    Linear,
    Quadratic,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Linear => "LINEAR",
            ModelKind::Quadratic => "QUADRATIC",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coefficients of `a·x² + b·x + c`
///
/// Linear models are stored with `a = 0` so every consumer handles a single
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl GrowthCoefficients {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Linear model `slope·x + intercept`
    pub fn linear(slope: f64, intercept: f64) -> Self {
        Self::new(0.0, slope, intercept)
    }

    /// Modeled value at day `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }

    /// Scale the growth terms (`a`, `b`) by `factor`, leaving `c` untouched
    pub fn scale_growth(&self, factor: f64) -> Self {
        Self::new(self.a * factor, self.b * factor, self.c)
    }
}

/// A fitted and selected growth model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub coefficients: GrowthCoefficients,
    /// Fit quality of the selected model, in `[0, 1]`
    pub r_squared: f64,
    /// p-value of the quadratic term, in `[0, 1]`
    pub p_value: f64,
    /// Number of points the model was fitted on
    pub sample_count: usize,
}

impl FittedModel {
    /// Modeled value at day `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.evaluate(x)
    }
}
