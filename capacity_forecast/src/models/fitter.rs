//! Linear versus quadratic growth model selection
//!
//! Both polynomials are fitted by least squares. The quadratic one is kept
//! only when its curvature term passes a two-sided t-test; otherwise the
//! simpler line is used. Degenerate input never fails: it falls back to a
//! line with whatever fit quality the data supports.

use crate::config::ModelConfig;
use crate::models::{FittedModel, GrowthCoefficients, ModelKind};
use capacity_math::distribution::two_sided_t_p_value;
use capacity_math::{fit_linear, fit_quadratic, stats};
use tracing::debug;

/// Residual error at or below this fraction of the data scale is treated as
/// an exact fit
const EXACT_FIT_TOLERANCE: f64 = 1e-9;

/// Fits and selects growth models
#[derive(Debug, Clone)]
pub struct GrowthModelFitter {
    config: ModelConfig,
}

impl GrowthModelFitter {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Fit `(x, y)` and select between the linear and quadratic model
    pub fn fit(&self, x: &[f64], y: &[f64]) -> FittedModel {
        let n = x.len().min(y.len());
        let (x, y) = (&x[..n], &y[..n]);

        let linear = match fit_linear(x, y) {
            Ok(fit) => GrowthCoefficients::linear(fit.slope, fit.intercept),
            Err(_) => GrowthCoefficients::linear(0.0, stats::mean(y).unwrap_or(0.0)),
        };

        let (quadratic, p_value) = self.quadratic_significance(x, y, &linear);

        let (kind, coefficients) = match quadratic {
            Some(q) if p_value < self.config.p_value_threshold => (ModelKind::Quadratic, q),
            _ => (ModelKind::Linear, linear),
        };
        debug!(model = %kind, p_value, "selected growth model");

        let predicted: Vec<f64> = x.iter().map(|&xi| coefficients.evaluate(xi)).collect();
        let r_squared = stats::r_squared(y, &predicted);

        FittedModel {
            kind,
            coefficients,
            r_squared,
            p_value,
            sample_count: n,
        }
    }

    /// Fit the quadratic and test whether its `a` term is needed
    ///
    /// Returns the quadratic coefficients (when the fit exists) and the
    /// p-value of `a`, which is `1.0` whenever the test cannot be carried
    /// out: fewer than four points, a singular design matrix, or `se(a) == 0`.
    ///
    /// An exact quadratic fit leaves `se(a)` at zero. It keeps p = 1.0 only
    /// when the line is exact too; otherwise the curvature is certain and
    /// p = 0.0.
    fn quadratic_significance(
        &self,
        x: &[f64],
        y: &[f64],
        linear: &GrowthCoefficients,
    ) -> (Option<GrowthCoefficients>, f64) {
        let fit = match fit_quadratic(x, y) {
            Ok(fit) => fit,
            Err(e) => {
                debug!(error = %e, "quadratic fit unavailable");
                return (None, 1.0);
            }
        };
        let coefficients = GrowthCoefficients::new(fit.a, fit.b, fit.c);

        let dof = fit.residual_dof();
        if dof == 0 {
            return (Some(coefficients), 1.0);
        }

        let predicted: Vec<f64> = x.iter().map(|&xi| fit.evaluate(xi)).collect();
        let mse = stats::sum_squared_residuals(y, &predicted) / dof as f64;

        let tolerance = EXACT_FIT_TOLERANCE * y.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        if mse.sqrt() <= tolerance {
            let line: Vec<f64> = x.iter().map(|&xi| linear.evaluate(xi)).collect();
            let line_rms = (stats::sum_squared_residuals(y, &line) / x.len() as f64).sqrt();
            let p_value = if line_rms <= tolerance { 1.0 } else { 0.0 };
            debug!(p_value, "exact quadratic fit");
            return (Some(coefficients), p_value);
        }

        let se_a = fit.standard_error_a(mse);
        if !(se_a > 0.0) || !se_a.is_finite() {
            return (Some(coefficients), 1.0);
        }

        let p_value = two_sided_t_p_value(fit.a / se_a, dof).unwrap_or(1.0);
        (Some(coefficients), p_value)
    }
}
