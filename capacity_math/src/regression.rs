//! Ordinary least-squares polynomial fits
//!
//! Contains the two fits the growth models are built from:
//! - Linear regression (degree 1)
//! - Quadratic regression (degree 2) with the inverse normal matrix kept
//!   for coefficient standard errors

use crate::linalg::{gram_matrix, gram_vector, invert3, mul_vec3, Matrix3};
use crate::{validate_xy, MathError, Result};

/// Fitted straight line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fitted parabola `y = a * x² + b * x + c`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// `(XᵀX)⁻¹` of the design matrix `[x², x, 1]`, evaluated on centred `x`.
    ///
    /// Only the `[0][0]` entry is location invariant, so this is meant for
    /// the standard error of `a` and nothing else.
    xtx_inv: Matrix3,
    /// Number of observations used in the fit
    n: usize,
}

impl QuadraticFit {
    /// Evaluate the parabola at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }

    /// Coefficients as `(a, b, c)`
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    /// Number of observations used in the fit
    pub fn sample_count(&self) -> usize {
        self.n
    }

    /// Residual degrees of freedom (`n - 3`)
    pub fn residual_dof(&self) -> usize {
        self.n.saturating_sub(3)
    }

    /// Standard error of `a` given the residual mean squared error
    pub fn standard_error_a(&self, mse: f64) -> f64 {
        let var = mse * self.xtx_inv[0][0];
        if var > 0.0 {
            var.sqrt()
        } else {
            0.0
        }
    }
}

/// Fit a least-squares line through `(x, y)`
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    validate_xy(x, y, 2)?;

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        numerator += (xi - x_mean) * (yi - y_mean);
        denominator += (xi - x_mean) * (xi - x_mean);
    }

    if denominator.abs() < 1e-10 {
        return Err(MathError::CalculationError(
            "Cannot calculate slope: x values are too similar".to_string(),
        ));
    }

    let slope = numerator / denominator;
    Ok(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Fit a least-squares parabola through `(x, y)`
///
/// The normal equations are solved on `x` centred at its mean and the
/// coefficients mapped back, which keeps `XᵀX` well conditioned for day
/// indices in the hundreds.
pub fn fit_quadratic(x: &[f64], y: &[f64]) -> Result<QuadraticFit> {
    validate_xy(x, y, 3)?;

    let m = x.iter().sum::<f64>() / x.len() as f64;
    let rows: Vec<[f64; 3]> = x
        .iter()
        .map(|&xi| {
            let u = xi - m;
            [u * u, u, 1.0]
        })
        .collect();

    let xtx_inv = invert3(&gram_matrix(&rows))?;
    let [a, b_c, c_c] = mul_vec3(&xtx_inv, &gram_vector(&rows, y));

    // a(x-m)² + b'(x-m) + c'  ->  a x² + (b' - 2am) x + (am² - b'm + c')
    let b = b_c - 2.0 * a * m;
    let c = a * m * m - b_c * m + c_c;

    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(MathError::CalculationError(
            "Quadratic fit produced non-finite coefficients".to_string(),
        ));
    }

    Ok(QuadraticFit {
        a,
        b,
        c,
        xtx_inv,
        n: x.len(),
    })
}
