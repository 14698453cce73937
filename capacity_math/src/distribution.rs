//! Significance testing with the Student-t distribution

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Two-sided p-value of a t-statistic with `dof` degrees of freedom
///
/// The sign of `t` is ignored. The result is clamped to `[0, 1]`.
pub fn two_sided_t_p_value(t: f64, dof: usize) -> Result<f64> {
    if dof == 0 {
        return Err(MathError::InsufficientData(
            "t-test needs at least one degree of freedom".to_string(),
        ));
    }
    if t.is_nan() {
        return Err(MathError::InvalidInput("t-statistic is NaN".to_string()));
    }

    let t = t.abs();
    if t.is_infinite() {
        return Ok(0.0);
    }

    let dist = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;
    let p = 2.0 * (1.0 - dist.cdf(t));

    Ok(p.clamp(0.0, 1.0))
}
