//! Descriptive statistics over plain slices
//!
//! Standard deviation here is the population form (divide by `n`), which is
//! what the outlier rule is defined against.

/// Arithmetic mean, or `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, or `None` for an empty slice
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sum of squared differences between observed and predicted values
pub fn sum_squared_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| (o - p).powi(2))
        .sum()
}

/// Coefficient of determination, clamped to `[0, 1]`
///
/// Defined as `0.0` when the observed series has no variance.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let Some(y_mean) = mean(observed) else {
        return 0.0;
    };

    let ss_tot: f64 = observed.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot <= 0.0 {
        return 0.0;
    }

    let ss_res = sum_squared_residuals(observed, predicted);
    let r2 = 1.0 - ss_res / ss_tot;
    if r2.is_finite() {
        r2.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
