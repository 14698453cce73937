//! Real roots of low-degree polynomials

/// Real roots of `a·x² + b·x + c = 0` with `a != 0`, in ascending order
///
/// Returns an empty vector when the discriminant is negative. Uses the
/// numerically stable form that avoids cancellation between `-b` and the
/// square root of the discriminant.
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 || !discriminant.is_finite() {
        return Vec::new();
    }

    let sqrt_disc = discriminant.sqrt();
    let q = -0.5 * (b + b.signum() * sqrt_disc);

    let (x1, x2) = if q == 0.0 {
        // b == 0 and discriminant == 0: double root at zero
        (0.0, 0.0)
    } else {
        (q / a, c / q)
    };

    if x1 <= x2 {
        vec![x1, x2]
    } else {
        vec![x2, x1]
    }
}
