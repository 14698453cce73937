//! Small dense linear algebra for least-squares normal equations

use crate::{MathError, Result};

/// Row-major 3x3 matrix
pub type Matrix3 = [[f64; 3]; 3];

/// Relative pivot tolerance below which a matrix is treated as singular
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Compute `XᵀX` for a design matrix given as rows of `[x², x, 1]`
pub fn gram_matrix(rows: &[[f64; 3]]) -> Matrix3 {
    let mut gram = [[0.0; 3]; 3];
    for row in rows {
        for i in 0..3 {
            for j in 0..3 {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    gram
}

/// Compute `Xᵀy` for a design matrix given as rows
pub fn gram_vector(rows: &[[f64; 3]], y: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, &value) in rows.iter().zip(y.iter()) {
        for i in 0..3 {
            out[i] += row[i] * value;
        }
    }
    out
}

/// Invert a 3x3 matrix with Gauss-Jordan elimination and partial pivoting
///
/// Returns [`MathError::SingularMatrix`] when a pivot falls below a tolerance
/// relative to the largest entry of the input.
pub fn invert3(matrix: &Matrix3) -> Result<Matrix3> {
    let scale = matrix
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(MathError::SingularMatrix(
            "matrix is zero or non-finite".to_string(),
        ));
    }

    let mut a = *matrix;
    let mut inv = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for col in 0..3 {
        let pivot_row = (col..3)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot_row][col].abs() <= PIVOT_TOLERANCE * scale {
            return Err(MathError::SingularMatrix(format!(
                "pivot {} is below tolerance",
                col
            )));
        }

        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for k in 0..3 {
            a[col][k] /= pivot;
            inv[col][k] /= pivot;
        }

        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..3 {
                a[row][k] -= factor * a[col][k];
                inv[row][k] -= factor * inv[col][k];
            }
        }
    }

    Ok(inv)
}

/// Multiply a 3x3 matrix by a vector
pub fn mul_vec3(matrix: &Matrix3, v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (i, row) in matrix.iter().enumerate() {
        out[i] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}
