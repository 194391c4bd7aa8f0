//! Small dense linear algebra helpers.

use ndarray::Array2;

/// Pivots smaller than this (relative to the largest entry) count as zero.
const SINGULARITY_THRESHOLD: f64 = 1e-12;

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` when the matrix is not square or is numerically singular.
pub fn invert(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    if !matrix.is_square() {
        return None;
    }
    let n = matrix.nrows();
    let scale = matrix.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if n == 0 || scale == 0.0 || !scale.is_finite() {
        return None;
    }

    let mut work = matrix.clone();
    let mut inverse = Array2::<f64>::eye(n);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| {
            work[[a, col]]
                .abs()
                .total_cmp(&work[[b, col]].abs())
        })?;
        let pivot = work[[pivot_row, col]];
        if pivot.abs() <= SINGULARITY_THRESHOLD * scale {
            return None;
        }

        if pivot_row != col {
            for j in 0..n {
                work.swap([pivot_row, j], [col, j]);
                inverse.swap([pivot_row, j], [col, j]);
            }
        }

        for j in 0..n {
            work[[col, j]] /= pivot;
            inverse[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = work[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                let (w, v) = (work[[col, j]], inverse[[col, j]]);
                work[[row, j]] -= factor * w;
                inverse[[row, j]] -= factor * v;
            }
        }
    }

    Some(inverse)
}
