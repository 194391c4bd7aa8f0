//! Kronecker-structured matrix application.
//!
//! A probability vector over `N` qubits split into groups of `k₁, k₂, …`
//! qubits is treated as a tensor of shape `[2^k₁, 2^k₂, …]` in row-major
//! order, so axis 0 holds the most significant bits. Applying
//! `A₁ ⊗ A₂ ⊗ …` then reduces to one small matrix product per axis:
//!
//! ```text
//!   v ──unfold(mode 0)──▶ A₁ · V₍₀₎ ──refold──▶ … ──unfold(mode m-1)──▶ Aₘ · V₍ₘ₋₁₎ ──refold──▶ result
//! ```
//!
//! which costs `O(Σ dᵢ² · Π dⱼ)` instead of `O((Π dᵢ)²)`.

use ndarray::{Array1, Array2, ArrayView1, IxDyn};

use crate::error::{SpamError, SpamResult};

/// Axis order that brings `mode` to the front, keeping the rest in order.
fn front_axes(mode: usize, ndim: usize) -> Vec<usize> {
    std::iter::once(mode)
        .chain((0..ndim).filter(|&axis| axis != mode))
        .collect()
}

fn check_len(len: usize, dims: &[usize]) -> SpamResult<()> {
    let expected: usize = dims.iter().product();
    if len != expected {
        return Err(SpamError::DimensionMismatch { expected, got: len });
    }
    Ok(())
}

/// Mode-`mode` matricization of a flat tensor with shape `dims`.
///
/// The result has `dims[mode]` rows; columns enumerate the remaining axes in
/// their original row-major order.
pub fn unfold(tensor: ArrayView1<'_, f64>, mode: usize, dims: &[usize]) -> SpamResult<Array2<f64>> {
    check_len(tensor.len(), dims)?;
    if mode >= dims.len() {
        return Err(SpamError::DimensionMismatch {
            expected: dims.len(),
            got: mode,
        });
    }
    let rows = dims[mode];
    let cols = tensor.len() / rows.max(1);

    let shaped = tensor.to_shape(IxDyn(dims))?;
    let moved = shaped.permuted_axes(IxDyn(&front_axes(mode, dims.len())));
    Ok(moved.to_shape((rows, cols))?.into_owned())
}

/// Inverse of [`unfold`]: turn a mode-`mode` matricization back into a flat tensor.
pub fn refold(matrix: &Array2<f64>, mode: usize, dims: &[usize]) -> SpamResult<Array1<f64>> {
    check_len(matrix.len(), dims)?;
    if mode >= dims.len() || matrix.nrows() != dims[mode] {
        return Err(SpamError::DimensionMismatch {
            expected: dims.get(mode).copied().unwrap_or(0),
            got: matrix.nrows(),
        });
    }
    let axes = front_axes(mode, dims.len());
    let moved_dims: Vec<usize> = axes.iter().map(|&axis| dims[axis]).collect();

    // front_axes puts `mode` at 0 and shifts the axes before it up by one.
    let restore: Vec<usize> = (0..dims.len())
        .map(|axis| match axis.cmp(&mode) {
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => axis + 1,
            std::cmp::Ordering::Greater => axis,
        })
        .collect();

    let shaped = matrix.to_shape(IxDyn(&moved_dims))?;
    let restored = shaped.permuted_axes(IxDyn(&restore));
    Ok(restored.iter().copied().collect())
}

/// Compute `(A₁ ⊗ … ⊗ Aₘ) · v` without forming the full product matrix.
///
/// Every matrix must be square and the product of their dimensions must equal
/// the length of `vector`.
pub fn apply_kronecker(matrices: &[Array2<f64>], vector: &Array1<f64>) -> SpamResult<Array1<f64>> {
    let mut dims = Vec::with_capacity(matrices.len());
    for matrix in matrices {
        if !matrix.is_square() {
            return Err(SpamError::DimensionMismatch {
                expected: matrix.nrows(),
                got: matrix.ncols(),
            });
        }
        dims.push(matrix.nrows());
    }
    check_len(vector.len(), &dims)?;

    let mut current = vector.clone();
    for (mode, matrix) in matrices.iter().enumerate() {
        let unfolded = unfold(current.view(), mode, &dims)?;
        current = refold(&matrix.dot(&unfolded), mode, &dims)?;
    }
    Ok(current)
}
