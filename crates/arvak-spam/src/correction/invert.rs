//! Direct inversion.

use ndarray::{Array1, Array2};

use super::{CorrectionMethod, CorrectionReport, ResolvedOptions};
use crate::error::{SpamError, SpamResult};
use crate::linalg;
use crate::partition::Partition;
use crate::tensor::apply_kronecker;

/// Apply the Kronecker product of the inverse confusion matrices, clamp
/// negative probabilities to zero and renormalize.
pub fn correct(
    partition: &Partition,
    matrices: &[Array2<f64>],
    probabilities: &Array1<f64>,
    _options: &ResolvedOptions,
) -> SpamResult<(Array1<f64>, CorrectionReport)> {
    let inverses = partition
        .groups()
        .iter()
        .zip(matrices)
        .map(|(group, matrix)| {
            linalg::invert(matrix).ok_or_else(|| SpamError::SingularMatrix {
                group: group.qubits().to_vec(),
            })
        })
        .collect::<SpamResult<Vec<_>>>()?;

    let mut estimate = apply_kronecker(&inverses, probabilities)?;
    estimate.mapv_inplace(|p| p.max(0.0));

    let mass = estimate.sum();
    if !(mass.is_finite() && mass > 0.0) {
        return Err(SpamError::DegenerateCorrection);
    }
    estimate /= mass;

    Ok((
        estimate,
        CorrectionReport {
            method: CorrectionMethod::Invert,
            iterations: 1,
            converged: true,
            stabilization: 0.0,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::QubitId;
    use ndarray::array;

    fn single(n: u32) -> Partition {
        Partition::new([(0..n).map(QubitId).collect::<Vec<_>>()]).unwrap()
    }

    fn options() -> ResolvedOptions {
        ResolvedOptions {
            tol: 1e-6,
            max_iterations: None,
        }
    }

    #[test]
    fn test_recovers_point_mass() {
        let a = array![[0.9, 0.2], [0.1, 0.8]];
        let noisy = a.column(0).to_owned();
        let (est, report) = correct(&single(1), &[a], &noisy, &options()).unwrap();
        assert!((est[0] - 1.0).abs() < 1e-12);
        assert!(est[1].abs() < 1e-12);
        assert!(report.converged);
    }

    #[test]
    fn test_clamps_negative_mass() {
        // Observed distribution outside the image of the simplex.
        let a = array![[0.6, 0.4], [0.4, 0.6]];
        let noisy = array![0.95, 0.05];
        let (est, _) = correct(&single(1), &[a], &noisy, &options()).unwrap();
        assert!(est.iter().all(|&p| p >= 0.0));
        assert!((est.sum() - 1.0).abs() < 1e-12);
        assert_eq!(est[1], 0.0);
    }

    #[test]
    fn test_singular_reports_group() {
        let a = array![[0.5, 0.5], [0.5, 0.5]];
        let err = correct(&single(1), &[a], &array![0.5, 0.5], &options()).unwrap_err();
        assert!(matches!(err, SpamError::SingularMatrix { ref group } if group == &[QubitId(0)]));
    }
}
