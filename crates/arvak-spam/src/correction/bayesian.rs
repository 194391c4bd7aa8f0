//! Iterative Bayesian unfolding.
//!
//! Starting from the uniform distribution, each step computes the predicted
//! observation `z = A'·t` and updates `t ← t ⊙ A'ᵀ·(p / z)`, where
//! `A'ᵢ = ε/dᵢ + (1-ε)·Aᵢ`. The stabilization parameter `ε` starts at zero
//! and is only raised (towards 1/2) when `z` would contain a zero, in which
//! case the step is retried. Every `A'ᵢ` stays column-stochastic, so each
//! update preserves total probability.

use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use super::{CorrectionMethod, CorrectionReport, ResolvedOptions};
use crate::error::{SpamError, SpamResult};
use crate::partition::Partition;
use crate::tensor::apply_kronecker;

/// Predicted probabilities at or below this are treated as zero.
const ZERO_FLOOR: f64 = f64::MIN_POSITIVE;

/// Upper limit the stabilization parameter approaches.
const STABILIZATION_TARGET: f64 = 0.5;

/// Fraction of the remaining distance to the target covered per bump.
const STABILIZATION_RATE: f64 = 0.01;

/// Bumps allowed before giving up; ε is within 1e-4 of the target long before.
const MAX_STABILIZATION_BUMPS: usize = 2000;

fn stabilize(matrices: &[Array2<f64>], epsilon: f64) -> Vec<Array2<f64>> {
    if epsilon == 0.0 {
        return matrices.to_vec();
    }
    matrices
        .iter()
        .map(|matrix| {
            let floor = epsilon / matrix.nrows() as f64;
            matrix.mapv(|a| floor + (1.0 - epsilon) * a)
        })
        .collect()
}

/// Run the iterative deconvolution until successive estimates differ by
/// less than `options.tol` in every entry, or `options.max_iterations` is hit.
pub fn correct(
    _partition: &Partition,
    matrices: &[Array2<f64>],
    probabilities: &Array1<f64>,
    options: &ResolvedOptions,
) -> SpamResult<(Array1<f64>, CorrectionReport)> {
    let size = probabilities.len();
    let mut estimate = Array1::from_elem(size, 1.0 / size as f64);
    let mut epsilon = 0.0;
    let mut bumps = 0;
    let mut iterations = 0;
    let mut converged = false;

    loop {
        if options.max_iterations.is_some_and(|max| iterations >= max) {
            warn!(
                iterations,
                tol = options.tol,
                "Bayesian correction stopped at max_iterations before converging"
            );
            break;
        }

        let stabilized = stabilize(matrices, epsilon);
        let predicted = apply_kronecker(&stabilized, &estimate)?;

        if predicted.iter().any(|&z| z.abs() <= ZERO_FLOOR) {
            bumps += 1;
            if bumps > MAX_STABILIZATION_BUMPS {
                return Err(SpamError::StabilizationFailed(bumps - 1));
            }
            epsilon = (1.0 - STABILIZATION_RATE) * epsilon
                + STABILIZATION_RATE * STABILIZATION_TARGET;
            debug!(epsilon, iteration = iterations, "Raised Bayesian stabilization");
            continue;
        }

        let transposed: Vec<Array2<f64>> = stabilized.iter().map(|m| m.t().to_owned()).collect();
        let ratio = probabilities / &predicted;
        let next = &estimate * &apply_kronecker(&transposed, &ratio)?;

        let delta = (&next - &estimate)
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        estimate = next;
        iterations += 1;

        if delta < options.tol {
            converged = true;
            debug!(iterations, delta, "Bayesian correction converged");
            break;
        }
    }

    Ok((
        estimate,
        CorrectionReport {
            method: CorrectionMethod::Bayesian,
            iterations,
            converged,
            stabilization: epsilon,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::QubitId;
    use ndarray::array;

    fn single() -> Partition {
        Partition::new([vec![QubitId(0)]]).unwrap()
    }

    #[test]
    fn test_identity_channel_converges_to_observation() {
        let a = Array2::eye(2);
        let p = array![0.3, 0.7];
        let options = ResolvedOptions {
            tol: 1e-12,
            max_iterations: Some(10),
        };
        let (est, report) = correct(&single(), &[a], &p, &options).unwrap();
        assert!((est[0] - 0.3).abs() < 1e-12);
        assert!(report.converged);
        assert_eq!(report.stabilization, 0.0);
    }

    #[test]
    fn test_max_iterations_caps_loop() {
        let a = array![[0.9, 0.2], [0.1, 0.8]];
        let p = array![0.8, 0.2];
        let options = ResolvedOptions {
            tol: 1e-300,
            max_iterations: Some(3),
        };
        let (est, report) = correct(&single(), &[a], &p, &options).unwrap();
        assert_eq!(report.iterations, 3);
        assert!(!report.converged);
        assert!((est.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_prediction_triggers_stabilization() {
        // Column 0 and column 1 both put no weight on outcome 1.
        let a = array![[1.0, 1.0], [0.0, 0.0]];
        let p = array![1.0, 0.0];
        let options = ResolvedOptions {
            tol: 1e-9,
            max_iterations: Some(500),
        };
        let (est, report) = correct(&single(), &[a], &p, &options).unwrap();
        assert!(report.stabilization > 0.0);
        assert!(est.iter().all(|p| p.is_finite() && *p >= 0.0));
        assert!((est.sum() - 1.0).abs() < 1e-9);
    }
}
