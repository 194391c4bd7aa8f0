//! Correction strategies.
//!
//! Each strategy maps a canonical-order probability vector of observed
//! outcomes to an estimate of the noise-free distribution, given one
//! confusion matrix per correlation group.

pub mod bayesian;
pub mod invert;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{SpamError, SpamResult};
use crate::partition::Partition;

/// Available correction algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionMethod {
    /// Apply the exact inverse of every confusion matrix, then clamp.
    #[default]
    Invert,
    /// Iterative Bayesian unfolding.
    Bayesian,
}

impl CorrectionMethod {
    /// Lowercase method name.
    pub fn name(self) -> &'static str {
        match self {
            CorrectionMethod::Invert => "invert",
            CorrectionMethod::Bayesian => "bayesian",
        }
    }

    /// Run this strategy.
    pub fn apply(
        self,
        partition: &Partition,
        matrices: &[Array2<f64>],
        probabilities: &Array1<f64>,
        options: &ResolvedOptions,
    ) -> SpamResult<(Array1<f64>, CorrectionReport)> {
        match self {
            CorrectionMethod::Invert => invert::correct(partition, matrices, probabilities, options),
            CorrectionMethod::Bayesian => {
                bayesian::correct(partition, matrices, probabilities, options)
            }
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrectionMethod {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invert" => Ok(CorrectionMethod::Invert),
            "bayesian" => Ok(CorrectionMethod::Bayesian),
            _ => Err(SpamError::UnknownMethod(s.to_string())),
        }
    }
}

/// Caller-tunable correction options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOptions {
    /// Bayesian convergence threshold; defaults to `1 / total_counts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tol: Option<f64>,
    /// Iteration cap for the Bayesian method; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
}

impl CorrectionOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the convergence threshold.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Fill in defaults that depend on the total number of counts.
    pub fn resolve(&self, total_counts: f64) -> SpamResult<ResolvedOptions> {
        let tol = match self.tol {
            Some(tol) if tol.is_finite() && tol > 0.0 => tol,
            Some(tol) => {
                return Err(SpamError::InvalidOption(format!(
                    "tol must be a positive finite number, got {tol}"
                )));
            }
            None => 1.0 / total_counts,
        };
        Ok(ResolvedOptions {
            tol,
            max_iterations: self.max_iterations,
        })
    }
}

/// Options with every default resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    /// Convergence threshold on the largest per-entry change.
    pub tol: f64,
    /// Iteration cap, if any.
    pub max_iterations: Option<usize>,
}

/// Diagnostics from one correction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    /// Strategy that produced the result.
    pub method: CorrectionMethod,
    /// Number of completed update steps.
    pub iterations: usize,
    /// Whether the convergence threshold was met.
    pub converged: bool,
    /// Final stabilization parameter (always 0 for `invert`).
    pub stabilization: f64,
}
