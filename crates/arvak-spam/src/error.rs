//! Error types for the SPAM crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Coarse classification of a [`SpamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The partition, results map, method or options are unusable.
    Configuration,
    /// A numerical operation cannot be carried out (e.g. a singular matrix).
    Numerical,
    /// The calibration data does not cover every prepared basis state.
    CalibrationInsufficiency,
}

/// Errors that can occur while calibrating or correcting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpamError {
    /// No correlation groups were supplied.
    #[error("Partition must contain at least one correlation group")]
    EmptyPartition,

    /// A correlation group contains no qubits.
    #[error("Correlation group {index} is empty")]
    EmptyGroup {
        /// Position of the group in the supplied list.
        index: usize,
    },

    /// A qubit appears in more than one group (or twice in one group).
    #[error("Qubit {qubit} appears in more than one correlation group")]
    OverlappingGroups {
        /// The repeated qubit.
        qubit: QubitId,
    },

    /// The partition is too wide for a dense 2^N distribution.
    #[error("Cannot correct over {num_qubits} qubits, at most {max} are supported")]
    TooManyQubits {
        /// Total number of calibrated qubits.
        num_qubits: usize,
        /// Largest supported total.
        max: usize,
    },

    /// The results map does not cover exactly the calibrated qubits.
    #[error(
        "Results map does not match calibrated qubits (missing: {}, unexpected: {})",
        format_qubits(.missing),
        format_qubits(.unexpected)
    )]
    ResultsMapMismatch {
        /// Calibrated qubits absent from the map.
        missing: Vec<QubitId>,
        /// Mapped qubits that were never calibrated.
        unexpected: Vec<QubitId>,
    },

    /// The results map places a qubit outside the bit pattern, or two qubits on one bit.
    #[error("Results map puts qubit {qubit} at invalid bit position {position} (width {width})")]
    InvalidBitPosition {
        /// The offending qubit.
        qubit: QubitId,
        /// The position it was mapped to.
        position: usize,
        /// Width of the bit pattern.
        width: usize,
    },

    /// The requested correction method is not known.
    #[error("Unknown correction method '{0}' (expected 'invert' or 'bayesian')")]
    UnknownMethod(String),

    /// A correction option is out of range.
    #[error("Invalid correction option: {0}")]
    InvalidOption(String),

    /// Calibration circuits have not been generated yet.
    #[error("No calibration circuits have been generated for this calibration")]
    CircuitsNotGenerated,

    /// The calibration matrices have not been estimated yet.
    #[error("Calibration has not been estimated; run estimate() first")]
    NotCalibrated,

    /// The number of result maps does not match the number of calibration circuits.
    #[error("Expected {expected} calibration results (one per circuit), got {got}")]
    CountsMismatch {
        /// Number of calibration circuits.
        expected: usize,
        /// Number of result maps supplied.
        got: usize,
    },

    /// A bit-pattern key contains something other than `0` and `1`.
    #[error("Invalid bit pattern '{0}'")]
    InvalidBitstring(String),

    /// A bit-pattern key has the wrong number of bits.
    #[error("Bit pattern '{bitstring}' has {got} bits, expected {expected}")]
    BitstringWidth {
        /// The offending key.
        bitstring: String,
        /// Number of bits found.
        got: usize,
        /// Number of calibrated qubits.
        expected: usize,
    },

    /// The counts to correct are empty or sum to zero.
    #[error("Counts are empty or sum to zero")]
    EmptyCounts,

    /// An integer does not fit in the requested number of bits.
    #[error("Value {value} does not fit in {width} bits")]
    IndexOutOfRange {
        /// The value being decoded.
        value: usize,
        /// The requested width.
        width: usize,
    },

    /// Matrix and vector dimensions disagree.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// A circuit operation references a qubit outside the device width.
    #[error("Qubit {qubit} is outside the circuit width {width}")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Circuit width.
        width: u32,
    },

    /// A qubit would be flipped twice in one calibration circuit.
    #[error("Qubit {0} is already flipped in this circuit")]
    DuplicateFlip(QubitId),

    /// Persisted calibration state is inconsistent.
    #[error("Invalid calibration state: {0}")]
    InvalidState(String),

    /// A confusion matrix cannot be inverted.
    #[error("Confusion matrix for group [{}] is singular", format_qubits(.group))]
    SingularMatrix {
        /// Qubits of the offending group.
        group: Vec<QubitId>,
    },

    /// The corrected distribution has no positive mass left after clamping.
    #[error("Corrected distribution has no positive probability mass")]
    DegenerateCorrection,

    /// The Bayesian stabilization parameter could not avoid a zero denominator.
    #[error("Bayesian correction could not be stabilized after {0} attempts")]
    StabilizationFailed(usize),

    /// A prepared basis state was never observed during calibration.
    #[error("Basis state |{state}> of group [{}] was never observed in calibration data", format_qubits(.group))]
    UnobservedState {
        /// Qubits of the group.
        group: Vec<QubitId>,
        /// The prepared basis state that has no counts.
        state: String,
    },

    /// Array reshape failed.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpamError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpamError::SingularMatrix { .. }
            | SpamError::DegenerateCorrection
            | SpamError::StabilizationFailed(_) => ErrorKind::Numerical,
            SpamError::UnobservedState { .. } => ErrorKind::CalibrationInsufficiency,
            _ => ErrorKind::Configuration,
        }
    }
}

fn format_qubits(qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for SPAM operations.
pub type SpamResult<T> = Result<T, SpamError>;
