//! Arvak SPAM Calibration and Correction
//!
//! This crate estimates state-preparation-and-measurement (SPAM) noise for a
//! multi-qubit device and corrects measured outcome counts against it.
//!
//! # Overview
//!
//! Qubits are partitioned into *correlation groups*: readout errors may be
//! correlated inside a group but are independent across groups. Each group
//! gets its own column-stochastic confusion matrix, and the noise on the full
//! register is modelled as their Kronecker product. That product is never
//! materialized; [`tensor::apply_kronecker`] applies it one group axis at a
//! time.
//!
//! ```text
//!   groups ──▶ calibration_circuits() ──▶ (run on backend) ──▶ estimate()
//!                                                                  │
//!   measured counts ─────────────────────────────────────▶ correct() ──▶ corrected counts
//! ```
//!
//! # Core Components
//!
//! - **Codec**: [`bits`] converts bit tuples, integers and bit-pattern strings
//!   and permutes bit positions between device and canonical order
//! - **Tensor primitives**: [`tensor`] unfolds/refolds flat vectors and applies
//!   Kronecker-structured operators
//! - **Circuit generation**: [`generate_circuits`] prepares `2^D` basis-state
//!   circuits, `D` being the largest group size
//! - **Estimation**: [`estimate`] builds one confusion matrix per group
//! - **Correction**: [`CorrectionMethod::Invert`] and
//!   [`CorrectionMethod::Bayesian`]
//! - **Persistence**: [`CalibrationState`] round-trips a calibration through
//!   plain data
//!
//! # Example
//!
//! ```rust
//! use arvak_spam::{CorrectionMethod, CorrectionOptions, Counts, QubitId, SpamCalibration};
//!
//! let mut cal = SpamCalibration::new([vec![QubitId(0)], vec![QubitId(1)]]).unwrap();
//! let circuits = cal.calibration_circuits().unwrap();
//! assert_eq!(circuits.len(), 2);
//!
//! // Counts returned by the backend for each circuit, in order.
//! cal.estimate(&[
//!     Counts::from([("00", 950.0), ("01", 30.0), ("10", 20.0)]),
//!     Counts::from([("11", 900.0), ("01", 60.0), ("10", 40.0)]),
//! ])
//! .unwrap();
//!
//! let noisy = Counts::from([("00", 480.0), ("11", 440.0), ("01", 50.0), ("10", 30.0)]);
//! let corrected = cal
//!     .correct(
//!         &noisy,
//!         &cal.canonical_results_map(),
//!         CorrectionMethod::Invert,
//!         &CorrectionOptions::new(),
//!     )
//!     .unwrap();
//! assert!((corrected.total() - 1000.0).abs() < 1e-6);
//! ```

pub mod bits;
pub mod calibration;
pub mod circuit;
pub mod correction;
pub mod counts;
pub mod error;
pub mod generator;
pub mod linalg;
pub mod partition;
pub mod persist;
pub mod qubit;
pub mod tensor;

pub use bits::{
    BasisState, BitPermutation, basis_state_to_index, format_bitstring, index_to_basis_state,
    parse_bitstring, permute,
};
pub use calibration::{MAX_CORRECTION_QUBITS, ResultsMap, SpamCalibration, estimate};
pub use circuit::CalibrationCircuit;
pub use correction::{CorrectionMethod, CorrectionOptions, CorrectionReport, ResolvedOptions};
pub use counts::Counts;
pub use error::{ErrorKind, SpamError, SpamResult};
pub use generator::{PreparedStateRecord, generate_circuits};
pub use partition::{CorrelationGroup, GroupSlot, Partition};
pub use persist::{CalibrationState, GroupState, PreparedEntry};
pub use qubit::QubitId;
pub use tensor::{apply_kronecker, refold, unfold};
