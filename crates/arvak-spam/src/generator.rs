//! Calibration circuit generation.
//!
//! One circuit is produced per basis state of the largest group. Every other
//! group is prepared in the prefix of that same bit pattern, so `2^D` circuits
//! (`D` = largest group size) cover every basis state of every group, but not
//! every joint combination of group states.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bits::{BasisState, basis_state_to_index, index_to_basis_state};
use crate::circuit::CalibrationCircuit;
use crate::error::{SpamError, SpamResult};
use crate::partition::Partition;

/// Largest group size the generator accepts.
pub const MAX_GROUP_SIZE: usize = 16;

/// The basis state prepared on each group by one calibration circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedStateRecord {
    states: Vec<BasisState>,
}

impl PreparedStateRecord {
    /// Create a record from per-group states, in partition group order.
    pub fn new(states: Vec<BasisState>) -> Self {
        Self { states }
    }

    /// Prepared state of `group`.
    pub fn state(&self, group: usize) -> Option<&[bool]> {
        self.states.get(group).map(Vec::as_slice)
    }

    /// Prepared state of `group` as an integer index.
    pub fn index(&self, group: usize) -> Option<usize> {
        self.state(group).map(basis_state_to_index)
    }

    /// All per-group states.
    pub fn states(&self) -> &[BasisState] {
        &self.states
    }
}

/// Produce the calibration circuits for `partition`, each paired with the
/// states it prepares.
///
/// The circuits measure every calibrated qubit in canonical order. Results
/// must later be supplied in the same order as returned here.
pub fn generate_circuits(
    partition: &Partition,
) -> SpamResult<Vec<(CalibrationCircuit, PreparedStateRecord)>> {
    let major_width = partition.largest_group_size();
    if major_width > MAX_GROUP_SIZE {
        return Err(SpamError::TooManyQubits {
            num_qubits: major_width,
            max: MAX_GROUP_SIZE,
        });
    }

    let device_width = match partition.max_qubit() {
        Some(qubit) => qubit
            .0
            .checked_add(1)
            .ok_or(SpamError::QubitOutOfRange {
                qubit,
                width: u32::MAX,
            })?,
        None => 0,
    };
    let measured: Vec<_> = partition.canonical_qubits().collect();

    let mut circuits = Vec::with_capacity(1 << major_width);
    for major_index in 0..(1usize << major_width) {
        let major_state = index_to_basis_state(major_index, major_width)?;
        let mut circuit = CalibrationCircuit::new(
            format!("spam_cal_{major_index}"),
            device_width,
            measured.clone(),
        )?;

        let mut states = Vec::with_capacity(partition.len());
        for group in partition.groups() {
            let state = major_state[..group.len()].to_vec();
            for (&qubit, &flip) in group.qubits().iter().zip(&state) {
                if flip {
                    circuit.x(qubit)?;
                }
            }
            states.push(state);
        }
        circuits.push((circuit, PreparedStateRecord::new(states)));
    }

    info!(
        groups = partition.len(),
        qubits = partition.num_qubits(),
        circuits = circuits.len(),
        "Generated SPAM calibration circuits"
    );
    Ok(circuits)
}
