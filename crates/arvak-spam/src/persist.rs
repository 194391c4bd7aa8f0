//! Serializable calibration state.
//!
//! The exported form is plain nested data: per group its qubits and confusion
//! matrix (`null` before estimation), and per calibration circuit the basis
//! state prepared on each group, keyed by the group's qubit list.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::bits::{format_bitstring, parse_bitstring};
use crate::calibration::SpamCalibration;
use crate::error::{SpamError, SpamResult};
use crate::generator::{MAX_GROUP_SIZE, PreparedStateRecord};
use crate::partition::Partition;
use crate::qubit::QubitId;

/// Column sums may deviate from one by at most this much on import.
const COLUMN_SUM_TOLERANCE: f64 = 1e-6;

/// One correlation group and its confusion matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    /// Qubits of the group, in measurement order.
    pub qubits: Vec<QubitId>,
    /// Row-major confusion matrix, absent until estimated.
    #[serde(default)]
    pub matrix: Option<Vec<Vec<f64>>>,
}

/// The basis state one circuit prepared on one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedEntry {
    /// Qubits of the group.
    pub qubits: Vec<QubitId>,
    /// Prepared bit pattern, e.g. `"01"`.
    pub state: String,
}

/// Complete persisted form of a [`SpamCalibration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Groups, largest first.
    pub groups: Vec<GroupState>,
    /// One list of entries per calibration circuit, in circuit order.
    #[serde(default)]
    pub prepared_states: Vec<Vec<PreparedEntry>>,
}

impl SpamCalibration {
    /// Export to plain data.
    pub fn to_state(&self) -> CalibrationState {
        let matrices = self.confusion_matrices().ok();
        let groups = self
            .partition()
            .groups()
            .iter()
            .enumerate()
            .map(|(g, group)| GroupState {
                qubits: group.qubits().to_vec(),
                matrix: matrices.map(|m| m[g].outer_iter().map(|row| row.to_vec()).collect()),
            })
            .collect();

        let prepared_states = self
            .prepared_states()
            .iter()
            .map(|record| {
                self.partition()
                    .groups()
                    .iter()
                    .zip(record.states())
                    .map(|(group, state)| PreparedEntry {
                        qubits: group.qubits().to_vec(),
                        state: format_bitstring(state),
                    })
                    .collect()
            })
            .collect();

        CalibrationState {
            groups,
            prepared_states,
        }
    }

    /// Rebuild from plain data, validating it on the way.
    pub fn from_state(state: CalibrationState) -> SpamResult<Self> {
        let mut groups = state.groups;
        groups.sort_by(|a, b| b.qubits.len().cmp(&a.qubits.len()));

        let partition = Partition::new(groups.iter().map(|g| g.qubits.clone()))?;
        if partition.largest_group_size() > MAX_GROUP_SIZE {
            return Err(SpamError::TooManyQubits {
                num_qubits: partition.largest_group_size(),
                max: MAX_GROUP_SIZE,
            });
        }

        let present = groups.iter().filter(|g| g.matrix.is_some()).count();
        let matrices = match present {
            0 => None,
            n if n == groups.len() => Some(
                groups
                    .iter()
                    .zip(partition.groups())
                    .map(|(g, group)| matrix_from_rows(&g.qubits, g.matrix.as_deref(), group.dim()))
                    .collect::<SpamResult<Vec<_>>>()?,
            ),
            _ => {
                return Err(SpamError::InvalidState(
                    "either every group or no group must carry a matrix".into(),
                ));
            }
        };

        let records = state
            .prepared_states
            .iter()
            .enumerate()
            .map(|(circuit, entries)| record_from_entries(&partition, circuit, entries))
            .collect::<SpamResult<Vec<_>>>()?;

        Ok(Self::from_parts(partition, records, matrices))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> SpamResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_state())?)
    }

    /// Parse from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> SpamResult<Self> {
        Self::from_state(serde_json::from_str(json)?)
    }
}

fn matrix_from_rows(
    qubits: &[QubitId],
    rows: Option<&[Vec<f64>]>,
    dim: usize,
) -> SpamResult<Array2<f64>> {
    let label = qubits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let rows = rows.unwrap_or_default();
    if rows.len() != dim || rows.iter().any(|row| row.len() != dim) {
        return Err(SpamError::InvalidState(format!(
            "matrix of group [{label}] must be {dim}x{dim}"
        )));
    }

    let matrix = Array2::from_shape_fn((dim, dim), |(i, j)| rows[i][j]);
    if matrix.iter().any(|&x| !x.is_finite() || x < 0.0) {
        return Err(SpamError::InvalidState(format!(
            "matrix of group [{label}] has negative or non-finite entries"
        )));
    }
    for (j, column) in matrix.columns().into_iter().enumerate() {
        if (column.sum() - 1.0).abs() > COLUMN_SUM_TOLERANCE {
            return Err(SpamError::InvalidState(format!(
                "column {j} of group [{label}] does not sum to 1"
            )));
        }
    }
    Ok(matrix)
}

fn record_from_entries(
    partition: &Partition,
    circuit: usize,
    entries: &[PreparedEntry],
) -> SpamResult<PreparedStateRecord> {
    if entries.len() != partition.len() {
        return Err(SpamError::InvalidState(format!(
            "circuit {circuit} records {} groups, expected {}",
            entries.len(),
            partition.len()
        )));
    }

    let mut states = vec![None; partition.len()];
    for entry in entries {
        let g = partition
            .groups()
            .iter()
            .position(|group| group.qubits() == entry.qubits.as_slice())
            .ok_or_else(|| {
                SpamError::InvalidState(format!(
                    "circuit {circuit} names a group that is not in the partition"
                ))
            })?;
        let bits = parse_bitstring(&entry.state)?;
        if bits.len() != entry.qubits.len() {
            return Err(SpamError::BitstringWidth {
                bitstring: entry.state.clone(),
                got: bits.len(),
                expected: entry.qubits.len(),
            });
        }
        if states[g].replace(bits).is_some() {
            return Err(SpamError::InvalidState(format!(
                "circuit {circuit} records group {g} twice"
            )));
        }
    }

    Ok(PreparedStateRecord::new(states.into_iter().flatten().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::Counts;

    fn calibrated() -> SpamCalibration {
        let mut cal = SpamCalibration::new([vec![QubitId(0)], vec![QubitId(1)]]).unwrap();
        cal.calibration_circuits().unwrap();
        cal.estimate(&[
            Counts::from([("00", 90.0), ("10", 5.0), ("01", 5.0)]),
            Counts::from([("11", 80.0), ("01", 10.0), ("10", 10.0)]),
        ])
        .unwrap();
        cal
    }

    #[test]
    fn test_state_round_trip() {
        let cal = calibrated();
        let restored = SpamCalibration::from_json(&cal.to_json().unwrap()).unwrap();
        assert_eq!(restored.to_state(), cal.to_state());
        assert_eq!(restored.prepared_states(), cal.prepared_states());
    }

    #[test]
    fn test_uncalibrated_plan_round_trip() {
        let mut cal = SpamCalibration::new([vec![QubitId(3), QubitId(4)]]).unwrap();
        cal.calibration_circuits().unwrap();
        let state = cal.to_state();
        assert!(state.groups[0].matrix.is_none());
        assert_eq!(state.prepared_states.len(), 4);
        assert_eq!(state.prepared_states[2][0].state, "10");

        let restored = SpamCalibration::from_state(state).unwrap();
        assert!(!restored.is_calibrated());
        assert_eq!(restored.prepared_states().len(), 4);
    }

    #[test]
    fn test_overlap_rejected_on_import() {
        let mut state = calibrated().to_state();
        state.groups[1].qubits = state.groups[0].qubits.clone();
        assert!(matches!(
            SpamCalibration::from_state(state),
            Err(SpamError::OverlappingGroups { .. })
        ));
    }

    #[test]
    fn test_bad_matrix_rejected_on_import() {
        let mut state = calibrated().to_state();
        if let Some(rows) = state.groups[0].matrix.as_mut() {
            rows[0][0] += 0.5;
        }
        assert!(matches!(
            SpamCalibration::from_state(state),
            Err(SpamError::InvalidState(_))
        ));
    }

    #[test]
    fn test_unknown_group_in_record_rejected() {
        let mut state = calibrated().to_state();
        state.prepared_states[0][0].qubits = vec![QubitId(9)];
        assert!(SpamCalibration::from_state(state).is_err());
    }

    #[test]
    fn test_oversized_group_rejected() {
        let state = CalibrationState {
            groups: vec![GroupState {
                qubits: (0..=MAX_GROUP_SIZE as u32).map(QubitId).collect(),
                matrix: None,
            }],
            prepared_states: vec![],
        };
        assert!(matches!(
            SpamCalibration::from_state(state),
            Err(SpamError::TooManyQubits { max: MAX_GROUP_SIZE, .. })
        ));
    }
}
