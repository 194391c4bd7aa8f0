//! Confusion-matrix estimation and the calibration object.

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::bits::{
    BitPermutation, basis_state_to_index, format_bitstring, index_to_basis_state,
    parse_bitstring,
};
use crate::circuit::CalibrationCircuit;
use crate::correction::{CorrectionMethod, CorrectionOptions, CorrectionReport};
use crate::counts::Counts;
use crate::error::{SpamError, SpamResult};
use crate::generator::{PreparedStateRecord, generate_circuits};
use crate::partition::{CorrelationGroup, Partition};
use crate::qubit::QubitId;
use crate::tensor::apply_kronecker;

/// Widest partition a dense `2^N` distribution is built for.
///
/// At 30 qubits one `f64` vector already takes 8 GiB. On targets with a
/// narrower `usize` the limit shrinks so that `2^N · size_of::<f64>()` still
/// fits in `isize`.
pub const MAX_CORRECTION_QUBITS: usize = {
    let addressable = usize::BITS as usize - 5;
    if addressable < 30 { addressable } else { 30 }
};

/// Maps each calibrated qubit to its bit position in an external bit pattern.
pub type ResultsMap = BTreeMap<QubitId, usize>;

/// Estimate one column-stochastic confusion matrix per group.
///
/// `results[i]` holds the outcome counts of the circuit that prepared
/// `records[i]`. Bit patterns are split left to right into per-group
/// sub-patterns in partition order. Entry `[measured, prepared]` accumulates
/// counts before each column is normalized by its sum.
pub fn estimate(
    partition: &Partition,
    records: &[PreparedStateRecord],
    results: &[Counts],
) -> SpamResult<Vec<Array2<f64>>> {
    if records.is_empty() {
        return Err(SpamError::CircuitsNotGenerated);
    }
    if records.len() != results.len() {
        return Err(SpamError::CountsMismatch {
            expected: records.len(),
            got: results.len(),
        });
    }

    let width = partition.num_qubits();
    let mut matrices: Vec<Array2<f64>> = partition
        .dims()
        .into_iter()
        .map(|dim| Array2::zeros((dim, dim)))
        .collect();

    for (record, counts) in records.iter().zip(results) {
        for (bitstring, count) in counts.iter() {
            let bits = parse_bitstring(bitstring)?;
            if bits.len() != width {
                return Err(SpamError::BitstringWidth {
                    bitstring: bitstring.to_string(),
                    got: bits.len(),
                    expected: width,
                });
            }

            let mut offset = 0;
            for (g, group) in partition.groups().iter().enumerate() {
                let measured = basis_state_to_index(&bits[offset..offset + group.len()]);
                let prepared = record.index(g).ok_or_else(|| {
                    SpamError::InvalidState(format!("prepared-state record is missing group {g}"))
                })?;
                matrices[g][[measured, prepared]] += count;
                offset += group.len();
            }
        }
    }

    for (group, matrix) in partition.groups().iter().zip(matrices.iter_mut()) {
        for (prepared, mut column) in matrix.columns_mut().into_iter().enumerate() {
            let total = column.sum();
            if total <= 0.0 {
                return Err(SpamError::UnobservedState {
                    group: group.qubits().to_vec(),
                    state: format_bitstring(&index_to_basis_state(prepared, group.len())?),
                });
            }
            column /= total;
        }
    }

    Ok(matrices)
}

/// SPAM calibration for one partition of qubits.
///
/// Lifecycle: construct from groups, generate the calibration circuits, run
/// them externally, [`estimate`](Self::estimate) from the returned counts,
/// then [`correct`](Self::correct) any number of results. The matrices are
/// read-only after estimation; re-estimating replaces them wholesale.
#[derive(Debug, Clone)]
pub struct SpamCalibration {
    partition: Partition,
    records: Vec<PreparedStateRecord>,
    matrices: Option<Vec<Array2<f64>>>,
}

impl SpamCalibration {
    /// Create a calibration over the given correlation groups.
    ///
    /// Fails if the groups overlap or any group is empty.
    pub fn new<G>(groups: impl IntoIterator<Item = G>) -> SpamResult<Self>
    where
        G: Into<CorrelationGroup>,
    {
        Ok(Self::from_partition(Partition::new(groups)?))
    }

    /// Create a calibration for an existing partition.
    pub fn from_partition(partition: Partition) -> Self {
        Self {
            partition,
            records: vec![],
            matrices: None,
        }
    }

    pub(crate) fn from_parts(
        partition: Partition,
        records: Vec<PreparedStateRecord>,
        matrices: Option<Vec<Array2<f64>>>,
    ) -> Self {
        Self {
            partition,
            records,
            matrices,
        }
    }

    /// The partition being calibrated.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Generate the calibration circuits and remember what each prepares.
    ///
    /// Any previous estimate is discarded.
    pub fn calibration_circuits(&mut self) -> SpamResult<Vec<CalibrationCircuit>> {
        let (circuits, records): (Vec<_>, Vec<_>) =
            generate_circuits(&self.partition)?.into_iter().unzip();
        self.records = records;
        self.matrices = None;
        Ok(circuits)
    }

    /// Prepared-state records, in circuit order.
    pub fn prepared_states(&self) -> &[PreparedStateRecord] {
        &self.records
    }

    /// Build the confusion matrices from per-circuit outcome counts.
    pub fn estimate(&mut self, results: &[Counts]) -> SpamResult<()> {
        let matrices = estimate(&self.partition, &self.records, results)?;
        info!(
            groups = matrices.len(),
            circuits = results.len(),
            "Estimated SPAM confusion matrices"
        );
        self.matrices = Some(matrices);
        Ok(())
    }

    /// Whether [`estimate`](Self::estimate) has run.
    pub fn is_calibrated(&self) -> bool {
        self.matrices.is_some()
    }

    /// All confusion matrices, in group order.
    pub fn confusion_matrices(&self) -> SpamResult<&[Array2<f64>]> {
        self.matrices.as_deref().ok_or(SpamError::NotCalibrated)
    }

    /// Confusion matrix of one group.
    pub fn confusion_matrix(&self, group: usize) -> SpamResult<&Array2<f64>> {
        self.confusion_matrices()?
            .get(group)
            .ok_or_else(|| SpamError::InvalidState(format!("no group with index {group}")))
    }

    /// Mean probability of reading back the prepared state, per group.
    pub fn readout_fidelities(&self) -> SpamResult<Vec<f64>> {
        Ok(self
            .confusion_matrices()?
            .iter()
            .map(|m| m.diag().mean().unwrap_or(0.0))
            .collect())
    }

    /// Probability that every calibrated qubit reads back its prepared value,
    /// averaged over all basis states.
    pub fn average_fidelity(&self) -> SpamResult<f64> {
        Ok(self.readout_fidelities()?.into_iter().product())
    }

    /// Apply the noise model to a canonical-order probability vector.
    pub fn noisy_distribution(&self, probabilities: &Array1<f64>) -> SpamResult<Array1<f64>> {
        apply_kronecker(self.confusion_matrices()?, probabilities)
    }

    /// Correct measured counts against the calibrated noise model.
    ///
    /// `results_map` gives the position of every calibrated qubit within the
    /// bit patterns of `counts`; it must cover exactly the calibrated qubits.
    pub fn correct(
        &self,
        counts: &Counts,
        results_map: &ResultsMap,
        method: CorrectionMethod,
        options: &CorrectionOptions,
    ) -> SpamResult<Counts> {
        self.correct_with_report(counts, results_map, method, options)
            .map(|(corrected, _)| corrected)
    }

    /// Like [`correct`](Self::correct), also returning run diagnostics.
    pub fn correct_with_report(
        &self,
        counts: &Counts,
        results_map: &ResultsMap,
        method: CorrectionMethod,
        options: &CorrectionOptions,
    ) -> SpamResult<(Counts, CorrectionReport)> {
        let matrices = self.confusion_matrices()?;
        let width = self.partition.num_qubits();
        if width > MAX_CORRECTION_QUBITS {
            return Err(SpamError::TooManyQubits {
                num_qubits: width,
                max: MAX_CORRECTION_QUBITS,
            });
        }
        let permutation = self.permutation(results_map)?;

        let mut observed = Array1::<f64>::zeros(1 << width);
        for (bitstring, count) in counts.iter() {
            let bits = parse_bitstring(bitstring)?;
            if bits.len() != width {
                return Err(SpamError::BitstringWidth {
                    bitstring: bitstring.to_string(),
                    got: bits.len(),
                    expected: width,
                });
            }
            observed[permutation.to_canonical(basis_state_to_index(&bits))] += count;
        }

        let total = observed.sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(SpamError::EmptyCounts);
        }
        let resolved = options.resolve(total)?;
        debug!(%method, qubits = width, total, "Correcting SPAM errors");

        let (estimate, report) =
            method.apply(&self.partition, matrices, &(observed / total), &resolved)?;

        let mut corrected = Counts::new();
        for (canonical, &p) in estimate.iter().enumerate() {
            if p != 0.0 {
                let external = permutation.to_external(canonical);
                corrected.insert(
                    format_bitstring(&index_to_basis_state(external, width)?),
                    p * total,
                );
            }
        }
        Ok((corrected, report))
    }

    /// The results map that describes canonical order itself.
    pub fn canonical_results_map(&self) -> ResultsMap {
        self.partition
            .canonical_qubits()
            .enumerate()
            .map(|(position, qubit)| (qubit, position))
            .collect()
    }

    fn permutation(&self, results_map: &ResultsMap) -> SpamResult<BitPermutation> {
        let missing: Vec<QubitId> = self
            .partition
            .canonical_qubits()
            .filter(|q| !results_map.contains_key(q))
            .collect();
        let unexpected: Vec<QubitId> = results_map
            .keys()
            .copied()
            .filter(|&q| !self.partition.contains(q))
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(SpamError::ResultsMapMismatch {
                missing,
                unexpected,
            });
        }

        let width = self.partition.num_qubits();
        let mut taken = vec![false; width];
        let mut mapping = Vec::with_capacity(width);
        for qubit in self.partition.canonical_qubits() {
            let position = results_map[&qubit];
            if position >= width || taken[position] {
                return Err(SpamError::InvalidBitPosition {
                    qubit,
                    position,
                    width,
                });
            }
            taken[position] = true;
            mapping.push(position);
        }
        BitPermutation::new(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(ids: &[u32]) -> Vec<QubitId> {
        ids.iter().copied().map(QubitId).collect()
    }

    /// Noise-free results: each circuit reads back exactly what it prepared.
    fn ideal_results(cal: &SpamCalibration, shots: f64) -> Vec<Counts> {
        cal.prepared_states()
            .iter()
            .map(|record| {
                let pattern: String = record
                    .states()
                    .iter()
                    .map(|s| format_bitstring(s))
                    .collect();
                Counts::from([(pattern, shots)])
            })
            .collect()
    }

    #[test]
    fn test_ideal_calibration_gives_identity() {
        let mut cal = SpamCalibration::new([q(&[0, 1]), q(&[2])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = ideal_results(&cal, 100.0);
        cal.estimate(&results).unwrap();
        assert_eq!(cal.confusion_matrix(0).unwrap(), &Array2::<f64>::eye(4));
        assert_eq!(cal.confusion_matrix(1).unwrap(), &Array2::<f64>::eye(2));
        assert_eq!(cal.readout_fidelities().unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_columns_normalized() {
        let mut cal = SpamCalibration::new([q(&[0])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = vec![
            Counts::from([("0", 90.0), ("1", 10.0)]),
            Counts::from([("0", 30.0), ("1", 170.0)]),
        ];
        cal.estimate(&results).unwrap();
        let m = cal.confusion_matrix(0).unwrap();
        assert!((m[[0, 0]] - 0.9).abs() < 1e-12);
        assert!((m[[1, 1]] - 0.85).abs() < 1e-12);
        for column in m.columns() {
            assert!((column.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unobserved_state_is_an_error() {
        let mut cal = SpamCalibration::new([q(&[0])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = vec![Counts::from([("0", 10.0)]), Counts::new()];
        let err = cal.estimate(&results).unwrap_err();
        assert!(matches!(err, SpamError::UnobservedState { ref state, .. } if state == "1"));
        assert!(!cal.is_calibrated());
    }

    #[test]
    fn test_result_count_must_match_circuits() {
        let mut cal = SpamCalibration::new([q(&[0])]).unwrap();
        assert!(matches!(
            cal.estimate(&[]),
            Err(SpamError::CircuitsNotGenerated)
        ));
        cal.calibration_circuits().unwrap();
        assert!(matches!(
            cal.estimate(&[Counts::new()]),
            Err(SpamError::CountsMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_bitstring_width_checked() {
        let mut cal = SpamCalibration::new([q(&[0])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = vec![Counts::from([("00", 1.0)]), Counts::from([("1", 1.0)])];
        assert!(matches!(
            cal.estimate(&results),
            Err(SpamError::BitstringWidth { .. })
        ));
    }

    #[test]
    fn test_correct_before_estimate() {
        let cal = SpamCalibration::new([q(&[0])]).unwrap();
        let map = cal.canonical_results_map();
        let err = cal
            .correct(
                &Counts::from([("0", 1.0)]),
                &map,
                CorrectionMethod::Invert,
                &CorrectionOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(err, SpamError::NotCalibrated));
    }

    #[test]
    fn test_results_map_validation() {
        let mut cal = SpamCalibration::new([q(&[0, 1])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = ideal_results(&cal, 10.0);
        cal.estimate(&results).unwrap();
        let counts = Counts::from([("00", 1.0)]);

        let partial: ResultsMap = [(QubitId(0), 0)].into_iter().collect();
        let err = cal
            .correct(&counts, &partial, CorrectionMethod::Invert, &CorrectionOptions::new())
            .unwrap_err();
        assert!(matches!(err, SpamError::ResultsMapMismatch { ref missing, .. } if missing == &[QubitId(1)]));

        let clash: ResultsMap = [(QubitId(0), 1), (QubitId(1), 1)].into_iter().collect();
        assert!(matches!(
            cal.correct(&counts, &clash, CorrectionMethod::Invert, &CorrectionOptions::new()),
            Err(SpamError::InvalidBitPosition { position: 1, .. })
        ));
    }

    #[test]
    fn test_wide_partition_is_too_many_qubits() {
        let width = MAX_CORRECTION_QUBITS + 1;
        let partition = Partition::new((0..width as u32).map(|i| vec![QubitId(i)])).unwrap();
        let matrices = vec![Array2::<f64>::eye(2); width];
        let cal = SpamCalibration::from_parts(partition, vec![], Some(matrices));
        let counts = Counts::from([("0".repeat(width), 1.0)]);

        let err = cal
            .correct(
                &counts,
                &cal.canonical_results_map(),
                CorrectionMethod::Invert,
                &CorrectionOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SpamError::TooManyQubits { num_qubits, max } if num_qubits == width && max == MAX_CORRECTION_QUBITS
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_correction_limit_fits_in_address_space() {
        let bytes = (1usize << MAX_CORRECTION_QUBITS).checked_mul(std::mem::size_of::<f64>());
        assert!(bytes.is_some_and(|b| b <= isize::MAX as usize));
    }

    #[test]
    fn test_empty_counts_rejected() {
        let mut cal = SpamCalibration::new([q(&[0])]).unwrap();
        cal.calibration_circuits().unwrap();
        let results = ideal_results(&cal, 10.0);
        cal.estimate(&results).unwrap();
        let map = cal.canonical_results_map();
        assert!(matches!(
            cal.correct(&Counts::new(), &map, CorrectionMethod::Invert, &CorrectionOptions::new()),
            Err(SpamError::EmptyCounts)
        ));
    }
}
