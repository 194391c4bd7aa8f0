//! Basis-state preparation circuits.

use serde::{Deserialize, Serialize};

use crate::error::{SpamError, SpamResult};
use crate::qubit::QubitId;

/// A calibration circuit: flip some qubits out of |0…0⟩, then measure.
///
/// Classical bit `i` receives the measurement of `measured()[i]`, so the
/// bit patterns the backend returns follow the measured-qubit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationCircuit {
    name: String,
    num_qubits: u32,
    flips: Vec<QubitId>,
    measured: Vec<QubitId>,
}

impl CalibrationCircuit {
    /// Create a circuit of the given device width that measures `measured`.
    pub fn new(
        name: impl Into<String>,
        num_qubits: u32,
        measured: Vec<QubitId>,
    ) -> SpamResult<Self> {
        if let Some(&qubit) = measured.iter().find(|q| q.0 >= num_qubits) {
            return Err(SpamError::QubitOutOfRange {
                qubit,
                width: num_qubits,
            });
        }
        Ok(Self {
            name: name.into(),
            num_qubits,
            flips: vec![],
            measured,
        })
    }

    /// Apply a Pauli-X (bit flip) to `qubit`.
    pub fn x(&mut self, qubit: QubitId) -> SpamResult<&mut Self> {
        if qubit.0 >= self.num_qubits {
            return Err(SpamError::QubitOutOfRange {
                qubit,
                width: self.num_qubits,
            });
        }
        if self.flips.contains(&qubit) {
            return Err(SpamError::DuplicateFlip(qubit));
        }
        self.flips.push(qubit);
        Ok(self)
    }

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device width.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of classical bits (one per measured qubit).
    pub fn num_clbits(&self) -> usize {
        self.measured.len()
    }

    /// Qubits flipped by this circuit, in application order.
    pub fn flips(&self) -> &[QubitId] {
        &self.flips
    }

    /// Measured qubits, in classical-bit order.
    pub fn measured(&self) -> &[QubitId] {
        &self.measured
    }

    /// Render as OpenQASM 3 source.
    pub fn to_qasm3(&self) -> String {
        let mut out = String::new();
        push_line(&mut out, "OPENQASM 3.0;");
        push_line(&mut out, &format!("// {}", self.name));
        push_line(&mut out, "");
        push_line(&mut out, &format!("qubit[{}] q;", self.num_qubits));
        if !self.measured.is_empty() {
            push_line(&mut out, &format!("bit[{}] c;", self.measured.len()));
        }
        push_line(&mut out, "");
        for qubit in &self.flips {
            push_line(&mut out, &format!("x q[{}];", qubit.0));
        }
        if !self.flips.is_empty() {
            push_line(&mut out, "barrier q;");
        }
        for (clbit, qubit) in self.measured.iter().enumerate() {
            push_line(&mut out, &format!("c[{clbit}] = measure q[{}];", qubit.0));
        }
        out
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_and_emit() {
        let mut circuit =
            CalibrationCircuit::new("cal", 3, vec![QubitId(2), QubitId(0)]).unwrap();
        circuit.x(QubitId(2)).unwrap();
        let qasm = circuit.to_qasm3();
        assert!(qasm.starts_with("OPENQASM 3.0;"));
        assert!(qasm.contains("qubit[3] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("x q[2];"));
        assert!(qasm.contains("c[0] = measure q[2];"));
        assert!(qasm.contains("c[1] = measure q[0];"));
    }

    #[test]
    fn test_emitted_lines_in_order() {
        let mut circuit = CalibrationCircuit::new("spam_cal_1", 2, vec![QubitId(1)]).unwrap();
        circuit.x(QubitId(1)).unwrap();
        let qasm = circuit.to_qasm3();
        let lines: Vec<&str> = qasm.lines().collect();
        assert_eq!(
            lines,
            vec![
                "OPENQASM 3.0;",
                "// spam_cal_1",
                "",
                "qubit[2] q;",
                "bit[1] c;",
                "",
                "x q[1];",
                "barrier q;",
                "c[0] = measure q[1];",
            ]
        );
    }

    #[test]
    fn test_rejects_out_of_range_and_duplicates() {
        let mut circuit = CalibrationCircuit::new("cal", 2, vec![QubitId(0)]).unwrap();
        assert!(matches!(
            circuit.x(QubitId(2)),
            Err(SpamError::QubitOutOfRange { width: 2, .. })
        ));
        circuit.x(QubitId(1)).unwrap();
        assert!(matches!(
            circuit.x(QubitId(1)),
            Err(SpamError::DuplicateFlip(_))
        ));
        assert!(CalibrationCircuit::new("bad", 1, vec![QubitId(1)]).is_err());
    }
}
