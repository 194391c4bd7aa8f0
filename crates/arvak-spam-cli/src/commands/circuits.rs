//! Circuits command: build a calibration plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use arvak_spam::SpamCalibration;

use super::common::{parse_groups, write_output};

/// Execute the circuits command.
///
/// Writes the calibration plan (groups plus prepared states, no matrices)
/// and optionally one OpenQASM 3 file per circuit.
pub fn execute(groups: &str, output: Option<&str>, qasm_dir: Option<&str>) -> Result<()> {
    let groups = parse_groups(groups)?;
    let mut cal = SpamCalibration::new(groups)?;
    let circuits = cal.calibration_circuits()?;

    eprintln!(
        "{} Generated {} calibration circuits for {} groups ({} qubits)",
        style("→").cyan().bold(),
        circuits.len(),
        cal.partition().len(),
        cal.partition().num_qubits()
    );

    if let Some(dir) = qasm_dir {
        let dir = Path::new(dir);
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        for circuit in &circuits {
            let path = dir.join(format!("{}.qasm", circuit.name()));
            fs::write(&path, circuit.to_qasm3())
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        eprintln!("  QASM: {}", style(dir.display()).green());
    }

    write_output(&cal.to_json()?, output)?;
    if let Some(path) = output {
        eprintln!("  Plan: {}", style(path).green());
    }

    Ok(())
}
