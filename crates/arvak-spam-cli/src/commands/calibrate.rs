//! Calibrate command: estimate confusion matrices from circuit results.

use anyhow::{Context, Result};
use console::style;

use arvak_spam::Counts;

use super::common::{load_calibration, read_json, write_output};

/// Execute the calibrate command.
///
/// `counts` holds a JSON array with one counts object per calibration
/// circuit, in the order the plan lists them.
pub fn execute(plan: &str, counts: &str, output: Option<&str>) -> Result<()> {
    let mut cal = load_calibration(plan)?;
    let results: Vec<Counts> = read_json(counts)?;

    eprintln!(
        "{} Estimating confusion matrices from {} circuit results",
        style("→").cyan().bold(),
        results.len()
    );

    cal.estimate(&results)
        .with_context(|| format!("Calibration from {counts} failed"))?;

    let fidelities = cal.readout_fidelities()?;
    for (group, fidelity) in cal.partition().groups().iter().zip(&fidelities) {
        eprintln!(
            "  [{}]: fidelity {:.4}",
            group
                .qubits()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            fidelity
        );
    }
    eprintln!(
        "{} Average readout fidelity {:.4}",
        style("✓").green().bold(),
        cal.average_fidelity()?
    );

    write_output(&cal.to_json()?, output)
}
