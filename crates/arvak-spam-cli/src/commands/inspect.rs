//! Inspect command: summarize a calibration file.

use anyhow::Result;
use console::style;

use arvak_spam::format_bitstring;

use super::common::load_calibration;

/// Execute the inspect command.
pub fn execute(calibration: &str) -> Result<()> {
    let cal = load_calibration(calibration)?;
    let partition = cal.partition();

    println!(
        "{} {} groups, {} qubits, {} calibration circuits",
        style("Calibration:").bold(),
        partition.len(),
        partition.num_qubits(),
        cal.prepared_states().len()
    );

    if !cal.is_calibrated() {
        println!(
            "  {}",
            style("No confusion matrices estimated yet").yellow()
        );
        for (g, group) in partition.groups().iter().enumerate() {
            println!("  group {g}: {}", qubit_list(group.qubits()));
        }
        return Ok(());
    }

    let fidelities = cal.readout_fidelities()?;
    for (g, group) in partition.groups().iter().enumerate() {
        println!(
            "\n  group {g}: {} (fidelity {:.4})",
            style(qubit_list(group.qubits())).cyan(),
            fidelities[g]
        );
        let matrix = cal.confusion_matrix(g)?;
        let width = group.len();
        let labels: Vec<String> = (0..group.dim())
            .map(|i| {
                arvak_spam::index_to_basis_state(i, width)
                    .map(|s| format_bitstring(&s))
                    .unwrap_or_default()
            })
            .collect();

        print!("  {:>width$}  ", "", width = width);
        for label in &labels {
            print!("{label:>8}");
        }
        println!();
        for (label, row) in labels.iter().zip(matrix.rows()) {
            print!("  {label:>width$}  ", width = width);
            for value in row {
                print!("{value:>8.4}");
            }
            println!();
        }
    }

    println!(
        "\n{} Average readout fidelity {:.4}",
        style("✓").green().bold(),
        cal.average_fidelity()?
    );
    Ok(())
}

fn qubit_list(qubits: &[arvak_spam::QubitId]) -> String {
    qubits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
