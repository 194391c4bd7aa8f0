//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::de::DeserializeOwned;

use arvak_spam::{Counts, QubitId, SpamCalibration};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}"))
}

/// Load a calibration (plan or estimated) from a JSON file.
pub fn load_calibration(path: &str) -> Result<SpamCalibration> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    SpamCalibration::from_json(&source)
        .with_context(|| format!("Invalid calibration file: {path}"))
}

/// Write `contents` to `output`, or to stdout when no path is given.
pub fn write_output(contents: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("Failed to write file: {path}"))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

/// Parse a group specification such as `"0,1;2;3,4"`.
///
/// Groups are separated by `;`, qubits inside a group by `,`.
pub fn parse_groups(text: &str) -> Result<Vec<Vec<QubitId>>> {
    let groups: Vec<Vec<QubitId>> = text
        .split(';')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|group| {
            group
                .split(',')
                .map(str::trim)
                .map(|q| {
                    q.trim_start_matches('q')
                        .parse::<u32>()
                        .map(QubitId)
                        .with_context(|| format!("Invalid qubit index '{q}' in group '{group}'"))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<_>>()?;

    if groups.is_empty() {
        anyhow::bail!("No correlation groups given");
    }
    Ok(groups)
}

/// Print counts as a table, most frequent first.
pub fn print_counts(title: &str, counts: &Counts) {
    let total = counts.total();
    println!(
        "\n{} {} ({:.0} counts):",
        style("✓").green().bold(),
        title,
        total
    );

    let sorted = counts.sorted();
    for (bitstring, count) in sorted.iter().take(16) {
        let prob = if total > 0.0 {
            count / total * 100.0
        } else {
            0.0
        };
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>10.2} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}
