//! Correct command: apply a calibration to measured counts.

use anyhow::Result;
use console::style;
use serde::Serialize;

use arvak_spam::{CorrectionReport, Counts, ResultsMap};

use super::common::{load_calibration, print_counts, read_json, write_output};
use crate::config::SpamConfig;

/// Arguments of the correct command.
#[derive(Debug, Clone, Default)]
pub struct CorrectArgs<'a> {
    pub calibration: &'a str,
    pub counts: &'a str,
    pub results_map: Option<&'a str>,
    pub method: Option<&'a str>,
    pub tol: Option<f64>,
    pub max_iterations: Option<usize>,
    pub config: Option<&'a str>,
    pub format: &'a str,
    pub output: Option<&'a str>,
}

/// JSON document written by `--format json`.
#[derive(Debug, Serialize)]
pub struct CorrectionOutput {
    pub counts: Counts,
    pub report: CorrectionReport,
}

/// Execute the correct command.
pub fn execute(args: &CorrectArgs<'_>) -> Result<()> {
    let config = SpamConfig::load(args.config)?;
    let (method, options) = config.resolve(args.method, args.tol, args.max_iterations)?;

    let cal = load_calibration(args.calibration)?;
    let counts: Counts = read_json(args.counts)?;
    let results_map: ResultsMap = match args.results_map {
        Some(path) => read_json(path)?,
        None => cal.canonical_results_map(),
    };

    let (corrected, report) = cal.correct_with_report(&counts, &results_map, method, &options)?;

    match args.format.to_lowercase().as_str() {
        "json" => {
            let doc = CorrectionOutput {
                counts: corrected,
                report,
            };
            write_output(&serde_json::to_string_pretty(&doc)?, args.output)
        }
        "table" => {
            print_counts("Measured", &counts);
            print_counts(&format!("Corrected ({method})"), &corrected);
            let status = if report.converged {
                style("converged").green()
            } else {
                style("not converged").yellow()
            };
            println!(
                "\n  {} iterations, {}, stabilization {:.3e}",
                report.iterations, status, report.stabilization
            );
            if let Some(path) = args.output {
                let doc = CorrectionOutput {
                    counts: corrected,
                    report,
                };
                write_output(&serde_json::to_string_pretty(&doc)?, Some(path))?;
                println!("  Output: {}", style(path).green());
            }
            Ok(())
        }
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }
}
