//! Arvak SPAM Command-Line Interface
//!
//! Generates readout calibration circuits, estimates confusion matrices from
//! their results and corrects measured counts.
//!
//! ```text
//! arvak-spam circuits  --groups "0,1;2" --output plan.json --qasm-dir circuits/
//! arvak-spam calibrate --plan plan.json --counts results.json --output cal.json
//! arvak-spam correct   --calibration cal.json --counts counts.json --method bayesian
//! arvak-spam inspect   --calibration cal.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use arvak_spam_cli::commands::{calibrate, circuits, correct, inspect};

/// Arvak SPAM - readout noise calibration and correction
#[derive(Parser)]
#[command(name = "arvak-spam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate calibration circuits for a set of correlation groups
    Circuits {
        /// Correlation groups, e.g. "0,1;2" (groups separated by ';')
        #[arg(short, long)]
        groups: String,

        /// Plan output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory to write one OpenQASM 3 file per circuit
        #[arg(long)]
        qasm_dir: Option<String>,
    },

    /// Estimate confusion matrices from calibration circuit results
    Calibrate {
        /// Plan file produced by `circuits`
        #[arg(short, long)]
        plan: String,

        /// JSON array of counts, one entry per calibration circuit
        #[arg(short, long)]
        counts: String,

        /// Calibration output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Correct measured counts with a calibration
    Correct {
        /// Calibration file produced by `calibrate`
        #[arg(long)]
        calibration: String,

        /// Measured counts (JSON object of bitstring to count)
        #[arg(short, long)]
        counts: String,

        /// Qubit to bit-position map (JSON object); canonical order if omitted
        #[arg(long)]
        results_map: Option<String>,

        /// Correction method (invert, bayesian)
        #[arg(short, long)]
        method: Option<String>,

        /// Bayesian convergence threshold (default 1/total counts)
        #[arg(long)]
        tol: Option<f64>,

        /// Bayesian iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Configuration file (default ~/.arvak/spam.yaml)
        #[arg(long)]
        config: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the corrected counts as JSON to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the groups, fidelities and confusion matrices of a calibration
    Inspect {
        /// Calibration file
        #[arg(long)]
        calibration: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Circuits {
            groups,
            output,
            qasm_dir,
        } => circuits::execute(&groups, output.as_deref(), qasm_dir.as_deref()),

        Commands::Calibrate {
            plan,
            counts,
            output,
        } => calibrate::execute(&plan, &counts, output.as_deref()),

        Commands::Correct {
            calibration,
            counts,
            results_map,
            method,
            tol,
            max_iterations,
            config,
            format,
            output,
        } => correct::execute(&correct::CorrectArgs {
            calibration: &calibration,
            counts: &counts,
            results_map: results_map.as_deref(),
            method: method.as_deref(),
            tol,
            max_iterations,
            config: config.as_deref(),
            format: &format,
            output: output.as_deref(),
        }),

        Commands::Inspect { calibration } => inspect::execute(&calibration),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
