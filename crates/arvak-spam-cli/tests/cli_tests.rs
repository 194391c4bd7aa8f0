//! CLI command and configuration tests.
//!
//! Commands are driven through the library target against files in a
//! temporary directory.

use std::fs;
use std::path::Path;

use arvak_spam::{CorrectionMethod, QubitId, SpamCalibration};
use arvak_spam_cli::commands::common::{parse_groups, read_json};
use arvak_spam_cli::commands::correct::CorrectArgs;
use arvak_spam_cli::commands::{calibrate, circuits, correct, inspect};
use arvak_spam_cli::config::SpamConfig;
use tempfile::tempdir;

fn path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

// ============================================================================
// commands::common
// ============================================================================

#[test]
fn test_parse_groups() {
    let groups = parse_groups("0,1; 2 ;q4").unwrap();
    assert_eq!(
        groups,
        vec![
            vec![QubitId(0), QubitId(1)],
            vec![QubitId(2)],
            vec![QubitId(4)]
        ]
    );
}

#[test]
fn test_parse_groups_rejects_garbage() {
    assert!(parse_groups("").is_err());
    assert!(parse_groups(";;").is_err());
    assert!(parse_groups("0,a").is_err());
    assert!(parse_groups("0,,1").is_err());
}

#[test]
fn test_read_json_missing_file() {
    let err = read_json::<serde_json::Value>("/nonexistent/counts.json").unwrap_err();
    assert!(err.to_string().contains("File not found"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_file_roundtrip() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("spam.yaml");
    fs::write(&file, "method: bayesian\nmax_iterations: 25\n").unwrap();

    let config = SpamConfig::from_file(&file).unwrap();
    assert_eq!(config.method, CorrectionMethod::Bayesian);
    assert_eq!(config.max_iterations, Some(25));

    let (method, options) = config.resolve(None, Some(1e-6), None).unwrap();
    assert_eq!(method, CorrectionMethod::Bayesian);
    assert_eq!(options.tol, Some(1e-6));
    assert_eq!(options.max_iterations, Some(25));
}

#[test]
fn test_config_missing_file_is_error() {
    assert!(SpamConfig::from_file("/nonexistent/spam.yaml").is_err());
}

// ============================================================================
// Full workflow
// ============================================================================

#[test]
fn test_circuits_calibrate_correct_workflow() {
    let dir = tempdir().unwrap();
    let plan = path(dir.path(), "plan.json");
    let qasm_dir = path(dir.path(), "qasm");
    let results = path(dir.path(), "results.json");
    let cal_file = path(dir.path(), "cal.json");
    let counts = path(dir.path(), "counts.json");
    let out = path(dir.path(), "out.json");

    circuits::execute("0;1", Some(&plan), Some(&qasm_dir)).unwrap();
    let planned = SpamCalibration::from_json(&fs::read_to_string(&plan).unwrap()).unwrap();
    assert!(!planned.is_calibrated());
    assert_eq!(planned.prepared_states().len(), 2);
    let qasm = fs::read_to_string(Path::new(&qasm_dir).join("spam_cal_1.qasm")).unwrap();
    assert!(qasm.contains("x q[1];"));

    fs::write(
        &results,
        r#"[{"00": 90, "01": 5, "10": 5}, {"11": 85, "10": 10, "01": 5}]"#,
    )
    .unwrap();
    calibrate::execute(&plan, &results, Some(&cal_file)).unwrap();

    let cal = SpamCalibration::from_json(&fs::read_to_string(&cal_file).unwrap()).unwrap();
    let fidelities = cal.readout_fidelities().unwrap();
    assert!((fidelities[0] - 0.95).abs() < 1e-12);
    assert!((fidelities[1] - 0.925).abs() < 1e-12);

    inspect::execute(&cal_file).unwrap();

    fs::write(&counts, r#"{"00": 480, "11": 420, "01": 60, "10": 40}"#).unwrap();
    let config = path(dir.path(), "spam.yaml");
    fs::write(&config, "method: bayesian\n").unwrap();
    correct::execute(&CorrectArgs {
        calibration: &cal_file,
        counts: &counts,
        config: Some(&config),
        format: "json",
        output: Some(&out),
        ..CorrectArgs::default()
    })
    .unwrap();

    let doc: serde_json::Value = read_json(&out).unwrap();
    assert_eq!(doc["report"]["method"], "bayesian");
    let total: f64 = doc["counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((total - 1000.0).abs() < 1e-6);
}

#[test]
fn test_correct_flag_overrides_config_method() {
    let dir = tempdir().unwrap();
    let cal_file = path(dir.path(), "cal.json");
    let counts = path(dir.path(), "counts.json");
    let map = path(dir.path(), "map.json");
    let config = path(dir.path(), "spam.yaml");
    let out = path(dir.path(), "out.json");

    fs::write(
        &cal_file,
        r#"{"groups": [{"qubits": [3], "matrix": [[0.9, 0.2], [0.1, 0.8]]},
                       {"qubits": [5], "matrix": [[1.0, 0.0], [0.0, 1.0]]}],
            "prepared_states": []}"#,
    )
    .unwrap();
    fs::write(&counts, r#"{"00": 900, "01": 100}"#).unwrap();
    // Qubit 3 is reported as the last bit.
    fs::write(&map, r#"{"3": 1, "5": 0}"#).unwrap();
    fs::write(&config, "method: bayesian\n").unwrap();

    correct::execute(&CorrectArgs {
        calibration: &cal_file,
        counts: &counts,
        results_map: Some(&map),
        method: Some("invert"),
        config: Some(&config),
        format: "json",
        output: Some(&out),
        ..CorrectArgs::default()
    })
    .unwrap();

    let doc: serde_json::Value = read_json(&out).unwrap();
    assert_eq!(doc["report"]["method"], "invert");
    assert_eq!(doc["report"]["iterations"], 1);
    let c00 = doc["counts"]["00"].as_f64().unwrap();
    let c01 = doc["counts"]["01"].as_f64().unwrap_or(0.0);
    assert!((c00 - 1000.0).abs() < 1e-6);
    assert!(c01.abs() < 1e-6);
}

#[test]
fn test_correct_rejects_unknown_format_and_method() {
    let dir = tempdir().unwrap();
    let cal_file = path(dir.path(), "cal.json");
    let counts = path(dir.path(), "counts.json");
    fs::write(
        &cal_file,
        r#"{"groups": [{"qubits": [0], "matrix": [[1.0, 0.0], [0.0, 1.0]]}], "prepared_states": []}"#,
    )
    .unwrap();
    fs::write(&counts, r#"{"0": 10}"#).unwrap();

    let base = CorrectArgs {
        calibration: &cal_file,
        counts: &counts,
        config: None,
        format: "xml",
        ..CorrectArgs::default()
    };
    assert!(correct::execute(&base).is_err());

    let bad_method = CorrectArgs {
        method: Some("richardson"),
        format: "json",
        ..base
    };
    assert!(correct::execute(&bad_method).is_err());
}

#[test]
fn test_calibrate_rejects_wrong_number_of_results() {
    let dir = tempdir().unwrap();
    let plan = path(dir.path(), "plan.json");
    let results = path(dir.path(), "results.json");

    circuits::execute("0,1", Some(&plan), None).unwrap();
    fs::write(&results, r#"[{"00": 10}]"#).unwrap();
    let err = calibrate::execute(&plan, &results, None).unwrap_err();
    assert!(format!("{err:#}").contains("Expected 4"));
}
