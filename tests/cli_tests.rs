use std::io::Write;
use std::process::Command;

const LOAN_RISK: &str = env!("CARGO_BIN_EXE_loan-risk");

#[test]
fn test_missing_data_file_exits_with_error() {
    let output = Command::new(LOAN_RISK)
        .args(["--data", "/nonexistent.csv", "summary"])
        .env_remove("LOAN_RISK_DATA")
        .output()
        .expect("failed to run loan-risk");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stdout.contains("Error loading loan data:"),
        "unexpected stdout: {}",
        stdout
    );
}

#[test]
fn test_missing_driver_column_exits_with_error() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Employment_Type,Default").unwrap();
    writeln!(file, "Salaried,Yes").unwrap();

    let output = Command::new(LOAN_RISK)
        .arg("--data")
        .arg(file.path())
        .arg("summary")
        .output()
        .expect("failed to run loan-risk");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("Missing expected column 'Credit_History'"));
}

#[test]
fn test_summary_of_sample_data() {
    let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_loans.csv");

    let output = Command::new(LOAN_RISK)
        .args(["--data", sample, "summary"])
        .output()
        .expect("failed to run loan-risk");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("Overall default rate: 50.0% (6 of 12 loans, High risk)"));
    assert!(stdout.contains("Risk by Employment Type"));
}
