use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

struct RunOutput {
    success: bool,
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: String,
}

/// Helper function to run salesplot with arguments and stdin input
fn run_salesplot(args: &[&str], stdin_content: &str) -> RunOutput {
    let mut child = Command::new(env!("CARGO_BIN_EXE_salesplot"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn salesplot");

    // The process may exit before reading stdin, so a broken pipe is fine here
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(stdin_content.as_bytes());
    }

    let output = child.wait_with_output().expect("Failed to wait for process");

    RunOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn chart_json(output: &RunOutput) -> serde_json::Value {
    assert!(output.success, "Failed: {}", output.stderr);
    serde_json::from_slice(&output.stdout).expect("Output is not valid JSON")
}

#[test]
fn test_end_to_end_sales_data() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--format", "json"], &csv);
    let chart = chart_json(&output);
    assert_eq!(chart["title"], "Sales Report by Category");
    assert_eq!(chart["y_label"], "Sales");
    assert_eq!(chart["x_label"], "Category");
    assert_eq!(chart["bars"].as_array().unwrap().len(), 5);
    assert_eq!(chart["bars"][3]["label"], "Books");
    assert_eq!(chart["bars"][3]["height"], 800.0);
}

#[test]
fn test_end_to_end_default_png() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&[], &csv);
    assert!(output.success, "Failed: {}", output.stderr);
    assert!(is_valid_png(&output.stdout), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_svg() {
    let output = run_salesplot(&["--input", "test/sales.csv", "--format", "svg"], "");
    assert!(output.success, "Failed: {}", output.stderr);
    let svg = String::from_utf8_lossy(&output.stdout);
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Sales Report by Category"));
}

#[test]
fn test_end_to_end_styled_bars() {
    let output = run_salesplot(
        &[
            "--input",
            "test/sales.csv",
            "--color",
            "#2a9d8f",
            "--bar-width",
            "0.5",
            "--bar-alpha",
            "0.7",
            "--width",
            "400",
            "--height",
            "300",
        ],
        "",
    );
    assert!(output.success, "Failed: {}", output.stderr);
    assert!(is_valid_png(&output.stdout));
}

#[test]
fn test_end_to_end_oversized_canvas() {
    let output = run_salesplot(
        &["--input", "test/sales.csv", "--width", "40000", "--height", "40000"],
        "",
    );
    assert!(!output.success);
    assert_eq!(output.code, Some(1), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("pixel limit"));
    assert!(!output.stderr.contains("panicked"));
}

#[test]
fn test_end_to_end_single_category() {
    let output = run_salesplot(&["--format", "json"], "Category,Sales\nElectronics,1000\n");
    let chart = chart_json(&output);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 1);
}

#[test]
fn test_end_to_end_input_file() {
    let output = run_salesplot(&["--input", "test/sales.csv", "--format", "json"], "");
    let chart = chart_json(&output);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 5);
}

#[test]
fn test_end_to_end_json_input() {
    let output = run_salesplot(
        &["--json", "--input", "test/sales.json", "--format", "json"],
        "",
    );
    let chart = chart_json(&output);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 3);
    assert_eq!(chart["bars"][1]["height"], 1500.5);
}

#[test]
fn test_end_to_end_custom_columns() {
    let csv = "Region,Revenue\nNorth,10\nSouth,20\n";
    let output = run_salesplot(
        &["--category", "Region", "--sales", "Revenue", "--format", "json"],
        csv,
    );
    let chart = chart_json(&output);
    assert_eq!(chart["x_label"], "Region");
    // The y label stays fixed regardless of the sales column name
    assert_eq!(chart["y_label"], "Sales");
}

#[test]
fn test_end_to_end_config_file() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--config", "test/options.json"], &csv);
    let chart = chart_json(&output);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 5);
}

#[test]
fn test_end_to_end_output_file() {
    let path = std::env::temp_dir().join(format!("salesplot-{}.json", std::process::id()));
    let path_str = path.to_str().expect("temp path is not UTF-8");
    let output = run_salesplot(
        &["--input", "test/sales.csv", "--format", "json", "--output", path_str],
        "",
    );
    assert!(output.success, "Failed: {}", output.stderr);
    assert!(output.stdout.is_empty());

    let written = fs::read(&path).expect("Output file was not written");
    let _ = fs::remove_file(&path);
    let chart: serde_json::Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(chart["bars"].as_array().unwrap().len(), 5);
}

#[test]
fn test_end_to_end_rejected_data_keeps_output_file() {
    let path = std::env::temp_dir().join(format!("salesplot-{}-kept.json", std::process::id()));
    fs::write(&path, "PREVIOUS CHART").expect("Failed to write existing output");
    let path_str = path.to_str().expect("temp path is not UTF-8");

    let output = run_salesplot(
        &["--input", "test/duplicates.csv", "--format", "json", "--output", path_str],
        "",
    );
    let contents = fs::read_to_string(&path).expect("Output file was removed");
    let _ = fs::remove_file(&path);

    assert!(!output.success, "Should have failed with duplicate categories");
    assert_eq!(contents, "PREVIOUS CHART");
}

#[test]
fn test_end_to_end_empty_csv() {
    let csv = fs::read_to_string("test/empty.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--format", "json"], &csv);
    assert!(!output.success, "Should have failed with empty data");
    assert!(output
        .stderr
        .contains("DataFrame is empty, lacks sales data, or sales data is not numeric."));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_end_to_end_non_numeric_sales() {
    let csv = fs::read_to_string("test/non_numeric.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--format", "json"], &csv);
    assert!(!output.success, "Should have failed with non-numeric sales");
    assert!(output.stderr.contains("sales data is not numeric"));
}

#[test]
fn test_end_to_end_duplicate_categories() {
    let csv = fs::read_to_string("test/duplicates.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--format", "json"], &csv);
    assert!(!output.success, "Should have failed with duplicate categories");
    assert!(output
        .stderr
        .contains("DataFrame contains duplicate entries in the category column."));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_end_to_end_column_not_found() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let output = run_salesplot(&["--category", "NonexistentCategory", "--format", "json"], &csv);
    assert!(!output.success, "Should have failed with column not found");
    assert!(output
        .stderr
        .contains("Column 'NonexistentCategory' not found"));
}

#[test]
fn test_end_to_end_malformed_json() {
    let output = run_salesplot(&["--json", "--format", "json"], "{not json");
    assert!(!output.success);
    assert!(output.stderr.contains("Input is not valid JSON"));
}

#[test]
fn test_end_to_end_unknown_format() {
    let output = run_salesplot(&["--input", "test/sales.csv", "--format", "gif"], "");
    assert!(!output.success);
}

#[test]
fn test_end_to_end_self_test() {
    let output = run_salesplot(&["--self-test"], "");
    assert!(output.success, "Self-test failed: {}", output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test duplicate_category_input ... ok"));
    assert!(stdout.contains("6 passed; 0 failed"));
}
