/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

#[test]
fn binary_shows_help() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("threatmap"),
        "Help output should mention threatmap"
    );
}

#[test]
fn binary_shows_version() {
    let output = Command::new("cargo")
        .args(["run", "--", "--version"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn map_subcommand_is_documented() {
    let output = Command::new("cargo")
        .args(["run", "--", "map", "--help"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "map --help failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--seed"), "map help should list --seed");
    assert!(
        stdout.contains("--boundaries"),
        "map help should list --boundaries"
    );
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = Command::new("cargo")
        .args(["run", "--", "nonexistent-command"])
        .output()
        .expect("Failed to execute cargo run");

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    // Should show helpful error, not a panic backtrace
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn fetch_with_unreachable_url_reports_error() {
    let output = Command::new("cargo")
        .args(["run", "--", "fetch", "http://127.0.0.1:1/none.geojson"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        !output.status.success(),
        "Unreachable fetch should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked at"),
        "Unreachable fetch should not cause panic"
    );
    assert!(
        stderr.contains("fetch failed"),
        "Fetch error should be reported on stderr"
    );
}
