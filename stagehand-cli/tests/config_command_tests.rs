//! Integration tests for `stagehand config`.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;

use stagehand_cli::commands::config::{show_report, validation_report};

#[tokio::test]
#[serial]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stagehand.toml");
    fs::write(
        &config_path,
        r#"
[general]
log_level = "debug"
log_format = "json"

[scenario]
pause_unit_ms = 250
"#,
    )
    .expect("should write config");

    // When: Validating it
    let report = validation_report(&config_path).await;

    // Then: Should be valid
    assert!(report.valid, "errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[tokio::test]
#[serial]
async fn test_config_validate_out_of_range_value() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stagehand.toml");
    fs::write(&config_path, "[scenario]\nprobe_interval_ms = 1\n").expect("should write config");

    let report = validation_report(&config_path).await;

    assert!(!report.valid);
    assert!(report.errors[0].contains("probe_interval_ms"));
}

#[tokio::test]
#[serial]
async fn test_config_validate_missing_file() {
    let report = validation_report(Path::new("/nonexistent/stagehand.toml")).await;
    assert!(!report.valid, "strict validation requires the file");
}

#[tokio::test]
#[serial]
async fn test_config_show_section_applies_env_override() {
    // Given: A config file and an env override for the same field
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stagehand.toml");
    fs::write(&config_path, "[runtime]\nproject = \"fromfile\"\n").expect("should write config");

    // SAFETY: serialized test; no other thread reads the environment concurrently
    unsafe { std::env::set_var("STAGEHAND_RUNTIME_PROJECT", "fromenv") };
    let report = show_report(&config_path, Some("runtime")).await;
    unsafe { std::env::remove_var("STAGEHAND_RUNTIME_PROJECT") };

    // Then: The env value wins and only that section is rendered
    let report = report.expect("show should succeed");
    assert_eq!(report.section.as_deref(), Some("runtime"));
    assert!(report.config_toml.contains("fromenv"));
    assert!(!report.config_toml.contains("pause_unit_ms"));
}

#[tokio::test]
#[serial]
async fn test_config_show_without_file_uses_defaults() {
    let report = show_report(Path::new("/nonexistent/stagehand.toml"), None)
        .await
        .expect("defaults should be shown");
    assert!(report.config_toml.contains("[scenario]"));
    assert!(report.config_toml.contains("pause_unit_ms = 1000"));
}

#[tokio::test]
#[serial]
async fn test_config_show_unknown_section() {
    let err = show_report(Path::new("/nonexistent/stagehand.toml"), Some("ebpf"))
        .await
        .err()
        .expect("unknown section should fail");
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("general, runtime, scenario"));
}
