use rmon::core::config::Config;
use rmon::ValidationError;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.refresh_interval_seconds, 1.0);
    assert_eq!(config.window_size, 60);
    assert_eq!(config.top_n_processes, 10);
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rmon").join("config.json");

    let mut config = Config::default();
    config.set_value("window_size", "120").unwrap();
    config.set_value("memory_alert_threshold", "85").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_load_nonexistent_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("missing.json")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_config_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, b"{ not json").unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_config_builds_validated_settings() {
    let mut config = Config::default();
    config.set_value("refresh_interval_seconds", "2.5").unwrap();
    config.set_value("sample_timeout_seconds", "0.75").unwrap();

    let settings = config.monitor_settings().unwrap();
    assert_eq!(settings.refresh_interval(), Duration::from_millis(2500));
    assert_eq!(settings.window_size(), 60);

    let options = config.collector_options().unwrap();
    assert_eq!(options.sample_timeout, Duration::from_millis(750));
    assert_eq!(options.failure_budget, 10);
}

#[test]
fn test_hand_edited_invalid_file_is_rejected_at_boundary() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, br#"{"window_size": 5000}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(matches!(
        config.monitor_settings(),
        Err(ValidationError::OutOfRange {
            field: "window_size",
            ..
        })
    ));
}
