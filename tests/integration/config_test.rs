use std::fs;
use tempfile::TempDir;

use vitalwatch::CollectorConfig;

#[test]
fn test_missing_file_loads_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let config = CollectorConfig::load_from(&path).unwrap();
    assert_eq!(config, CollectorConfig::default());
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = CollectorConfig {
        endpoint: Some("https://collector.example/api/analytics".to_string()),
        memory_poll_interval_ms: 15_000,
        namespace: Some("admin".to_string()),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = CollectorConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ this is not json").unwrap();

    let config = CollectorConfig::load_from(&path).unwrap();
    assert_eq!(config, CollectorConfig::default());
}

#[test]
fn test_empty_file_loads_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "   \n").unwrap();

    assert_eq!(
        CollectorConfig::load_from(&path).unwrap(),
        CollectorConfig::default()
    );
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "memory_critical_ratio": 0.85 }"#).unwrap();

    let config = CollectorConfig::load_from(&path).unwrap();
    assert_eq!(config.memory_critical_ratio, 0.85);
    assert_eq!(config.memory_record_ratio, 0.7);
    assert_eq!(config.max_vital_samples, 100);
}

#[test]
fn test_config_path_location() {
    if let Ok(path) = CollectorConfig::get_config_path() {
        assert!(path.ends_with("vitalwatch/config.json"));
    }
}
