//! Tests for config functionality.

use crate::config::Config;
use chrono::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_ttl_seconds, 300);
    assert_eq!(config.lock_stale_seconds, 180);
    assert_eq!(config.sweep_interval_ms, None);
    assert!(config.audit_log);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_empty_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_ttl_seconds: 600
audit_log: false
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_ttl_seconds, 600);
    assert!(!config.audit_log);

    // Unspecified values should use defaults
    assert_eq!(config.lock_stale_seconds, 180);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
lock_ttl_seconds: 120
lock_stale_seconds: 60
sweep_interval_ms: 5000
audit_log: false
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_ttl_seconds, 120);
    assert_eq!(config.lock_stale_seconds, 60);
    assert_eq!(config.sweep_interval_ms, Some(5000));
    assert!(!config.audit_log);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
lock_ttl_seconds: 300
guard_stale_seconds: 30
future_setting: true
nested:
  key: value
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.lock_ttl_seconds, 300);
}

#[test]
fn test_invalid_yaml_is_user_error() {
    let err = Config::from_yaml("lock_ttl_seconds: [not, a, number]").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
    assert_eq!(err.exit_code(), crate::exit_codes::USER_ERROR);
}

#[test]
fn test_validate_zero_ttl_fails() {
    let err = Config::from_yaml("lock_ttl_seconds: 0").unwrap_err();
    assert!(err.to_string().contains("lock_ttl_seconds"));
}

#[test]
fn test_validate_zero_stale_fails() {
    let err = Config::from_yaml("lock_stale_seconds: 0").unwrap_err();
    assert!(err.to_string().contains("lock_stale_seconds"));
}

#[test]
fn test_validate_stale_longer_than_ttl_fails() {
    let yaml = r#"
lock_ttl_seconds: 60
lock_stale_seconds: 120
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("must not exceed"));
}

#[test]
fn test_validate_stale_equal_to_ttl_is_allowed() {
    let yaml = r#"
lock_ttl_seconds: 60
lock_stale_seconds: 60
"#;
    assert!(Config::from_yaml(yaml).is_ok());
}

#[test]
fn test_validate_sweep_interval_bounds() {
    assert!(Config::from_yaml("sweep_interval_ms: 0").is_err());
    assert!(Config::from_yaml("sweep_interval_ms: 300000").is_err());
    assert!(Config::from_yaml("sweep_interval_ms: 299999").is_ok());
}

#[test]
fn test_policy_uses_configured_values() {
    let yaml = r#"
lock_ttl_seconds: 120
lock_stale_seconds: 60
"#;
    let policy = Config::from_yaml(yaml).unwrap().policy();

    assert_eq!(policy.ttl(), Duration::seconds(120));
    assert_eq!(policy.stale_threshold(), Duration::seconds(60));
    assert_eq!(policy.sweep_interval(), Duration::seconds(24));
}

#[test]
fn test_policy_sweep_interval_override() {
    let policy = Config::from_yaml("sweep_interval_ms: 2500")
        .unwrap()
        .policy();
    assert_eq!(policy.sweep_interval(), Duration::milliseconds(2500));
}

#[test]
fn test_to_yaml_round_trip() {
    let mut config = Config::default();
    config.sweep_interval_ms = Some(1000);

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("lock_ttl_seconds: 300"));
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_default_yaml_omits_sweep_interval() {
    let yaml = Config::default().to_yaml().unwrap();
    assert!(!yaml.contains("sweep_interval_ms"));
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");

    assert!(Config::load(&path).is_err());
    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "lock_ttl_seconds: 900\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.lock_ttl_seconds, 900);
    assert_eq!(config.policy().ttl(), Duration::seconds(900));
}

#[test]
fn test_validate_ttl_upper_bound() {
    let yaml = format!("lock_ttl_seconds: {}", crate::config::MAX_LOCK_TTL_SECONDS + 1);
    let err = Config::from_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("at most"));
}
