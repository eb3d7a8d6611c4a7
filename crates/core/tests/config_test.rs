use intellisense_check_core::config::{Config, ValidatorConfig, WatcherConfig};
use intellisense_check_core::{ProviderTypeId, NATIVE_PROJECT_CONTEXT_TYPE};
use std::path::PathBuf;

#[test]
fn test_validator_config_defaults() {
    let config = ValidatorConfig::default();
    assert_eq!(config.provider_types, vec![NATIVE_PROJECT_CONTEXT_TYPE]);
    assert_eq!(config.scope, PathBuf::new());
}

#[test]
fn test_watcher_config_defaults() {
    let config = WatcherConfig::default();
    assert!(!config.dispose_previous_watcher);
    assert!(!config.cancel_in_flight);
    assert_eq!(config.notice_queue_size, 64);
}

#[test]
fn test_config_validation_scope() {
    let mut config = Config::default();

    // Relative scopes select a subtree
    config.validator.scope = PathBuf::from("src/engine");
    assert!(config.validate().is_ok());

    config.validator.scope = PathBuf::from("/src/engine");
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("validator.scope"));
}

#[test]
fn test_config_multiple_provider_types() {
    let config = Config::from_toml_str(
        r#"
[validator]
provider_types = [
    "ED814497-3055-46C1-9FE0-586CC9530310",
    "3c2a5f0e-8d4b-4e7a-9a61-2f1f0c9d7b11",
]
"#,
    )
    .unwrap();

    let second: ProviderTypeId = "3c2a5f0e-8d4b-4e7a-9a61-2f1f0c9d7b11".parse().unwrap();
    assert_eq!(
        config.validator.provider_types,
        vec![NATIVE_PROJECT_CONTEXT_TYPE, second]
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_watcher_section_keeps_defaults() {
    let config = Config::from_toml_str(
        r#"
[watcher]
cancel_in_flight = true
"#,
    )
    .unwrap();

    assert!(config.watcher.cancel_in_flight);
    assert!(!config.watcher.dispose_previous_watcher);
    assert_eq!(config.validator, ValidatorConfig::default());
}
