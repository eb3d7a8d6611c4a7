//! Environment overrides for `Config::from_file`
//!
//! Kept in its own test binary: the variables are process-wide and would leak
//! into the other config tests.

use intellisense_check_core::config::Config;
use std::io::Write;

#[test]
fn test_env_vars_override_file_values() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    file.write_all(b"[watcher]\nnotice_queue_size = 16\n")
        .expect("write config");

    std::env::set_var("INTELLISENSE_CHECK_WATCHER__CANCEL_IN_FLIGHT", "true");
    std::env::set_var("INTELLISENSE_CHECK_WATCHER__NOTICE_QUEUE_SIZE", "8");

    let from_file = Config::from_file(file.path());
    let missing = Config::from_file(&file.path().with_extension("absent"));

    std::env::remove_var("INTELLISENSE_CHECK_WATCHER__CANCEL_IN_FLIGHT");
    std::env::remove_var("INTELLISENSE_CHECK_WATCHER__NOTICE_QUEUE_SIZE");

    let config = from_file.expect("config should load");
    assert!(config.watcher.cancel_in_flight);
    assert_eq!(config.watcher.notice_queue_size, 8);
    assert!(!config.watcher.dispose_previous_watcher);

    // Overrides apply when no config file exists too
    let config = missing.expect("defaults should load");
    assert!(config.watcher.cancel_in_flight);
    assert_eq!(config.watcher.notice_queue_size, 8);
}
