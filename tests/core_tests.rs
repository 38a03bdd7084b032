//! Integration tests for configuration loading

use std::fs;

use chess_match::core::config::CONFIG_PATH_VAR;
use chess_match::core::{CoreError, ServerConfig};

fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("chess-match-{}-{}.json", name, std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_file_then_env_layering() {
    let path = temp_config(
        "layering",
        r#"{"bind_addr":"127.0.0.1:4000","matching":{"match_threshold":75,"grace_period_secs":30}}"#,
    );
    let path_str = path.to_string_lossy().to_string();

    let config = ServerConfig::from_lookup(|key| match key {
        k if k == CONFIG_PATH_VAR => Some(path_str.clone()),
        "CHESS_MATCH_THRESHOLD" => Some("90".to_string()),
        _ => None,
    })
    .unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(config.bind_addr.port(), 4000);
    // Env beats file; untouched fields keep the file or default value.
    assert_eq!(config.matching.match_threshold, 90);
    assert_eq!(config.matching.grace_period_secs, 30);
    assert_eq!(config.matching.room_code_length, 8);
}

#[test]
fn test_malformed_file() {
    let path = temp_config("malformed", "{ not json");
    let err = ServerConfig::from_file(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, CoreError::Serialization(_)));
}

#[test]
fn test_file_values_are_validated() {
    let path = temp_config("zero-code", r#"{"matching":{"room_code_length":0}}"#);
    let err = ServerConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, CoreError::InvalidValue { ref key, .. } if key == "matching.room_code_length"));

    // The same file is rejected when reached through the environment.
    let path_str = path.to_string_lossy().to_string();
    let err = ServerConfig::from_lookup(|key| (key == CONFIG_PATH_VAR).then(|| path_str.clone()))
        .unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, CoreError::InvalidValue { .. }));

    let path = temp_config("zero-sweep", r#"{"sweep_interval_ms":0}"#);
    let err = ServerConfig::from_file(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, CoreError::InvalidValue { ref key, .. } if key == "sweep_interval_ms"));
}
