// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration handling

use photobooth::Config;

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert!(config.local_archive, "Local archive should be on by default");
    assert_eq!(config.collage_shots, 4);
    assert_eq!(config.countdown_seconds, 3);
    assert_eq!(config.poll_period_ms, 100);
    assert_eq!(config.oauth_refresh_period_ms, 1_800_000);
}

#[test]
fn test_config_load_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configuration.json");
    std::fs::write(
        &path,
        r#"{
            "enable_upload": false,
            "countdown_seconds": 5,
            "collage_shots": 3,
            "some_future_key": "ignored"
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert!(!config.enable_upload);
    assert_eq!(config.countdown_seconds, 5);
    assert_eq!(config.collage_shots, 3);
    // keys absent from the file keep their defaults
    assert!(config.enable_email);
    assert!(config.local_archive);
}

#[test]
fn test_config_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configuration.json");

    let mut config = Config::default();
    config.enable_print = true;
    config.album_id = Some("kiosk-album".to_string());
    config.store(&path).unwrap();

    let reloaded = Config::load(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_config_load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(&dir.path().join("nope.json")).is_err());
}
