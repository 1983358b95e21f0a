// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading from disk.

use std::path::Path;

use facewatch_config::{ConfigError, load_and_validate, load_and_validate_str};

const FULL_CONFIG: &str = r#"{
    "input_groups": ["120363000000000001@g.us"],
    "destinations": {
        "ann": {"name": "Ann", "group": "120363000000000010@g.us"},
        "ben": {"name": "Ben", "group": "15551234567"}
    },
    "media": {
        "allowed_extensions": [".jpg", ".jpeg", ".png"],
        "store_path": "store/media"
    },
    "face_detection": {
        "known_faces_dir": "known_faces",
        "confidence_threshold": 0.5,
        "model": "hog",
        "min_matching_faces": 2
    },
    "debug": {"enabled": true, "output_dir": "debug_output"}
}"#;

#[test]
fn full_config_loads() {
    let config = load_and_validate_str(FULL_CONFIG).expect("config should be valid");
    assert_eq!(config.input_groups.len(), 1);
    assert_eq!(config.destinations.len(), 2);
    assert_eq!(config.destinations["ann"].name, "Ann");
    assert_eq!(config.face_detection.confidence_threshold, 0.5);
    assert!(config.debug.enabled);
    // Sections absent from the file keep their defaults.
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.storage.archive_path, "store/messages.db");
}

#[test]
fn unknown_key_suggests_correction() {
    let errors = load_and_validate_str(r#"{"media": {"stor_path": "x"}}"#).unwrap_err();
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("store_path"));
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let errors = load_and_validate_str(r#"{"input_group": []}"#).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::UnknownKey { key, .. } if key == "input_group"));
}

#[test]
fn wrong_type_is_reported() {
    let errors =
        load_and_validate_str(r#"{"face_detection": {"min_matching_faces": "two"}}"#).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn malformed_json_is_an_error() {
    assert!(load_and_validate_str(r#"{"input_groups": ["#).is_err());
}

#[test]
fn missing_file_is_fatal() {
    let errors = load_and_validate(Path::new("/nonexistent/facewatch/config.json")).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::MissingFile { .. }));
}

#[test]
#[serial_test::serial]
fn loads_from_file_with_source_span() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{\n  \"gateway\": {\n    \"prot\": 8081\n  }\n}\n").unwrap();

    let errors = load_and_validate(&path).unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "prot");
            assert_eq!(suggestion.as_deref(), Some("port"));
            assert!(span.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
#[serial_test::serial]
fn loads_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_and_validate(&path).unwrap();
    assert_eq!(config.destinations["ben"].group, "15551234567");
}
