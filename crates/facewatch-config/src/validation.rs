// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All checks collect every error instead of failing fast, so an operator
//! sees the full list in one run.

use crate::diagnostic::ConfigError;
use crate::model::FacewatchConfig;

fn invalid(errors: &mut Vec<ConfigError>, message: String) {
    errors.push(ConfigError::Validation { message });
}

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FacewatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let threshold = config.face_detection.confidence_threshold;
    if !threshold.is_finite() || threshold <= 0.0 {
        invalid(
            &mut errors,
            format!("face_detection.confidence_threshold must be a positive distance, got {threshold}"),
        );
    }

    if config.face_detection.min_matching_faces < 1 {
        invalid(
            &mut errors,
            "face_detection.min_matching_faces must be at least 1".to_string(),
        );
    }

    if config.face_detection.max_concurrent < 1 {
        invalid(
            &mut errors,
            "face_detection.max_concurrent must be at least 1".to_string(),
        );
    }

    for (field, value) in [
        ("media.store_path", &config.media.store_path),
        ("storage.archive_path", &config.storage.archive_path),
        ("face_detection.known_faces_dir", &config.face_detection.known_faces_dir),
    ] {
        if value.trim().is_empty() {
            invalid(&mut errors, format!("{field} must not be empty"));
        }
    }

    if config.media.allowed_extensions.is_empty() {
        invalid(
            &mut errors,
            "media.allowed_extensions must list at least one extension".to_string(),
        );
    }

    for (key, dest) in &config.destinations {
        if key.trim().is_empty() || key.contains(['/', '\\']) {
            invalid(
                &mut errors,
                format!("destination key `{key}` must be a plain directory name"),
            );
        }
        if dest.name.trim().is_empty() {
            invalid(&mut errors, format!("destinations.{key}.name must not be empty"));
        }
        if dest.group.trim().is_empty() {
            invalid(&mut errors, format!("destinations.{key}.group must not be empty"));
        }
    }

    for (i, group) in config.input_groups.iter().enumerate() {
        if group.trim().is_empty() {
            invalid(&mut errors, format!("input_groups[{i}] must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that every configured identity has a reference image directory.
///
/// Run at startup, after [`validate_config`]; a missing directory is fatal.
pub fn validate_reference_dirs(config: &FacewatchConfig) -> Result<(), Vec<ConfigError>> {
    let errors: Vec<ConfigError> = config
        .destinations
        .keys()
        .map(|key| config.reference_dir(key))
        .filter(|dir| !dir.is_dir())
        .map(|dir| ConfigError::Validation {
            message: format!("reference directory `{}` does not exist", dir.display()),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
