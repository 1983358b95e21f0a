// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, the JSON config
//! file, then `FACEWATCH_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};

use crate::model::FacewatchConfig;

/// Config sections addressable from the environment.
///
/// `face_detection` is listed before anything it could shadow.
const ENV_SECTIONS: &[&str] = &[
    "face_detection",
    "media",
    "storage",
    "session",
    "embedder",
    "gateway",
    "log",
    "debug",
];

/// Load configuration from a JSON file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FacewatchConfig, figment::Error> {
    build_figment(path).extract()
}

/// Load configuration from a JSON string only (no env overrides).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(json: &str) -> Result<FacewatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FacewatchConfig::default()))
        .merge(Json::string(json))
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FacewatchConfig::default()))
        .merge(Json::file(path))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit section mapping.
///
/// Uses a section table instead of `Env::split("_")` because key names
/// contain underscores: `FACEWATCH_FACE_DETECTION_MIN_MATCHING_FACES` must
/// map to `face_detection.min_matching_faces`.
fn env_provider() -> Env {
    Env::prefixed("FACEWATCH_").map(|key| {
        let key_str = key.as_str();
        for section in ENV_SECTIONS {
            if let Some(field) = key_str
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return format!("{section}.{field}").into();
            }
        }
        key_str.to_string().into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.json",
                r#"{"face_detection": {"min_matching_faces": 3}, "gateway": {"port": 9000}}"#,
            )?;
            jail.set_env("FACEWATCH_FACE_DETECTION_MIN_MATCHING_FACES", "4");
            jail.set_env("FACEWATCH_LOG_LEVEL", "debug");

            let config = load_config_from_path(Path::new("config.json"))?;
            assert_eq!(config.face_detection.min_matching_faces, 4);
            assert_eq!(config.gateway.port, 9000);
            assert_eq!(config.log.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn string_loader_applies_defaults() {
        let config = load_config_from_str(r#"{"input_groups": ["g1@g.us"]}"#).unwrap();
        assert_eq!(config.input_groups, vec!["g1@g.us"]);
        assert_eq!(config.media.live_recency_secs, 300);
    }
}
