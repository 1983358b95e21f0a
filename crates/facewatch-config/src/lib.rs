// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for facewatch.
//!
//! Provides JSON configuration parsing with strict validation
//! (`deny_unknown_fields`), environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! let config = facewatch_config::load_and_validate(Path::new("config.json"))
//!     .expect("config errors");
//! println!("monitoring {} groups", config.input_groups.len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config_from_path, load_config_from_str};
pub use model::{DestinationConfig, FacewatchConfig};
pub use validation::{validate_config, validate_reference_dirs};

/// Load configuration from a JSON file and validate it.
///
/// A missing file is an error: there is no useful default deployment.
pub fn load_and_validate(path: &Path) -> Result<FacewatchConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::MissingFile {
            path: path.display().to_string(),
        }]);
    }

    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a JSON string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(json: &str) -> Result<FacewatchConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(json) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), json.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}
