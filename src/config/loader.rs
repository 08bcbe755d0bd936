// Copyright 2025 The Shelf Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration loading with automatic environment variable interpolation.
//!
//! Loading runs four steps: read the file, interpolate `${...}` references,
//! parse (YAML first, JSON as fallback), then validate — unknown fields on
//! the raw document, cross-field rules on the typed config.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use super::env_interpolation::{self, InterpolationError};
use super::types::ShelfServerConfig;
use super::validation;

/// Unified error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("environment variable interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("failed to parse config file '{path}': YAML error: {yaml_err}, JSON error: {json_err}")]
    Parse {
        path: String,
        yaml_err: String,
        json_err: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

/// Wrapper keeping unknown-field and cross-field failures in one variant.
#[derive(Debug, thiserror::Error)]
pub enum ValidationFailure {
    #[error("{0}")]
    UnknownFields(#[from] validation::ValidationError),

    #[error("{0}")]
    Invalid(#[from] anyhow::Error),
}

/// Deserialize YAML with environment variable interpolation.
pub fn from_yaml_str<T: DeserializeOwned>(s: &str) -> Result<T, ConfigError> {
    let interpolated = env_interpolation::interpolate(s)?;
    Ok(serde_yaml::from_str(&interpolated)?)
}

/// Deserialize JSON with environment variable interpolation.
pub fn from_json_str<T: DeserializeOwned>(s: &str) -> Result<T, ConfigError> {
    let interpolated = env_interpolation::interpolate(s)?;
    Ok(serde_json::from_str(&interpolated)?)
}

/// Load and validate a [`ShelfServerConfig`] from a YAML or JSON file.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<ShelfServerConfig, ConfigError> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref)?;
    let interpolated = env_interpolation::interpolate(&content)?;

    let document = match serde_yaml::from_str::<serde_yaml::Value>(&interpolated) {
        Ok(value) => value,
        Err(yaml_err) => match serde_json::from_str::<serde_yaml::Value>(&interpolated) {
            Ok(value) => value,
            Err(json_err) => {
                return Err(ConfigError::Parse {
                    path: path_ref.display().to_string(),
                    yaml_err: yaml_err.to_string(),
                    json_err: json_err.to_string(),
                });
            }
        },
    };

    validation::check_unknown_fields(&document).map_err(ValidationFailure::from)?;

    let config: ShelfServerConfig = serde_yaml::from_value(document)?;
    config
        .validate()
        .map_err(ValidationFailure::from)?;

    Ok(config)
}

/// Save a configuration to a file in YAML format.
///
/// Environment variable references are not preserved; the interpolated
/// values current at load time are written out.
pub fn save_config_file<P: AsRef<Path>>(
    config: &ShelfServerConfig,
    path: P,
) -> Result<(), ConfigError> {
    let content = serde_yaml::to_string(config)?;
    Ok(fs::write(path, content)?)
}
