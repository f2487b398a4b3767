// SPDX-License-Identifier: Apache-2.0

//! Loading [`GlobalConfig`]/[`PipelineConfig`] documents from YAML or JSON
//! files, dispatched on file extension (spec §6 `--config FILE`).

use crate::error::{Error, LoadError};
use crate::scopes::{GlobalConfig, PipelineConfig};
use serde::de::DeserializeOwned;
use std::path::Path;

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Load {
        path: path.display().to_string(),
        source: LoadError::Io(e),
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents).map_err(|e| Error::Load {
            path: path.display().to_string(),
            source: LoadError::Yaml(e),
        }),
        Some("json") => serde_json::from_str(&contents).map_err(|e| Error::Load {
            path: path.display().to_string(),
            source: LoadError::Json(e),
        }),
        other => Err(Error::Load {
            path: path.display().to_string(),
            source: LoadError::UnsupportedExtension(
                other.unwrap_or_default().to_string(),
            ),
        }),
    }
}

/// Loads and validates a [`GlobalConfig`] from a YAML or JSON file.
pub fn load_global_config(path: impl AsRef<Path>) -> Result<GlobalConfig, Error> {
    let config: GlobalConfig = load_document(path.as_ref())?;
    config.components.validate()?;
    Ok(config)
}

/// Loads a [`PipelineConfig`] overlay from a YAML or JSON file.
pub fn load_pipeline_config(path: impl AsRef<Path>) -> Result<PipelineConfig, Error> {
    load_document(path.as_ref())
}
