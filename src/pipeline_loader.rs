// SPDX-License-Identifier: Apache-2.0

//! Loads a [`PipelineDefinition`] (the step list) from a YAML or JSON file,
//! dispatched on extension the same way `openhcs_config::loader` loads
//! `GlobalConfig`/`PipelineConfig` documents. Kept local to the binary
//! since the config crate only ever loads the config-override records, not
//! the step list itself.

use crate::error::{Error, PipelineLoadError};
use openhcs_core::step::PipelineDefinition;
use std::path::Path;

pub fn load_pipeline_definition(path: impl AsRef<Path>) -> Result<PipelineDefinition, Error> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| Error::PipelineLoad {
        path: path.display().to_string(),
        source: PipelineLoadError::Io(e),
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents).map_err(|e| Error::PipelineLoad {
            path: path.display().to_string(),
            source: PipelineLoadError::Yaml(e),
        }),
        Some("json") => serde_json::from_str(&contents).map_err(|e| Error::PipelineLoad {
            path: path.display().to_string(),
            source: PipelineLoadError::Json(e),
        }),
        other => Err(Error::PipelineLoad {
            path: path.display().to_string(),
            source: PipelineLoadError::UnsupportedExtension(other.unwrap_or_default().to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_pipeline_from_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
steps:
  - name: blur
    function_pattern:
      name: blur
      memory_type: [cpu, cpu]
    variable_components: [site]
"#
        )
        .unwrap();
        let pipeline = load_pipeline_definition(file.path()).unwrap();
        assert_eq!(pipeline.steps.len(), 1);
        assert_eq!(pipeline.steps[0].name, "blur");
    }

    #[test]
    fn rejects_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "steps = []").unwrap();
        let err = load_pipeline_definition(file.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::PipelineLoad { source: PipelineLoadError::UnsupportedExtension(_), .. }
        ));
    }
}
