// SPDX-License-Identifier: Apache-2.0

//! Top-level CLI error taxonomy: every subsystem error folds in here, each
//! variant mapping to one of the fixed exit codes (spec §6).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] openhcs_config::Error),

    #[error("backend discovery error: {0}")]
    #[diagnostic(transparent)]
    Discovery(#[from] openhcs_discovery::Error),

    #[error("backend discovery error: {0}")]
    #[diagnostic(transparent)]
    Vfs(#[from] openhcs_vfs::Error),

    #[error("compilation error: {0}")]
    #[diagnostic(transparent)]
    Compile(#[from] openhcs_compiler::Error),

    #[error("run error: {0}")]
    #[diagnostic(transparent)]
    Controller(#[from] openhcs_controller::Error),

    #[error("failed to read pipeline definition `{path}`: {source}")]
    #[diagnostic(code(openhcs::cli::pipeline_load))]
    PipelineLoad {
        path: String,
        #[source]
        source: PipelineLoadError,
    },

    #[error("no subdirectory of this plate is marked as main")]
    #[diagnostic(
        code(openhcs::cli::no_main_subdirectory),
        help("run discovery once to generate plate metadata with exactly one main subdirectory")
    )]
    NoMainSubdirectory,

    #[error("one or more units failed: {}", .failed.join(", "))]
    #[diagnostic(code(openhcs::cli::units_failed))]
    UnitsFailed { failed: Vec<String> },
}

#[derive(Debug, Error)]
pub enum PipelineLoadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported pipeline file extension: {0}")]
    UnsupportedExtension(String),
}

impl Error {
    /// The process exit code this error maps to (spec §6).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Compile(_) => 2,
            Error::UnitsFailed { .. } => 3,
            Error::Config(_) | Error::PipelineLoad { .. } => 4,
            Error::Discovery(_) | Error::Vfs(_) | Error::NoMainSubdirectory => 5,
            Error::Controller(_) => 3,
        }
    }
}
