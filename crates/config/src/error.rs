// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the config resolver, in the teacher's
//! `thiserror` + `miette::Diagnostic` style.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("field `{field}` resolved to INHERIT at every scope in its MRO")]
    #[diagnostic(
        code(openhcs::config::unresolved_field),
        help("set a concrete value for this field at the global scope, or any enclosing scope")
    )]
    UnresolvedField { field: String },

    #[error("scope `{scope}` already present on the resolution stack")]
    #[diagnostic(
        code(openhcs::config::cycle_in_context),
        help("a scope kind cannot be pushed while already active; check for recursive pipeline composition")
    )]
    CycleInContext { scope: String },

    #[error("constraint violated: {message}")]
    #[diagnostic(code(openhcs::config::invalid_constraint))]
    InvalidConstraint { message: String },

    #[error("unknown backend id: {id}")]
    #[diagnostic(
        code(openhcs::config::unknown_backend),
        help("check the backend registry for the set of registered backend ids")
    )]
    UnknownBackend { id: String },

    #[error("unknown microscope type: {name}")]
    #[diagnostic(code(openhcs::config::unknown_microscope_type))]
    UnknownMicroscopeType { name: String },

    #[error("failed to load config file `{path}`")]
    #[diagnostic(code(openhcs::config::load_failed))]
    Load {
        path: String,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config file extension: {0}")]
    UnsupportedExtension(String),
}
