// SPDX-License-Identifier: Apache-2.0

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("no images found under `{root}` with extensions {extensions:?}")]
    #[diagnostic(code(openhcs::discovery::no_images_found))]
    NoImagesFound { root: String, extensions: Vec<String> },

    #[error("filename `{filename}` did not match parser `{parser}`")]
    #[diagnostic(code(openhcs::discovery::filename_unparseable))]
    FilenameUnparseable { filename: String, parser: String },

    #[error("plate metadata file missing at `{path}`")]
    #[diagnostic(
        code(openhcs::discovery::metadata_missing),
        help("run discovery once to generate plate metadata before compiling")
    )]
    MetadataMissing { path: String },

    #[error("unknown microscope handler: {name}")]
    #[diagnostic(code(openhcs::discovery::unknown_microscope_type))]
    UnknownMicroscopeType { name: String },

    #[error(
        "group_by `{component}` key mismatch for unit `{unit}`: expected {expected:?}, found {found:?}"
    )]
    #[diagnostic(
        code(openhcs::discovery::group_by_mismatch),
        help("every declared group_by value must have at least one matching file for this unit")
    )]
    GroupByMismatch {
        unit: String,
        component: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("vfs error: {0}")]
    #[diagnostic(transparent)]
    Vfs(#[from] openhcs_vfs::Error),

    #[error("serialization error: {0}")]
    #[diagnostic(code(openhcs::discovery::serde))]
    Serde(#[from] serde_json::Error),
}
