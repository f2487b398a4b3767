// SPDX-License-Identifier: Apache-2.0

use miette::Diagnostic;
use openhcs_core::backend::BackendId;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("path not found: {path} (backend {backend})")]
    #[diagnostic(code(openhcs::vfs::not_found))]
    NotFound { path: String, backend: BackendId },

    #[error("backend `{id}` is not registered")]
    #[diagnostic(
        code(openhcs::vfs::unknown_backend),
        help("check that the backend's module is compiled in and its registration ran")
    )]
    UnknownBackend { id: String },

    #[error("backend `{backend}` cannot write real paths: plate is virtual-only")]
    #[diagnostic(
        code(openhcs::vfs::virtual_only_write),
        help("select a storage-family backend as the materialization backend for this plate")
    )]
    VirtualOnlyWrite { backend: BackendId },

    #[error("data kind mismatch writing to {path} via {backend}: {message}")]
    #[diagnostic(code(openhcs::vfs::kind_mismatch))]
    KindMismatch {
        path: String,
        backend: BackendId,
        message: String,
    },

    #[error("i/o error at {path}: {source}")]
    #[diagnostic(code(openhcs::vfs::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("object store error at {path}: {source}")]
    #[diagnostic(code(openhcs::vfs::object_store))]
    ObjectStore {
        path: String,
        #[source]
        source: object_store::Error,
    },

    #[error("chunked store error: {0}")]
    #[diagnostic(code(openhcs::vfs::chunked_store))]
    ChunkedStore(String),

    #[error("serialization error: {0}")]
    #[diagnostic(code(openhcs::vfs::serde))]
    Serde(#[from] serde_json::Error),
}
