// SPDX-License-Identifier: Apache-2.0

//! Backend identity: the enumeration of storage backends, split into the two
//! disjoint families defined in spec §3/§4.2.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two disjoint backend families a [`BackendId`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BackendFamily {
    /// Backends with real path semantics: data actually lives at the path.
    Storage,
    /// Backends that generate paths from metadata; no filesystem of their own.
    Virtual,
}

/// Identity of a registered storage or virtual backend.
///
/// The registry (spec §4.2) is keyed by the string form of this id so that
/// plugins can register under names unknown at compile time; the enum here
/// covers the backends this workspace ships, `Other` covers anything a
/// plugin registers under a fresh name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Process-local, volatile, in-memory backend.
    Memory,
    /// Local disk backend with atomic same-filesystem renames.
    Disk,
    /// Chunked columnar N-D array store (OME-ZARR-HCS-compatible layout).
    Zarr,
    /// Virtual backend translating plate-relative paths to nested real paths.
    WorkspaceMapping,
    /// Virtual backend generating paths against a remote object store.
    RemoteObject,
    /// A backend registered under a name not known to this crate.
    Other(String),
}

impl BackendId {
    /// The family this backend belongs to.
    #[must_use]
    pub fn family(&self) -> BackendFamily {
        match self {
            BackendId::Memory | BackendId::Disk | BackendId::Zarr => BackendFamily::Storage,
            BackendId::WorkspaceMapping | BackendId::RemoteObject => BackendFamily::Virtual,
            // Plugin-registered backends declare their own family at
            // registration time; treated as Storage by default here since
            // that is the more conservative assumption for path writes.
            BackendId::Other(_) => BackendFamily::Storage,
        }
    }

    /// The stable string id used as the registry key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            BackendId::Memory => "memory",
            BackendId::Disk => "disk",
            BackendId::Zarr => "zarr",
            BackendId::WorkspaceMapping => "workspace_mapping",
            BackendId::RemoteObject => "remote_object",
            BackendId::Other(name) => name,
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        match s {
            "memory" => BackendId::Memory,
            "disk" => BackendId::Disk,
            "zarr" => BackendId::Zarr,
            "workspace_mapping" => BackendId::WorkspaceMapping,
            "remote_object" => BackendId::RemoteObject,
            other => BackendId::Other(other.to_string()),
        }
    }
}
