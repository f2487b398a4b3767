// SPDX-License-Identifier: Apache-2.0

//! The `Backend` trait every storage/virtual backend implements (spec
//! §4.2). Paths are plate-relative POSIX strings; two backends may share
//! path strings by design (location transparency).

use crate::error::Error;
use openhcs_core::backend::{BackendFamily, BackendId};

/// One listed directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub is_dir: bool,
}

/// Uniform, location-transparent I/O over one storage implementation.
///
/// Implementors choose what `Data` means to them (raw bytes for disk/
/// memory, a structured array for zarr); `save`/`load` take/return
/// `serde_json::Value`-wrapped payloads so the trait stays object-safe
/// across heterogeneous backends, matching the way the compiler and
/// executor pass data across the VFS boundary without knowing which
/// concrete backend is in play.
pub trait Backend: Send + Sync {
    /// The stable identity this backend is registered under.
    fn id(&self) -> BackendId;

    /// Exposes the concrete backend for callers that need backend-specific
    /// operations beyond this trait, e.g. the executor declaring chunk
    /// layout on a [`crate::zarr::ZarrBackend`] before writing to it.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Which family this backend belongs to.
    fn family(&self) -> BackendFamily {
        self.id().family()
    }

    fn save(&self, path: &str, data: &[u8]) -> Result<(), Error>;
    fn load(&self, path: &str) -> Result<Vec<u8>, Error>;

    fn save_batch(&self, items: &[(&str, &[u8])]) -> Result<(), Error> {
        for (path, data) in items {
            self.save(path, data)?;
        }
        Ok(())
    }

    fn load_batch(&self, paths: &[&str]) -> Result<Vec<Vec<u8>>, Error> {
        paths.iter().map(|p| self.load(p)).collect()
    }

    /// Lists entries in `dir`, sorted in natural order (spec §4.2).
    fn list(&self, dir: &str, recursive: bool, extensions: Option<&[&str]>) -> Result<Vec<Entry>, Error>;

    fn exists(&self, path: &str) -> Result<bool, Error>;
    fn ensure_directory(&self, path: &str) -> Result<(), Error>;
    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error>;
    fn mirror_directory(&self, src: &str, dst: &str) -> Result<(), Error>;
}

pub(crate) fn sorted_entries(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| crate::natural_sort::natural_cmp(&a.path, &b.path));
    entries
}
