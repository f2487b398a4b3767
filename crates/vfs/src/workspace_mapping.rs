// SPDX-License-Identifier: Apache-2.0

//! Workspace-mapping virtual backend (spec §4.2, §4.3 `build_virtual_mapping`):
//! translates plate-relative virtual paths to nested real paths for
//! microscope layouts that are not naturally flat. No file is copied or
//! symlinked — reads/writes are redirected through the map to whatever
//! backend actually owns the real path.

use crate::backend::{sorted_entries, Backend, Entry};
use crate::error::Error;
use indexmap::IndexMap;
use openhcs_core::backend::BackendId;
use std::sync::{Arc, RwLock};

pub struct WorkspaceMappingBackend {
    /// Virtual path -> (real path, backend that owns the real path).
    mapping: RwLock<IndexMap<String, (String, Arc<dyn Backend>)>>,
}

impl WorkspaceMappingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self { mapping: RwLock::new(IndexMap::new()) }
    }

    /// Registers one virtual-to-real path translation. Called by discovery
    /// when it builds a plate's virtual mapping (spec §4.3).
    pub fn map_path(&self, virtual_path: &str, real_path: &str, owner: Arc<dyn Backend>) {
        self.mapping
            .write()
            .expect("workspace mapping lock poisoned")
            .insert(virtual_path.to_string(), (real_path.to_string(), owner));
    }

    fn resolve(&self, virtual_path: &str) -> Result<(String, Arc<dyn Backend>), Error> {
        self.mapping
            .read()
            .expect("workspace mapping lock poisoned")
            .get(virtual_path)
            .cloned()
            .ok_or_else(|| Error::NotFound { path: virtual_path.to_string(), backend: self.id() })
    }
}

impl Default for WorkspaceMappingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for WorkspaceMappingBackend {
    fn id(&self) -> BackendId {
        BackendId::WorkspaceMapping
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn save(&self, _path: &str, _data: &[u8]) -> Result<(), Error> {
        // Virtual backends generate paths from metadata; they have no
        // filesystem of their own to write real bytes to (spec §4.2).
        Err(Error::VirtualOnlyWrite { backend: self.id() })
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, Error> {
        let (real_path, owner) = self.resolve(path)?;
        owner.load(&real_path)
    }

    fn list(&self, dir: &str, recursive: bool, extensions: Option<&[&str]>) -> Result<Vec<Entry>, Error> {
        let prefix = if dir.ends_with('/') { dir.to_string() } else { format!("{dir}/") };
        let mapping = self.mapping.read().expect("workspace mapping lock poisoned");
        let entries = mapping
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .filter(|path| {
                let rest = &path[prefix.len()..];
                recursive || !rest.contains('/')
            })
            .filter(|path| match extensions {
                None => true,
                Some(exts) => exts.iter().any(|ext| path.ends_with(ext)),
            })
            .map(|path| Entry { path: path.clone(), is_dir: false })
            .collect();
        Ok(sorted_entries(entries))
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        Ok(self.mapping.read().expect("workspace mapping lock poisoned").contains_key(path))
    }

    fn ensure_directory(&self, _path: &str) -> Result<(), Error> {
        // There is no real directory to create behind a virtual path.
        Ok(())
    }

    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error> {
        let mut mapping = self.mapping.write().expect("workspace mapping lock poisoned");
        let entry = mapping
            .shift_remove(src)
            .ok_or_else(|| Error::NotFound { path: src.to_string(), backend: self.id() })?;
        let _ = mapping.insert(dst.to_string(), entry);
        Ok(())
    }

    fn mirror_directory(&self, _src: &str, _dst: &str) -> Result<(), Error> {
        Err(Error::VirtualOnlyWrite { backend: self.id() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    #[test]
    fn load_follows_mapping_to_owning_backend() {
        let owner: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        owner.save("/real/TimePoint_1/ZStep_1/A01_s1_w1.tif", b"data").unwrap();

        let vfs = WorkspaceMappingBackend::new();
        vfs.map_path(
            "/A01_s1_w1.tif",
            "/real/TimePoint_1/ZStep_1/A01_s1_w1.tif",
            Arc::clone(&owner),
        );

        assert_eq!(vfs.load("/A01_s1_w1.tif").unwrap(), b"data");
    }

    #[test]
    fn save_is_rejected_on_virtual_backend() {
        let vfs = WorkspaceMappingBackend::new();
        assert!(matches!(vfs.save("/x", b"y").unwrap_err(), Error::VirtualOnlyWrite { .. }));
    }

    #[test]
    fn list_is_computed_from_stored_map() {
        let owner: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        let vfs = WorkspaceMappingBackend::new();
        vfs.map_path("/A01_s2_w1.tif", "/real/a", Arc::clone(&owner));
        vfs.map_path("/A01_s1_w1.tif", "/real/b", Arc::clone(&owner));

        let entries = vfs.list("/", false, None).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/A01_s1_w1.tif", "/A01_s2_w1.tif"]);
    }
}
