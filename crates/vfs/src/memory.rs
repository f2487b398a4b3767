// SPDX-License-Identifier: Apache-2.0

//! In-memory backend: process-local, volatile, accepts any byte payload
//! (spec §4.2 "in-memory (process-local map; volatile; accepts any
//! object)").

use crate::backend::{sorted_entries, Backend, Entry};
use crate::error::Error;
use crate::register_backend;
use openhcs_core::backend::BackendId;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct MemoryBackend {
    store: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn id(&self) -> BackendId {
        BackendId::Memory
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn save(&self, path: &str, data: &[u8]) -> Result<(), Error> {
        self.store.write().expect("memory backend lock poisoned").insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.store
            .read()
            .expect("memory backend lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound { path: path.to_string(), backend: self.id() })
    }

    fn list(&self, dir: &str, recursive: bool, extensions: Option<&[&str]>) -> Result<Vec<Entry>, Error> {
        let prefix = normalize_dir(dir);
        let store = self.store.read().expect("memory backend lock poisoned");
        let entries = store
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
        Ok(self.store.read().expect("memory backend lock poisoned").contains_key(path))
    }

    fn ensure_directory(&self, _path: &str) -> Result<(), Error> {
        // No on-disk directories to create; memory paths are just keys.
        Ok(())
    }

    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error> {
        let mut store = self.store.write().expect("memory backend lock poisoned");
        let data = store
            .remove(src)
            .ok_or_else(|| Error::NotFound { path: src.to_string(), backend: self.id() })?;
        let _ = store.insert(dst.to_string(), data);
        Ok(())
    }

    fn mirror_directory(&self, src: &str, dst: &str) -> Result<(), Error> {
        let src_prefix = normalize_dir(src);
        let dst_prefix = normalize_dir(dst);
        let mut store = self.store.write().expect("memory backend lock poisoned");
        let matches: Vec<(String, Vec<u8>)> = store
            .iter()
            .filter(|(path, _)| path.starts_with(&src_prefix))
            .map(|(path, data)| (path.clone(), data.clone()))
            .collect();
        for (path, data) in matches {
            let rest = &path[src_prefix.len()..];
            let _ = store.insert(format!("{dst_prefix}{rest}"), data);
        }
        Ok(())
    }
}

fn normalize_dir(dir: &str) -> String {
    if dir.is_empty() || dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

register_backend!(MEMORY_BACKEND_FACTORY, BackendId::Memory, || {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    Ok(backend)
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let backend = MemoryBackend::new();
        backend.save("/plate/A01_s1_w1.tif", b"data").unwrap();
        assert_eq!(backend.load("/plate/A01_s1_w1.tif").unwrap(), b"data");
    }

    #[test]
    fn load_missing_path_fails_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.load("/missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn list_is_naturally_sorted_and_non_recursive_by_default() {
        let backend = MemoryBackend::new();
        backend.save("/plate/s10.tif", b"a").unwrap();
        backend.save("/plate/s2.tif", b"b").unwrap();
        backend.save("/plate/nested/s1.tif", b"c").unwrap();

        let entries = backend.list("/plate", false, None).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/plate/s2.tif", "/plate/s10.tif"]);
    }

    #[test]
    fn list_recursive_includes_nested_entries() {
        let backend = MemoryBackend::new();
        backend.save("/plate/s1.tif", b"a").unwrap();
        backend.save("/plate/nested/s2.tif", b"b").unwrap();

        let entries = backend.list("/plate", true, None).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
