// SPDX-License-Identifier: Apache-2.0

//! Remote-object virtual backend (spec §4.2): generates paths against a
//! remote object store. `object_store`'s client is async; the [`Backend`]
//! trait is kept synchronous so the executor's OS-thread workers never need
//! to be tokio runtime threads themselves (spec §5 "Workers are OS-level
//! processes"). This backend owns a small dedicated `tokio::Runtime` and
//! blocks on it per call, the same tradeoff `otap-df`'s `reqwest`-backed
//! exporters make when called from a non-async context.

use crate::backend::{sorted_entries, Backend, Entry};
use crate::error::Error;
use crate::register_backend;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use openhcs_core::backend::BackendId;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Root directory the registry-constructed remote-object backend stores
/// under when `OPENHCS_REMOTE_OBJECT_ROOT` is unset. A local filesystem
/// store stands in for a real object store here (spec §4.2's remote-object
/// backend only has to generate paths from metadata, not hit any specific
/// cloud provider); pointing it at a real bucket is a config concern for
/// whichever `StorageType` this registry factory is extended to support,
/// the way the teacher's own `object_store.rs` dispatches on a
/// `StorageType` enum.
const REMOTE_OBJECT_ROOT_VAR: &str = "OPENHCS_REMOTE_OBJECT_ROOT";

pub struct RemoteObjectBackend {
    store: Arc<dyn ObjectStore>,
    runtime: Runtime,
}

impl RemoteObjectBackend {
    /// # Panics
    /// Panics if a dedicated tokio runtime cannot be created; this mirrors
    /// the teacher's own startup-time `expect`s for infrastructure that
    /// must exist for the process to do anything useful.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        let runtime = Runtime::new().expect("failed to start remote-object backend runtime");
        Self { store, runtime }
    }

    fn object_err(&self, path: &str, source: object_store::Error) -> Error {
        Error::ObjectStore { path: path.to_string(), source }
    }
}

impl Backend for RemoteObjectBackend {
    fn id(&self) -> BackendId {
        BackendId::RemoteObject
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn save(&self, path: &str, data: &[u8]) -> Result<(), Error> {
        let object_path = ObjectPath::from(path.trim_start_matches('/'));
        let payload = PutPayload::from(data.to_vec());
        self.runtime
            .block_on(self.store.put(&object_path, payload))
            .map(|_| ())
            .map_err(|e| self.object_err(path, e))
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, Error> {
        let object_path = ObjectPath::from(path.trim_start_matches('/'));
        self.runtime.block_on(async {
            let result = self.store.get(&object_path).await.map_err(|e| self.object_err(path, e))?;
            let bytes = result.bytes().await.map_err(|e| self.object_err(path, e))?;
            Ok(bytes.to_vec())
        })
    }

    fn list(&self, dir: &str, recursive: bool, extensions: Option<&[&str]>) -> Result<Vec<Entry>, Error> {
        use futures::StreamExt;
        let prefix = ObjectPath::from(dir.trim_start_matches('/'));
        let entries = self.runtime.block_on(async {
            let mut stream = if recursive {
                self.store.list(Some(&prefix))
            } else {
                // `object_store::list_with_delimiter` separates common
                // prefixes from leaf objects for a one-level listing.
                let listing = self.store.list_with_delimiter(Some(&prefix)).await.map_err(|e| self.object_err(dir, e))?;
                let paths: Vec<String> = listing.objects.into_iter().map(|o| format!("/{}", o.location)).collect();
                return Ok::<_, Error>(paths);
            };
            let mut paths = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| self.object_err(dir, e))?;
                paths.push(format!("/{}", meta.location));
            }
            Ok(paths)
        })?;

        let filtered = entries
            .into_iter()
            .filter(|path| match extensions {
                None => true,
                Some(exts) => exts.iter().any(|ext| path.ends_with(ext)),
            })
            .map(|path| Entry { path, is_dir: false })
            .collect();
        Ok(sorted_entries(filtered))
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        let object_path = ObjectPath::from(path.trim_start_matches('/'));
        match self.runtime.block_on(self.store.head(&object_path)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.object_err(path, e)),
        }
    }

    fn ensure_directory(&self, _path: &str) -> Result<(), Error> {
        // Object stores have no directory concept; prefixes come into
        // existence implicitly when an object is written under them.
        Ok(())
    }

    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error> {
        let from = ObjectPath::from(src.trim_start_matches('/'));
        let to = ObjectPath::from(dst.trim_start_matches('/'));
        self.runtime.block_on(self.store.rename(&from, &to)).map_err(|e| self.object_err(src, e))
    }

    fn mirror_directory(&self, src: &str, dst: &str) -> Result<(), Error> {
        let data = self.load(src)?;
        self.save(dst, &data)
    }
}

register_backend!(REMOTE_OBJECT_BACKEND_FACTORY, BackendId::RemoteObject, || {
    let root = std::env::var(REMOTE_OBJECT_ROOT_VAR)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("openhcs-remote-object"));
    std::fs::create_dir_all(&root).map_err(|source| Error::Io { path: root.display().to_string(), source })?;
    let store = LocalFileSystem::new_with_prefix(&root)
        .map_err(|source| Error::ObjectStore { path: root.display().to_string(), source })?;
    let backend: Arc<dyn Backend> = Arc::new(RemoteObjectBackend::new(Arc::new(store)));
    Ok(backend)
});

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn backend() -> RemoteObjectBackend {
        RemoteObjectBackend::new(Arc::new(InMemory::new()))
    }

    #[test]
    fn save_then_load_round_trips() {
        let backend = backend();
        backend.save("/plate/A01_s1_w1.tif", b"data").unwrap();
        assert_eq!(backend.load("/plate/A01_s1_w1.tif").unwrap(), b"data");
    }

    #[test]
    fn exists_reflects_writes() {
        let backend = backend();
        assert!(!backend.exists("/plate/a.tif").unwrap());
        backend.save("/plate/a.tif", b"x").unwrap();
        assert!(backend.exists("/plate/a.tif").unwrap());
    }

    #[test]
    fn list_returns_natural_order() {
        let backend = backend();
        backend.save("/plate/s10.tif", b"a").unwrap();
        backend.save("/plate/s2.tif", b"b").unwrap();
        let entries = backend.list("/plate", true, None).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/plate/s2.tif", "/plate/s10.tif"]);
    }
}
