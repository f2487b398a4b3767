// SPDX-License-Identifier: Apache-2.0

//! Local disk backend: standard image files on the host filesystem, with
//! atomic same-filesystem renames (spec §4.2).

use crate::backend::{sorted_entries, Backend, Entry};
use crate::error::Error;
use crate::register_backend;
use openhcs_core::backend::BackendId;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn io_err(&self, path: &str, source: std::io::Error) -> Error {
        Error::Io { path: path.to_string(), source }
    }
}

impl Default for DiskBackend {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("openhcs"))
    }
}

impl Backend for DiskBackend {
    fn id(&self) -> BackendId {
        BackendId::Disk
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn save(&self, path: &str, data: &[u8]) -> Result<(), Error> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(path, e))?;
        }
        // Write to a sibling temp file and rename, so a crash mid-write
        // never leaves a partial file at `path` (same-filesystem atomic
        // rename, per spec §4.2).
        let tmp = full.with_extension("tmp-write");
        fs::write(&tmp, data).map_err(|e| self.io_err(path, e))?;
        fs::rename(&tmp, &full).map_err(|e| self.io_err(path, e))?;
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, Error> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound { path: path.to_string(), backend: self.id() }
            } else {
                self.io_err(path, e)
            }
        })
    }

    fn list(&self, dir: &str, recursive: bool, extensions: Option<&[&str]>) -> Result<Vec<Entry>, Error> {
        let full = self.resolve(dir);
        let mut entries = Vec::new();
        collect(&full, &self.root, recursive, extensions, &mut entries).map_err(|e| self.io_err(dir, e))?;
        Ok(sorted_entries(entries))
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        Ok(self.resolve(path).exists())
    }

    fn ensure_directory(&self, path: &str) -> Result<(), Error> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| self.io_err(path, e))
    }

    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error> {
        let full_src = self.resolve(src);
        let full_dst = self.resolve(dst);
        if let Some(parent) = full_dst.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(dst, e))?;
        }
        fs::rename(&full_src, &full_dst).map_err(|e| self.io_err(src, e))
    }

    fn mirror_directory(&self, src: &str, dst: &str) -> Result<(), Error> {
        let full_src = self.resolve(src);
        let full_dst = self.resolve(dst);
        mirror(&full_src, &full_dst).map_err(|e| self.io_err(src, e))
    }
}

fn collect(
    dir: &Path,
    root: &Path,
    recursive: bool,
    extensions: Option<&[&str]>,
    out: &mut Vec<Entry>,
) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = path.is_dir();
        if is_dir && recursive {
            collect(&path, root, recursive, extensions, out)?;
            continue;
        }
        if is_dir {
            continue;
        }
        if let Some(exts) = extensions {
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| exts.iter().any(|want| want.trim_start_matches('.') == e))
                .unwrap_or(false);
            if !matches {
                continue;
            }
        }
        let rel = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");
        out.push(Entry { path: format!("/{rel}"), is_dir: false });
    }
    Ok(())
}

fn mirror(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            mirror(&from, &to)?;
        } else if from.is_symlink() {
            #[cfg(unix)]
            {
                let target = fs::read_link(&from)?;
                std::os::unix::fs::symlink(target, &to)?;
            }
            #[cfg(not(unix))]
            {
                fs::copy(&from, &to)?;
            }
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

register_backend!(DISK_BACKEND_FACTORY, BackendId::Disk, || {
    let backend: Arc<dyn Backend> = Arc::new(DiskBackend::default());
    Ok(backend)
});
