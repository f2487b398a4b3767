// SPDX-License-Identifier: Apache-2.0

//! Persistent cache of registry discovery results (spec §6 persistent
//! state layout): one JSON file per registry under an XDG-style cache dir,
//! `{cache_version, version, timestamp, items}`, invalidated on version
//! change or age.
//!
//! The VFS backend registry, the GPU device registry and the microscope
//! handler registry are all process-wide `OnceCell` singletons (spec §4.2,
//! §4.3, §4.6) with no seam to seed their result from a prior process's
//! run. This cache is therefore write-behind and observability-only: each
//! run persists what it discovered so an operator (or a future registry
//! implementation with an injection point) can inspect it, but a fresh
//! process always re-probes. Honoring `OPENHCS_DISABLE_REGISTRY_CACHE=1`
//! skips both the read and the write.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const CACHE_VERSION: u32 = 1;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 3600);
const DISABLE_ENV_VAR: &str = "OPENHCS_DISABLE_REGISTRY_CACHE";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheDocument<T> {
    cache_version: u32,
    version: String,
    timestamp: u64,
    items: T,
}

fn disabled() -> bool {
    std::env::var(DISABLE_ENV_VAR).is_ok_and(|v| v == "1")
}

fn cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("openhcs"))
}

fn cache_file(name: &str) -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(format!("{name}.json")))
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Loads a previously-cached document, discarding it if the version
/// differs or it's older than `max_age`.
pub fn load<T: DeserializeOwned>(name: &str, version: &str, max_age: Duration) -> Option<T> {
    if disabled() {
        return None;
    }
    let path = cache_file(name)?;
    let contents = std::fs::read_to_string(&path).ok()?;
    let doc: CacheDocument<T> = serde_json::from_str(&contents).ok()?;
    if doc.cache_version != CACHE_VERSION || doc.version != version {
        return None;
    }
    let age = now_unix().saturating_sub(doc.timestamp);
    if age > max_age.as_secs() {
        return None;
    }
    Some(doc.items)
}

/// Loads with the default max age (30 days).
pub fn load_default<T: DeserializeOwned>(name: &str, version: &str) -> Option<T> {
    load(name, version, DEFAULT_MAX_AGE)
}

/// Persists `items` for `name`, stamped with the current time. Failures to
/// write (missing cache dir, read-only filesystem) are logged and
/// otherwise ignored: the cache is an optimization, never load-bearing.
pub fn save<T: Serialize>(name: &str, version: &str, items: &T) {
    if disabled() {
        return;
    }
    let Some(path) = cache_file(name) else {
        return;
    };
    let doc = CacheDocument { cache_version: CACHE_VERSION, version: version.to_string(), timestamp: now_unix(), items };
    let Ok(json) = serde_json::to_vec_pretty(&doc) else {
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            tracing::warn!(%err, path = %parent.display(), "failed to create registry cache directory");
            return;
        }
    }
    if let Err(err) = std::fs::write(&path, json) {
        tracing::warn!(%err, path = %path.display(), "failed to write registry cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn round_trips_through_a_temp_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::env::remove_var(DISABLE_ENV_VAR);
        std::env::set_var("XDG_CACHE_HOME", dir.path());
        save("gpu", "v1", &vec!["a".to_string(), "b".to_string()]);
        let loaded: Option<Vec<String>> = load_default("gpu", "v1");
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
        std::env::remove_var("XDG_CACHE_HOME");
    }

    #[test]
    #[serial]
    fn version_mismatch_misses_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::env::remove_var(DISABLE_ENV_VAR);
        std::env::set_var("XDG_CACHE_HOME", dir.path());
        save("gpu", "v1", &vec![1, 2, 3]);
        let loaded: Option<Vec<i32>> = load_default("gpu", "v2");
        assert_eq!(loaded, None);
        std::env::remove_var("XDG_CACHE_HOME");
    }

    #[test]
    #[serial]
    fn disabled_env_var_skips_read_and_write() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CACHE_HOME", dir.path());
        std::env::set_var(DISABLE_ENV_VAR, "1");
        save("gpu", "v1", &vec![1]);
        let loaded: Option<Vec<i32>> = load_default("gpu", "v1");
        assert_eq!(loaded, None);
        std::env::remove_var(DISABLE_ENV_VAR);
        std::env::remove_var("XDG_CACHE_HOME");
    }
}
