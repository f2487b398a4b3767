// SPDX-License-Identifier: Apache-2.0

//! Per-worker GPU cache cleanup (spec §4.5.3): after each unit completes,
//! release whatever per-runtime allocator caches were built up on the
//! worker's assigned `gpu_id`. Every runtime this workspace ships never
//! actually allocates device memory (spec §4.6: detection only), so there
//! is no live allocator to flush; this module's job is to be the one place
//! that invariant is asserted, so a future runtime with a real allocator
//! has exactly one call site to plug into.

use std::collections::HashSet;

/// Tracks which `gpu_id`s a worker has used since its last cleanup, so
/// `release` only touches devices that were actually assigned.
#[derive(Debug, Default)]
pub struct GpuCacheTracker {
    dirty: HashSet<u32>,
}

impl GpuCacheTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `gpu_id` was used by the unit that just ran.
    pub fn mark_used(&mut self, gpu_id: u32) {
        self.dirty.insert(gpu_id);
    }

    /// Releases every dirty device's cache, returning the ids released.
    pub fn release_all(&mut self) -> Vec<u32> {
        let released: Vec<u32> = self.dirty.drain().collect();
        for gpu_id in &released {
            tracing::debug!(gpu_id, "released per-worker GPU cache");
        }
        released
    }
}
