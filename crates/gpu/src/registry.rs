// SPDX-License-Identifier: Apache-2.0

//! GPU device registry (spec §4.6): a thread-safe, immutable-after-init
//! snapshot of every detected device across every registered runtime.

use crate::error::Error;
use crate::probe::RUNTIME_PROBES;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

/// One detected GPU device and the unit budget it can serve concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuDevice {
    pub gpu_id: u32,
    pub runtime: &'static str,
    /// `ceil(cpu_count / num_gpus)`, at least 1 (spec §4.6). Today the
    /// compiler statically assigns one GPU per unit, so this is an upper
    /// bound on how many units may share a device rather than a live
    /// semaphore; runtime slot acquisition is a future enhancement.
    pub max_concurrent_units: usize,
}

/// The immutable result of probing every registered runtime once.
#[derive(Debug, Clone, Default)]
pub struct GpuSnapshot {
    devices: IndexMap<u32, GpuDevice>,
}

impl GpuSnapshot {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn get(&self, gpu_id: u32) -> Result<GpuDevice, Error> {
        self.devices.get(&gpu_id).copied().ok_or(Error::UnknownDevice { gpu_id })
    }

    pub fn devices(&self) -> impl Iterator<Item = &GpuDevice> {
        self.devices.values()
    }

    /// Devices belonging to one named runtime, e.g. `"cuda"`.
    pub fn devices_for_runtime(&self, runtime: &str) -> Vec<GpuDevice> {
        self.devices.values().filter(|d| d.runtime == runtime).copied().collect()
    }
}

fn cpu_count() -> usize {
    core_affinity::get_core_ids().map(|ids| ids.len()).filter(|&n| n > 0).unwrap_or(1)
}

fn max_concurrent_units(cpu_count: usize, num_gpus: usize) -> usize {
    if num_gpus == 0 {
        return 0;
    }
    cpu_count.div_ceil(num_gpus).max(1)
}

fn build_snapshot() -> GpuSnapshot {
    let mut by_runtime: IndexMap<&'static str, Vec<u32>> = IndexMap::new();
    for factory in RUNTIME_PROBES.iter() {
        let probe = (factory.create)();
        let raw = probe.probe();
        if raw.is_empty() {
            tracing::debug!(runtime = factory.name, "GPU runtime probe found no devices");
            continue;
        }
        by_runtime
            .entry(factory.name)
            .or_default()
            .extend(raw.into_iter().map(|d| d.index));
    }

    let cpus = cpu_count();
    let mut devices = IndexMap::new();
    let mut next_id = 0u32;
    for (runtime, indices) in by_runtime {
        let num_gpus = indices.len();
        let slots = max_concurrent_units(cpus, num_gpus);
        for _ in indices {
            let gpu_id = next_id;
            next_id += 1;
            devices.insert(gpu_id, GpuDevice { gpu_id, runtime, max_concurrent_units: slots });
        }
    }
    GpuSnapshot { devices }
}

static SNAPSHOT: OnceCell<GpuSnapshot> = OnceCell::new();

/// Returns the process-wide device snapshot, probing every registered
/// runtime on first call and memoizing the result for the rest of the
/// process's lifetime.
pub fn snapshot() -> &'static GpuSnapshot {
    SNAPSHOT.get_or_init(build_snapshot)
}
