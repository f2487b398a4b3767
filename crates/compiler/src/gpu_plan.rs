// SPDX-License-Identifier: Apache-2.0

//! Phase 5, GPU assignment (spec §4.4, §4.6): for units with at least one
//! GPU-requiring step, assign one `gpu_id` to every GPU-requiring step of
//! that unit (affinity), drawn deterministically from the registry
//! snapshot; fail loudly if no device satisfies the step's runtime
//! preference.

use crate::error::Error;
use openhcs_config::gpu::{GpuConfig, GpuRuntimePreference};
use openhcs_core::memory::MemoryType;
use openhcs_gpu::GpuSnapshot;

/// Whether a step's declared memory types require an actual GPU device.
#[must_use]
pub fn requires_gpu(types: &(MemoryType, MemoryType)) -> bool {
    types.0.is_gpu() || types.1.is_gpu()
}

fn preferred_runtime(preference: GpuRuntimePreference) -> Option<&'static str> {
    match preference {
        GpuRuntimePreference::Cuda => Some("cuda"),
        GpuRuntimePreference::Any => None,
        GpuRuntimePreference::None => None,
    }
}

/// Assigns one `gpu_id` per GPU-requiring step of a unit, all equal to the
/// same device (spec §8 property 5, GPU affinity). `unit_index` picks the
/// device deterministically when more than one is available, so repeated
/// compiles of the same plate/config/registry snapshot assign identically
/// (spec §8 property 1, compile determinism).
pub fn assign(
    step_index_and_name: &[(usize, &str)],
    requires: &[bool],
    gpu_configs: &[&GpuConfig],
    snapshot: &GpuSnapshot,
    unit_index: usize,
) -> Result<Vec<Option<u32>>, Error> {
    let mut candidates: Option<Vec<u32>> = None;
    for (&needs_gpu, gpu_config) in requires.iter().zip(gpu_configs.iter()) {
        if !needs_gpu {
            continue;
        }
        let devices: Vec<u32> = match preferred_runtime(gpu_config.runtime_preference) {
            Some(runtime) => snapshot.devices_for_runtime(runtime).iter().map(|d| d.gpu_id).collect(),
            None => snapshot.devices().map(|d| d.gpu_id).collect(),
        };
        candidates = match candidates {
            Some(existing) => Some(existing.into_iter().filter(|id| devices.contains(id)).collect()),
            None => Some(devices),
        };
    }

    let Some(candidates) = candidates else {
        // No step in this unit requires a GPU at all.
        return Ok(vec![None; requires.len()]);
    };

    if candidates.is_empty() {
        let (step_index, name) = step_index_and_name
            .iter()
            .zip(requires.iter())
            .find(|(_, &needs)| needs)
            .map(|((i, n), _)| (*i, (*n).to_string()))
            .expect("requires has at least one true entry, guaranteed by candidates being Some");
        return Err(Error::GpuUnavailable { step_index, name });
    }

    let mut sorted = candidates;
    sorted.sort_unstable();
    let gpu_id = sorted[unit_index % sorted.len()];

    Ok(requires.iter().map(|&needs| needs.then_some(gpu_id)).collect())
}
