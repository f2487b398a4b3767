// SPDX-License-Identifier: Apache-2.0

//! Wiring: the Global/Pipeline/Step record types, and resolving one step's
//! fully concrete config by threading each resolvable group through its own
//! [`crate::resolver::ResolutionContext`] (spec §4.1 is per-field, not
//! per-record, so each group gets an independent stack).

use crate::components::ComponentsConfig;
use crate::error::Error;
use crate::gpu::{self, GpuConfig, LazyGpuConfig};
use crate::materialization::{self, LazyMaterializationConfig, MaterializationConfig};
use crate::path_planning::{self, LazyPathPlanningConfig, PathPlanningConfig};
use crate::resolver::{ResolutionContext, ScopeKind};
use crate::vfs::{self, LazyVfsConfig, VfsConfig};
use crate::zarr::{self, LazyZarrConfig, ZarrConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global-scope config: the root of every resolution, plus the one
/// non-resolvable record (components) and run-wide settings that have no
/// notion of inheritance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GlobalConfig {
    pub components: ComponentsConfig,
    /// Number of OS-level worker processes/threads (spec §5).
    pub num_workers: usize,
    /// Per-unit wall-clock budget; a unit still running past this is
    /// reported as a failure rather than left to run indefinitely (spec §5
    /// worker pool). `None` means no timeout. Written in human form (`"5m"`,
    /// `"30s"`) in config files via `humantime_serde`.
    #[serde(default, with = "humantime_serde::option")]
    #[schemars(with = "Option<String>")]
    pub unit_timeout: Option<Duration>,
    #[serde(default)]
    pub path_planning: LazyPathPlanningConfig,
    #[serde(default)]
    pub vfs: LazyVfsConfig,
    #[serde(default)]
    pub materialization: LazyMaterializationConfig,
    #[serde(default)]
    pub zarr: LazyZarrConfig,
    #[serde(default)]
    pub gpu: LazyGpuConfig,
}

/// Pipeline-scope overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    #[serde(default)]
    pub path_planning: LazyPathPlanningConfig,
    #[serde(default)]
    pub vfs: LazyVfsConfig,
    #[serde(default)]
    pub materialization: LazyMaterializationConfig,
    #[serde(default)]
    pub zarr: LazyZarrConfig,
    #[serde(default)]
    pub gpu: LazyGpuConfig,
}

/// Step-scope overrides. No `zarr`: chunking is a write-side, per-unit
/// concern that a single step cannot meaningfully override (spec §4.4
/// phase 3 declares it once per unit's write backend).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StepConfig {
    #[serde(default)]
    pub path_planning: LazyPathPlanningConfig,
    #[serde(default)]
    pub vfs: LazyVfsConfig,
    #[serde(default)]
    pub materialization: LazyMaterializationConfig,
    #[serde(default)]
    pub gpu: LazyGpuConfig,
}

/// Every resolvable group, fully concrete, for one step in one pipeline.
#[derive(Debug, Clone)]
pub struct ResolvedStepConfig {
    pub path_planning: PathPlanningConfig,
    pub vfs: VfsConfig,
    pub materialization: MaterializationConfig,
    pub zarr: ZarrConfig,
    pub gpu: GpuConfig,
}

/// Resolves one step's config against its enclosing pipeline and the global
/// defaults. This is the entry point the compiler calls once per step
/// during phase 1 (spec §4.4).
pub fn resolve_step(
    global: &GlobalConfig,
    pipeline: &PipelineConfig,
    step: &StepConfig,
) -> Result<ResolvedStepConfig, Error> {
    let mut pp_ctx: ResolutionContext<LazyPathPlanningConfig> = ResolutionContext::new();
    pp_ctx.push(ScopeKind::Global, global.path_planning.clone())?;
    pp_ctx.push(ScopeKind::Pipeline, pipeline.path_planning.clone())?;
    pp_ctx.push(ScopeKind::Step, step.path_planning.clone())?;

    let mut vfs_ctx: ResolutionContext<LazyVfsConfig> = ResolutionContext::new();
    vfs_ctx.push(ScopeKind::Global, global.vfs.clone())?;
    vfs_ctx.push(ScopeKind::Pipeline, pipeline.vfs.clone())?;
    vfs_ctx.push(ScopeKind::Step, step.vfs.clone())?;

    let mut mat_ctx: ResolutionContext<LazyMaterializationConfig> = ResolutionContext::new();
    mat_ctx.push(ScopeKind::Global, global.materialization.clone())?;
    mat_ctx.push(ScopeKind::Pipeline, pipeline.materialization.clone())?;
    mat_ctx.push(ScopeKind::Step, step.materialization.clone())?;

    let mut zarr_ctx: ResolutionContext<LazyZarrConfig> = ResolutionContext::new();
    zarr_ctx.push(ScopeKind::Global, global.zarr.clone())?;
    zarr_ctx.push(ScopeKind::Pipeline, pipeline.zarr.clone())?;

    let mut gpu_ctx: ResolutionContext<LazyGpuConfig> = ResolutionContext::new();
    gpu_ctx.push(ScopeKind::Global, global.gpu.clone())?;
    gpu_ctx.push(ScopeKind::Pipeline, pipeline.gpu.clone())?;
    gpu_ctx.push(ScopeKind::Step, step.gpu.clone())?;

    Ok(ResolvedStepConfig {
        path_planning: path_planning::resolve(&pp_ctx)?,
        vfs: vfs::resolve(&vfs_ctx)?,
        materialization: materialization::resolve(&mat_ctx)?,
        zarr: zarr::resolve(&zarr_ctx)?,
        gpu: gpu::resolve(&gpu_ctx)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use openhcs_core::backend::BackendId;

    fn global() -> GlobalConfig {
        GlobalConfig {
            components: ComponentsConfig {
                all_components: vec!["well".into(), "site".into(), "channel".into()],
                parallelization_axis: "well".into(),
                variable_components: vec!["site".into()],
                group_by: None,
            },
            num_workers: 4,
            unit_timeout: None,
            path_planning: LazyPathPlanningConfig {
                output_dir_suffix: Field::Value("_out".into()),
                intermediate_dir_prefix: Field::Value("step_".into()),
                sub_dir: Field::Value("images".into()),
            },
            vfs: LazyVfsConfig {
                intermediate_backend: Field::Value(BackendId::Memory),
                materialization_backend: Field::Value(BackendId::Disk),
                disable_gpu_backends: Field::Value(false),
            },
            materialization: LazyMaterializationConfig {
                materialize: Field::Value(false),
                backend: Field::Value(BackendId::Disk),
                sub_dir: Field::Value("materialized".into()),
            },
            zarr: LazyZarrConfig {
                chunk_strategy: Field::Value(zarr::ChunkStrategy::UnitChunk),
                compression: Field::Value(zarr::Compression::Zstd),
                compression_level: Field::Value(3),
                target_chunk_bytes: Field::Value(zarr::DEFAULT_TARGET_CHUNK_BYTES),
            },
            gpu: LazyGpuConfig {
                enabled: Field::Value(true),
                runtime_preference: Field::Value(gpu::GpuRuntimePreference::Any),
                required: Field::Value(false),
            },
        }
    }

    #[test]
    fn resolves_full_step_config_with_no_overrides() {
        let resolved =
            resolve_step(&global(), &PipelineConfig::default(), &StepConfig::default()).unwrap();
        assert_eq!(resolved.path_planning.output_dir_suffix, "_out");
        assert_eq!(resolved.vfs.intermediate_backend, BackendId::Memory);
        assert!(!resolved.materialization.materialize);
        assert_eq!(resolved.zarr.chunk_strategy, zarr::ChunkStrategy::UnitChunk);
        assert!(resolved.gpu.enabled);
    }

    #[test]
    fn step_level_override_takes_precedence() {
        let step = StepConfig {
            materialization: LazyMaterializationConfig {
                materialize: Field::Value(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_step(&global(), &PipelineConfig::default(), &step).unwrap();
        assert!(resolved.materialization.materialize);
        assert_eq!(resolved.materialization.backend, BackendId::Disk);
    }
}
