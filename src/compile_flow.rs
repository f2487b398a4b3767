// SPDX-License-Identifier: Apache-2.0

//! The shared path both `compile` and `run` take: load config and the
//! pipeline definition, read plate metadata, discover patterns, resolve
//! each step's config, and compile. `run` runs the compiled units
//! afterward; `compile` just summarizes them.

use crate::error::Error;
use crate::pipeline_loader::load_pipeline_definition;
use indexmap::IndexMap;
use openhcs_compiler::{compile, CompileRequest, CompiledUnit};
use openhcs_config::{load_global_config, resolve_step, GlobalConfig, PipelineConfig, ResolvedStepConfig, StepConfig};
use openhcs_core::backend::BackendId;
use openhcs_core::step::PipelineDefinition;
use openhcs_core::UnitId;
use openhcs_discovery::{discover_patterns, get_handler, DiscoveryRequest, UnitPatterns};
use openhcs_gpu::GpuSnapshot;
use openhcs_vfs::workspace_mapping::WorkspaceMappingBackend;
use openhcs_vfs::Backend;
use std::path::Path;
use std::sync::Arc;

/// Image extensions discovery scans for. No part of this workspace exposes
/// a per-format extension list on [`openhcs_discovery::MicroscopeHandler`]
/// (each handler's filename parser rejects what it doesn't recognize
/// regardless), so this is a fixed, generous default rather than something
/// read from any handler.
const DEFAULT_EXTENSIONS: &[&str] = &["tif", "tiff", "png"];

const SUBPROCESS_NO_GPU_VAR: &str = "OPENHCS_SUBPROCESS_NO_GPU";

/// Whether this process should skip GPU-heavy backend/runtime discovery
/// (spec §6 `OPENHCS_SUBPROCESS_NO_GPU=1`).
#[must_use]
pub fn gpu_discovery_disabled() -> bool {
    std::env::var(SUBPROCESS_NO_GPU_VAR).is_ok_and(|v| v == "1")
}

/// Returns the process GPU snapshot, or an empty one when GPU discovery is
/// disabled for this process. `openhcs_gpu::registry::snapshot` takes no
/// parameter and memoizes its probe for the whole process, so the only way
/// to suppress probing is to never call it.
pub fn gpu_snapshot(disabled: bool) -> GpuSnapshot {
    if disabled {
        GpuSnapshot::default()
    } else {
        openhcs_gpu::registry::snapshot().clone()
    }
}

pub struct Loaded {
    pub global: GlobalConfig,
    pub pipeline: PipelineDefinition,
    pub units: IndexMap<UnitId, UnitPatterns>,
    pub compatible_backends: Vec<BackendId>,
}

/// Loads config, the pipeline definition, plate metadata and discovered
/// patterns — everything needed before per-step config resolution and
/// compilation.
pub fn load(
    plate_root: &Path,
    pipeline_path: &Path,
    config_path: &Path,
    well_filter: Option<&[String]>,
    disable_gpu_backends: bool,
) -> Result<Loaded, Error> {
    let global = load_global_config(config_path)?;
    let pipeline = load_pipeline_definition(pipeline_path)?;

    let plate_root_str = plate_root.to_string_lossy().into_owned();
    let disk = openhcs_vfs::registry::get_backend(&BackendId::Disk, disable_gpu_backends)?;
    let mut plate_metadata = openhcs_discovery::load_plate_metadata(disk.as_ref(), &plate_root_str)?;
    let (main_name, handler_name) = {
        let (name, meta) = plate_metadata.main_subdirectory().ok_or(Error::NoMainSubdirectory)?;
        (name.to_string(), meta.microscope_handler_name.clone())
    };
    let handler = get_handler(&handler_name)?;
    let compatible_backends = handler.compatible_backends();

    // Build this plate's virtual mapping (spec §4.3) ahead of discovery and
    // persist it to plate metadata. Flat layouts come back empty and
    // discovery reads straight off disk; nested layouts get wrapped in a
    // workspace-mapping backend so discovery sees a flat plate regardless.
    let mapping = handler.build_virtual_mapping(disk.as_ref(), &plate_root_str)?;
    let discovery_backend: Arc<dyn Backend> = if mapping.is_empty() {
        disk.clone()
    } else {
        let workspace = Arc::new(WorkspaceMappingBackend::new());
        for (virtual_path, real_path) in &mapping {
            workspace.map_path(virtual_path, real_path, disk.clone());
        }
        let subdir = plate_metadata
            .subdirectories
            .get_mut(&main_name)
            .expect("main subdirectory name was just read from this same plate_metadata");
        subdir.workspace_mapping = Some(mapping);
        openhcs_discovery::save_plate_metadata(disk.as_ref(), &plate_root_str, &plate_metadata)?;
        workspace
    };

    let units = discover_patterns(&DiscoveryRequest {
        handler: handler.as_ref(),
        backend: discovery_backend.as_ref(),
        plate_root: &plate_root_str,
        extensions: DEFAULT_EXTENSIONS,
        parallelization_axis: &global.components.parallelization_axis,
        variable_components: &global.components.variable_components,
        group_by: global.components.group_by.as_ref(),
        unit_filter: well_filter,
    })?;

    Ok(Loaded { global, pipeline, units, compatible_backends })
}

/// Resolves every step's config and compiles the pipeline against the
/// discovered units. No per-step override file format exists in this
/// binary, so every step resolves against global defaults only (pipeline
/// and step scopes are both empty overlays).
pub fn compile_loaded(
    loaded: &Loaded,
    plate_root: &Path,
    gpu_snapshot: &GpuSnapshot,
) -> Result<(IndexMap<UnitId, CompiledUnit>, Vec<ResolvedStepConfig>), Error> {
    let pipeline_overlay = PipelineConfig::default();
    let step_configs: Vec<ResolvedStepConfig> = loaded
        .pipeline
        .steps
        .iter()
        .map(|_| resolve_step(&loaded.global, &pipeline_overlay, &StepConfig::default()))
        .collect::<Result<_, _>>()?;

    let plate_root_str = plate_root.to_string_lossy().into_owned();
    let compiled = compile(&CompileRequest {
        plate_root: &plate_root_str,
        pipeline: &loaded.pipeline,
        step_configs: &step_configs,
        units: &loaded.units,
        compatible_backends: &loaded.compatible_backends,
        gpu_snapshot,
    })?;
    Ok((compiled, step_configs))
}

/// Whether the run as a whole should let a step fall back to CPU execution
/// when no GPU is available, rather than failing loudly (spec §7 "no
/// implicit CPU fallback unless explicitly allowed"). `true` unless any
/// step's resolved GPU config marks it `required`.
#[must_use]
pub fn allow_cpu_fallback(step_configs: &[ResolvedStepConfig]) -> bool {
    !step_configs.iter().any(|c| c.gpu.required)
}
