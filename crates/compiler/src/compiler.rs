// SPDX-License-Identifier: Apache-2.0

//! The seven-phase compiler (spec §4.4): turns one pipeline definition and
//! one plate's discovered units into one immutable [`ExecutionPlan`] per
//! unit. Phases 4 (memory-type propagation) and 6 (special-I/O resolution)
//! are unit-independent and run once ([`crate::memory_plan`],
//! [`crate::special_io`]); phases 1-3, 5 and 7 instantiate each unit's
//! concrete directories, backends, chunk declarations and `gpu_id`.

use crate::error::Error;
use crate::gpu_plan;
use crate::special_io::{self, SpecialIoPlan};
use indexmap::IndexMap;
use openhcs_config::scopes::ResolvedStepConfig;
use openhcs_config::zarr::{ChunkStrategy, Compression};
use openhcs_core::backend::BackendId;
use openhcs_core::plan::{ExecutionPlan, SpecialInputRef, SpecialOutputRef, StepPlan};
use openhcs_core::step::PipelineDefinition;
use openhcs_core::UnitId;
use openhcs_discovery::UnitPatterns;
use openhcs_gpu::GpuSnapshot;
use openhcs_vfs::routing;

/// What the compiler needs to turn a pipeline definition into execution
/// plans: the pipeline itself, each step's fully-resolved config (spec
/// §4.1, one entry per `pipeline.steps`), the plate's discovered units
/// (spec §4.3, patterns for the pipeline's first step), the microscope
/// handler's compatible-backend list in priority order (spec §4.2), and
/// the GPU registry snapshot (spec §4.6).
pub struct CompileRequest<'a> {
    pub plate_root: &'a str,
    pub pipeline: &'a PipelineDefinition,
    pub step_configs: &'a [ResolvedStepConfig],
    pub units: &'a IndexMap<UnitId, UnitPatterns>,
    pub compatible_backends: &'a [BackendId],
    pub gpu_snapshot: &'a GpuSnapshot,
}

/// Phase 3's chunk declaration, kept out of the shared [`ExecutionPlan`]
/// type since it's compiler-internal bookkeeping for streaming writes, not
/// part of the frozen plan the executor consumes step by step.
#[derive(Debug, Clone)]
pub struct ChunkDeclaration {
    pub chunk_strategy: ChunkStrategy,
    pub compression: Compression,
    pub compression_level: i32,
    pub target_chunk_bytes: u64,
}

/// One unit's compiled output: the frozen plan plus any chunk declarations
/// for steps whose write backend is chunked columnar.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub plan: ExecutionPlan,
    pub chunk_declarations: IndexMap<usize, ChunkDeclaration>,
}

/// Runs all seven phases, returning one [`CompiledUnit`] per discovered
/// unit, keyed the same way `req.units` is (spec §8 property 1: the same
/// request always yields byte-identical plans).
pub fn compile(req: &CompileRequest<'_>) -> Result<IndexMap<UnitId, CompiledUnit>, Error> {
    if req.pipeline.steps.is_empty() {
        return Err(Error::EmptyPipeline);
    }
    if req.step_configs.len() != req.pipeline.steps.len() {
        return Err(Error::StepConfigCountMismatch {
            expected: req.pipeline.steps.len(),
            found: req.step_configs.len(),
        });
    }
    for (step_index, step) in req.pipeline.steps.iter().enumerate() {
        if step.function_pattern.requires_group_by() && step.group_by.is_none() {
            return Err(Error::MissingGroupBy { step_index, name: step.name.clone() });
        }
    }

    // Phase 4: memory-type propagation (unit-independent).
    let memory_types = crate::memory_plan::compute(req.pipeline)?;

    // Phase 6: special-I/O resolution (unit-independent).
    let special_io = special_io::resolve(req.pipeline)?;

    // Primary backend selection (spec §4.2), shared by every unit.
    let primary = routing::select_primary_backend(req.compatible_backends).ok_or(Error::NoCompatibleBackend)?;

    let requires_gpu: Vec<bool> = memory_types.iter().map(gpu_plan::requires_gpu).collect();
    let step_names: Vec<(usize, &str)> =
        req.pipeline.steps.iter().enumerate().map(|(i, s)| (i, s.name.as_str())).collect();
    let gpu_configs: Vec<&openhcs_config::gpu::GpuConfig> = req.step_configs.iter().map(|c| &c.gpu).collect();

    let mut result = IndexMap::new();
    for (unit_index, unit_id) in req.units.keys().enumerate() {
        let gpu_ids = gpu_plan::assign(&step_names, &requires_gpu, &gpu_configs, req.gpu_snapshot, unit_index)?;
        let compiled = compile_unit(req, unit_id, &memory_types, &special_io, &primary, &gpu_ids)?;
        tracing::debug!(unit_id, steps = compiled.plan.steps.len(), "compiled unit");
        result.insert(unit_id.clone(), compiled);
    }

    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn compile_unit(
    req: &CompileRequest<'_>,
    unit_id: &str,
    memory_types: &[(openhcs_core::memory::MemoryType, openhcs_core::memory::MemoryType)],
    special_io: &SpecialIoPlan,
    primary: &routing::PrimarySelection,
    gpu_ids: &[Option<u32>],
) -> Result<CompiledUnit, Error> {
    let mut steps = Vec::with_capacity(req.pipeline.steps.len());
    let mut chunk_declarations = IndexMap::new();
    // (producer_step_index, final_output_name) -> where it was written, so
    // later steps of this same unit can resolve their special inputs.
    let mut produced: IndexMap<(usize, String), SpecialOutputRef> = IndexMap::new();
    let mut previous_output_dir: Option<String> = None;
    let mut previous_write_backend: Option<BackendId> = None;

    for (step_index, step_def) in req.pipeline.steps.iter().enumerate() {
        let config = &req.step_configs[step_index];
        let is_first = step_index == 0;
        let is_last = step_index == req.pipeline.steps.len() - 1;

        // Phase 1: directories.
        let input_dir = match &previous_output_dir {
            None => req.plate_root.trim_end_matches('/').to_string(),
            Some(dir) => dir.clone(),
        };
        let output_dir = format!(
            "{}/{}{step_index}{}/{}/{unit_id}",
            req.plate_root.trim_end_matches('/'),
            config.path_planning.intermediate_dir_prefix,
            config.path_planning.output_dir_suffix,
            config.path_planning.sub_dir,
        );

        // Phase 2: materialization planning.
        let read_backend = if is_first {
            primary.read_backend.clone()
        } else {
            previous_write_backend.clone().unwrap_or(BackendId::Memory)
        };
        let write_backend = if is_last {
            routing::resolve_write_backend(primary.mandatory_write_backend.as_ref(), &config.materialization.backend)?
        } else {
            routing::resolve_write_backend(primary.mandatory_write_backend.as_ref(), &BackendId::Memory)?
        };
        let materialized_output_dir = if config.materialization.materialize {
            routing::resolve_write_backend(primary.mandatory_write_backend.as_ref(), &config.materialization.backend)?;
            Some(format!("{output_dir}/{}", config.materialization.sub_dir))
        } else {
            None
        };

        // Phase 3: chunk declaration.
        if write_backend == BackendId::Zarr {
            chunk_declarations.insert(
                step_index,
                ChunkDeclaration {
                    chunk_strategy: config.zarr.chunk_strategy,
                    compression: config.zarr.compression,
                    compression_level: config.zarr.compression_level,
                    target_chunk_bytes: config.zarr.target_chunk_bytes,
                },
            );
        }

        // Phase 5: GPU assignment, computed once above; attach this step's share.
        let gpu_id = gpu_ids[step_index];

        // Phase 6 (continued): instantiate this unit's concrete special I/O paths.
        let step_io = &special_io.steps[step_index];
        let mut special_outputs = IndexMap::new();
        for (final_name, materializer) in &step_io.outputs {
            let output_ref = SpecialOutputRef {
                path: format!("{output_dir}/.special/{final_name}"),
                backend: write_backend.clone(),
                materializer: materializer.clone(),
            };
            special_outputs.insert(final_name.clone(), output_ref.clone());
            produced.insert((step_index, final_name.clone()), output_ref);
        }
        let mut special_inputs = IndexMap::new();
        for input_name in &step_io.inputs {
            let producer_index = special_io.links[step_index][input_name];
            let Some(output_ref) = produced.get(&(producer_index, input_name.clone())) else {
                return Err(Error::BackwardSpecialIoReference {
                    step_index,
                    name: step_def.name.clone(),
                    input_name: input_name.clone(),
                    producer_index,
                });
            };
            special_inputs.insert(
                input_name.clone(),
                SpecialInputRef { path: output_ref.path.clone(), backend: output_ref.backend.clone() },
            );
        }

        steps.push(StepPlan {
            step_index,
            name: step_def.name.clone(),
            input_dir,
            output_dir: output_dir.clone(),
            read_backend,
            write_backend: write_backend.clone(),
            input_memory_type: memory_types[step_index].0,
            output_memory_type: memory_types[step_index].1,
            gpu_id,
            variable_components: step_def.variable_components.clone(),
            group_by: step_def.group_by.clone(),
            function_pattern: step_def.function_pattern.clone(),
            materialized_output_dir,
            special_inputs,
            special_outputs,
        });

        previous_output_dir = Some(output_dir);
        previous_write_backend = Some(write_backend);
    }

    Ok(CompiledUnit { plan: ExecutionPlan { unit_id: unit_id.to_string(), steps }, chunk_declarations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhcs_config::gpu::{GpuConfig, GpuRuntimePreference};
    use openhcs_config::materialization::MaterializationConfig;
    use openhcs_config::path_planning::PathPlanningConfig;
    use openhcs_config::vfs::VfsConfig;
    use openhcs_config::zarr::ZarrConfig;
    use openhcs_core::memory::MemoryType;
    use openhcs_core::step::{FunctionChain, FunctionPattern, FunctionRef, StepDefinition};

    fn resolved_step_config(materialization_backend: BackendId, materialize: bool) -> ResolvedStepConfig {
        ResolvedStepConfig {
            path_planning: PathPlanningConfig {
                output_dir_suffix: "_out".into(),
                intermediate_dir_prefix: "step_".into(),
                sub_dir: "images".into(),
            },
            vfs: VfsConfig {
                intermediate_backend: BackendId::Memory,
                materialization_backend: materialization_backend.clone(),
                disable_gpu_backends: false,
            },
            materialization: MaterializationConfig {
                materialize,
                backend: materialization_backend,
                sub_dir: "materialized".into(),
            },
            zarr: ZarrConfig {
                chunk_strategy: ChunkStrategy::UnitChunk,
                compression: Compression::Zstd,
                compression_level: 3,
                target_chunk_bytes: openhcs_config::zarr::DEFAULT_TARGET_CHUNK_BYTES,
            },
            gpu: GpuConfig { enabled: true, runtime_preference: GpuRuntimePreference::Any, required: false },
        }
    }

    fn step(name: &str, pattern: FunctionPattern) -> StepDefinition {
        StepDefinition { name: name.to_string(), function_pattern: pattern, variable_components: vec!["site".into()], group_by: None }
    }

    fn one_flat_unit() -> IndexMap<UnitId, UnitPatterns> {
        let mut units = IndexMap::new();
        units.insert("A01".to_string(), UnitPatterns::Flat(vec![]));
        units
    }

    #[test]
    fn flat_plate_one_step_compiles_a_single_step_plan() {
        let pipeline = PipelineDefinition {
            steps: vec![step(
                "blur",
                FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("blur", MemoryType::Cpu, MemoryType::Cpu))),
            )],
        };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk, BackendId::Memory],
            gpu_snapshot: &snapshot,
        };
        let compiled = compile(&req).unwrap();
        let unit = &compiled["A01"];
        assert_eq!(unit.plan.steps.len(), 1);
        assert_eq!(unit.plan.steps[0].read_backend, BackendId::Disk);
        assert_eq!(unit.plan.steps[0].write_backend, BackendId::Disk);
        assert!(unit.plan.chain_is_continuous());
    }

    #[test]
    fn two_step_chain_requiring_gpu_without_a_device_fails_loudly() {
        let pipeline = PipelineDefinition {
            steps: vec![
                step(
                    "normalize",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("normalize", MemoryType::Cpu, MemoryType::Cpu))),
                ),
                step(
                    "threshold",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("threshold", MemoryType::Cpu, MemoryType::Cuda))),
                ),
            ],
        };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false), resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk],
            gpu_snapshot: &snapshot,
        };
        let err = compile(&req).unwrap_err();
        assert!(matches!(err, Error::GpuUnavailable { step_index: 1, .. }));
    }

    #[test]
    fn two_step_chain_propagates_memory_type_without_requiring_gpu() {
        let pipeline = PipelineDefinition {
            steps: vec![
                step(
                    "normalize",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("normalize", MemoryType::Cpu, MemoryType::Cpu))),
                ),
                step(
                    "threshold",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("threshold", MemoryType::Cpu, MemoryType::Cpu))),
                ),
            ],
        };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false), resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk],
            gpu_snapshot: &snapshot,
        };
        let compiled = compile(&req).unwrap();
        let plan = &compiled["A01"].plan;
        assert!(plan.chain_is_continuous());
        assert_eq!(plan.steps[1].input_memory_type, MemoryType::Cpu);
    }

    #[test]
    fn group_by_map_with_single_arm_produces_plan() {
        let mut arms = IndexMap::new();
        arms.insert(
            "1".to_string(),
            FunctionChain::Single(FunctionRef::new("dapi", MemoryType::Cpu, MemoryType::Cpu)),
        );
        let mut map_step = step("per-channel", FunctionPattern::Map { group_by: "channel".into(), arms });
        map_step.group_by = Some("channel".into());
        let pipeline = PipelineDefinition { steps: vec![map_step] };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk],
            gpu_snapshot: &snapshot,
        };
        let compiled = compile(&req).unwrap();
        assert_eq!(compiled["A01"].plan.steps.len(), 1);
    }

    #[test]
    fn missing_group_by_on_map_step_fails_loudly() {
        let mut arms = IndexMap::new();
        arms.insert(
            "1".to_string(),
            FunctionChain::Single(FunctionRef::new("dapi", MemoryType::Cpu, MemoryType::Cpu)),
        );
        let pipeline = PipelineDefinition {
            steps: vec![step("per-channel", FunctionPattern::Map { group_by: "channel".into(), arms })],
        };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk],
            gpu_snapshot: &snapshot,
        };
        assert!(matches!(compile(&req).unwrap_err(), Error::MissingGroupBy { step_index: 0, .. }));
    }

    #[test]
    fn virtual_only_plate_overrides_materialization_backend() {
        let pipeline = PipelineDefinition {
            steps: vec![step(
                "blur",
                FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new("blur", MemoryType::Cpu, MemoryType::Cpu))),
            )],
        };
        // User asked to materialize to Disk, but the plate's only compatible
        // backend is a virtual one, so Disk must be rejected.
        let step_configs = vec![resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::RemoteObject],
            gpu_snapshot: &snapshot,
        };
        let err = compile(&req).unwrap_err();
        assert!(matches!(err, Error::Vfs(_)));
    }

    #[test]
    fn broken_special_input_link_fails_at_compile_time() {
        let mut consumer = FunctionRef::new("overlay", MemoryType::Cpu, MemoryType::Cpu);
        consumer.special_inputs.push("positions".into());
        let pipeline = PipelineDefinition {
            steps: vec![step("overlay", FunctionPattern::Chain(FunctionChain::Single(consumer)))],
        };
        let step_configs = vec![resolved_step_config(BackendId::Disk, false)];
        let units = one_flat_unit();
        let snapshot = openhcs_gpu::GpuSnapshot::default();
        let req = CompileRequest {
            plate_root: "/plate",
            pipeline: &pipeline,
            step_configs: &step_configs,
            units: &units,
            compatible_backends: &[BackendId::Disk],
            gpu_snapshot: &snapshot,
        };
        assert!(matches!(compile(&req).unwrap_err(), Error::UnresolvedSpecialInput { .. }));
    }
}
