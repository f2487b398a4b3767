// SPDX-License-Identifier: Apache-2.0

//! The per-unit execution loop (spec §4.5): walk a unit's step plans in
//! order, stacking each pattern's matched files into a 3-D array, running
//! it through the step's function(s), persisting special I/O, and writing
//! the unstacked result back out. A step's failure fails the unit; it never
//! touches any other unit.

use crate::array::{self, Array3Data};
use crate::chunked_write;
use crate::error::Error;
use crate::function;
use crate::gpu_cache::GpuCacheTracker;
use crate::memory;
use crate::special_io::{self, BackendResolver};
use crate::state::UnitOutcome;
use openhcs_compiler::ChunkDeclaration;
use openhcs_core::backend::BackendId;
use openhcs_core::component::Pattern;
use openhcs_core::plan::{ExecutionPlan, StepPlan};
use openhcs_core::step::FunctionPattern;
use openhcs_discovery::UnitPatterns;
use openhcs_vfs::Backend;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Everything the executor needs to run one unit's plan, besides the plan
/// itself: how to discover its files and reach its backends.
pub struct ExecuteRequest<'a> {
    pub plan: &'a ExecutionPlan,
    pub unit_patterns: &'a UnitPatterns,
    pub chunk_declarations: &'a IndexMap<usize, ChunkDeclaration>,
    pub get_backend: &'a BackendResolver<'a>,
    pub allow_cpu_fallback: bool,
    pub is_cancelled: &'a dyn Fn() -> bool,
}

/// Runs every step of `req.plan` in order, returning the unit's outcome.
/// Never panics on a step failure; the failure is captured in the returned
/// [`UnitOutcome`] (spec §5 "Failure isolation").
pub fn execute_unit(req: &ExecuteRequest<'_>) -> UnitOutcome {
    let mut gpu_tracker = GpuCacheTracker::new();
    for step in &req.plan.steps {
        if (req.is_cancelled)() {
            return UnitOutcome::Cancelled { step_index: step.step_index, step_name: step.name.clone() };
        }
        if let Some(gpu_id) = step.gpu_id {
            gpu_tracker.mark_used(gpu_id);
        }
        if let Err(err) = execute_step(req, step) {
            return UnitOutcome::Failed { step_index: step.step_index, step_name: step.name.clone(), reason: err.to_string() };
        }
    }
    let released = gpu_tracker.release_all();
    tracing::debug!(unit_id = %req.plan.unit_id, released = ?released, "unit completed");
    UnitOutcome::Done
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn join_dir(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// One pattern's worth of work within a step: the files to stack, the
/// chain to run them through, and the namespacing context for any special
/// outputs the chain's functions declare.
struct GroupTask<'a> {
    pattern: &'a Pattern,
    chain: &'a openhcs_core::step::FunctionChain,
    component_value: Option<&'a str>,
    promote: bool,
}

/// Pairs each of a unit's discovered patterns with the chain that should
/// process it, per the step's function pattern (spec §3 "Function pattern").
/// A step's function pattern and `unit_patterns`'s shape are fixed together
/// at compile time (phase 5); any other combination means the caller handed
/// the executor a plan for a different unit than `unit_patterns` describes,
/// in which case this step simply has no work and runs as a no-op.
fn group_tasks<'a>(step: &'a StepPlan, unit_patterns: &'a UnitPatterns) -> Vec<GroupTask<'a>> {
    match (&step.function_pattern, unit_patterns) {
        (FunctionPattern::Chain(chain), UnitPatterns::Flat(patterns)) => patterns
            .iter()
            .map(|pattern| GroupTask { pattern, chain, component_value: None, promote: true })
            .collect(),
        (FunctionPattern::Map { arms, .. }, UnitPatterns::GroupedBy { groups, .. }) => {
            let promote = arms.len() == 1;
            groups
                .iter()
                .filter_map(|(component_value, patterns)| {
                    let chain = arms.get(component_value)?;
                    Some(patterns.iter().map(move |pattern| GroupTask {
                        pattern,
                        chain,
                        component_value: Some(component_value.as_str()),
                        promote,
                    }))
                })
                .flatten()
                .collect()
        }
        _ => Vec::new(),
    }
}

fn execute_step(req: &ExecuteRequest<'_>, step: &StepPlan) -> Result<(), Error> {
    let read_backend = (req.get_backend)(&step.read_backend)?;
    let write_backend = (req.get_backend)(&step.write_backend)?;
    let special_inputs = special_io::load_special_inputs(step, req.get_backend)?;

    for task in group_tasks(step, req.unit_patterns) {
        execute_group(req, step, &task, read_backend.as_ref(), write_backend.as_ref(), &special_inputs)?;
    }
    Ok(())
}

fn execute_group(
    req: &ExecuteRequest<'_>,
    step: &StepPlan,
    task: &GroupTask<'_>,
    read_backend: &dyn Backend,
    write_backend: &dyn Backend,
    special_inputs: &HashMap<String, Vec<u8>>,
) -> Result<(), Error> {
    // Load (step 1: "resolve matching files... via the VFS").
    let mut slices = Vec::with_capacity(task.pattern.files.len());
    for file in &task.pattern.files {
        let path = join_dir(&step.input_dir, basename(file));
        let bytes = read_backend.load(&path)?;
        slices.push((path, bytes));
    }
    let x = slices.first().map(|(_, bytes)| bytes.len()).unwrap_or(0);

    // Stack, then enter the step's declared input memory type.
    let stacked = array::stack(&slices, 1, x, step.input_memory_type)?;
    let mut current = memory::convert(stacked, step.input_memory_type, req.allow_cpu_fallback)?;

    // Execute: run the chain's functions in order, collecting special
    // outputs under their final namespaced names as each function returns.
    let mut special_output_values: Vec<(String, Vec<u8>)> = Vec::new();
    for (chain_index, function_ref) in task.chain.functions().iter().enumerate() {
        current = call_one(req, step, function_ref, chain_index, current, special_inputs, task, &mut special_output_values)?;
    }

    // Unstack at the step's declared output memory type, then write.
    let output_array = memory::convert(current, step.output_memory_type, req.allow_cpu_fallback)?;
    let planes = array::unstack(&output_array);

    if step.write_backend == BackendId::Zarr {
        if let Some(declaration) = req.chunk_declarations.get(&step.step_index) {
            chunked_write::write_chunked(write_backend, &step.output_dir, &planes, output_array.shape(), declaration)?;
        } else {
            write_planes(write_backend, &step.output_dir, &task.pattern.files, &planes)?;
        }
    } else {
        write_planes(write_backend, &step.output_dir, &task.pattern.files, &planes)?;
    }

    persist_special_outputs(step, &special_output_values, req.get_backend)?;

    // Step 3: per-step materialization, a second copy alongside the plan's
    // normal write path.
    if let Some(materialized_dir) = &step.materialized_output_dir {
        write_planes(write_backend, materialized_dir, &task.pattern.files, &planes)?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn call_one(
    req: &ExecuteRequest<'_>,
    step: &StepPlan,
    function_ref: &openhcs_core::step::FunctionRef,
    chain_index: usize,
    input: Array3Data,
    special_inputs: &HashMap<String, Vec<u8>>,
    task: &GroupTask<'_>,
    special_output_values: &mut Vec<(String, Vec<u8>)>,
) -> Result<Array3Data, Error> {
    let (input_type, output_type) = function_ref.memory_type;
    let input = memory::convert(input, input_type, req.allow_cpu_fallback)?;

    let func = function::get_function(&function_ref.name)?;
    let fn_special_inputs: HashMap<String, Vec<u8>> = function_ref
        .special_inputs
        .iter()
        .filter_map(|name| special_inputs.get(name).map(|v| (name.clone(), v.clone())))
        .collect();

    let result = func
        .call(input, &fn_special_inputs, &function_ref.kwargs)
        .map_err(|message| Error::FunctionFailed {
            step_index: step.step_index,
            name: step.name.clone(),
            function: function_ref.name.clone(),
            message,
        })?;

    if result.special_outputs.len() != function_ref.special_outputs.len() {
        return Err(Error::SpecialOutputCountMismatch {
            step_index: step.step_index,
            name: step.name.clone(),
            expected: function_ref.special_outputs.len(),
            actual: result.special_outputs.len(),
        });
    }
    for ((name, _), data) in function_ref.special_outputs.iter().zip(result.special_outputs) {
        let final_name = special_io::namespaced_output_name(name, task.component_value, chain_index, task.promote);
        special_output_values.push((final_name, data));
    }

    memory::convert(result.array, output_type, req.allow_cpu_fallback)
}

fn write_planes(backend: &dyn Backend, output_dir: &str, files: &[String], planes: &[Vec<u8>]) -> Result<(), Error> {
    for (file, plane) in files.iter().zip(planes) {
        backend.save(&join_dir(output_dir, basename(file)), plane)?;
    }
    Ok(())
}

/// Reorders `values` (produced in chain-execution order) to match
/// `step.special_outputs`'s declared order before handing off to
/// [`special_io::persist_special_outputs`], which zips positionally.
fn persist_special_outputs(
    step: &StepPlan,
    values: &[(String, Vec<u8>)],
    get_backend: &BackendResolver<'_>,
) -> Result<(), Error> {
    let ordered: Vec<Vec<u8>> = step
        .special_outputs
        .keys()
        .map(|name| {
            values
                .iter()
                .find(|(produced_name, _)| produced_name == name)
                .map(|(_, data)| data.clone())
                .ok_or_else(|| Error::MissingSpecialOutput {
                    step_index: step.step_index,
                    name: step.name.clone(),
                    output_name: name.clone(),
                })
        })
        .collect::<Result<_, _>>()?;
    special_io::persist_special_outputs(step, &ordered, get_backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhcs_core::memory::MemoryType;
    use openhcs_core::step::{FunctionChain, FunctionRef};
    use openhcs_vfs::memory::MemoryBackend;
    use std::sync::Arc;

    fn single_step(name: &str, input: &str, output: &str) -> StepPlan {
        StepPlan {
            step_index: 0,
            name: name.to_string(),
            input_dir: input.to_string(),
            output_dir: output.to_string(),
            read_backend: BackendId::Memory,
            write_backend: BackendId::Memory,
            input_memory_type: MemoryType::Cpu,
            output_memory_type: MemoryType::Cpu,
            gpu_id: None,
            variable_components: vec![],
            group_by: None,
            function_pattern: FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
                "echo",
                MemoryType::Cpu,
                MemoryType::Cpu,
            ))),
            materialized_output_dir: None,
            special_inputs: IndexMap::new(),
            special_outputs: IndexMap::new(),
        }
    }

    #[test]
    fn a_single_step_unit_reads_processes_and_writes_through_the_pattern() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::default());
        backend.save("/in/A01_s1.tif", &[1, 2, 3, 4]).unwrap();

        let pattern = Pattern { template: "A01_s{iii}.tif".into(), files: vec!["/in/A01_s1.tif".into()] };
        let unit_patterns = UnitPatterns::Flat(vec![pattern]);
        let plan = ExecutionPlan { unit_id: "A01".into(), steps: vec![single_step("echo", "/in", "/out")] };
        let chunk_declarations = IndexMap::new();
        let resolver_backend = backend.clone();
        let resolver = move |_: &BackendId| Ok(resolver_backend.clone());

        let req = ExecuteRequest {
            plan: &plan,
            unit_patterns: &unit_patterns,
            chunk_declarations: &chunk_declarations,
            get_backend: &resolver,
            allow_cpu_fallback: false,
            is_cancelled: &|| false,
        };
        let outcome = execute_unit(&req);
        assert_eq!(outcome, UnitOutcome::Done);
        assert_eq!(backend.load("/out/A01_s1.tif").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn cancellation_before_a_step_starts_short_circuits_the_unit() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::default());
        let pattern = Pattern { template: "A01_s{iii}.tif".into(), files: vec![] };
        let unit_patterns = UnitPatterns::Flat(vec![pattern]);
        let plan = ExecutionPlan { unit_id: "A01".into(), steps: vec![single_step("echo", "/in", "/out")] };
        let chunk_declarations = IndexMap::new();
        let resolver = move |_: &BackendId| Ok(backend.clone());

        let req = ExecuteRequest {
            plan: &plan,
            unit_patterns: &unit_patterns,
            chunk_declarations: &chunk_declarations,
            get_backend: &resolver,
            allow_cpu_fallback: false,
            is_cancelled: &|| true,
        };
        let outcome = execute_unit(&req);
        assert!(matches!(outcome, UnitOutcome::Cancelled { step_index: 0, .. }));
    }

    #[test]
    fn an_unregistered_function_fails_the_unit_without_panicking() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::default());
        backend.save("/in/A01_s1.tif", &[1, 2, 3, 4]).unwrap();
        let mut step = single_step("bad", "/in", "/out");
        step.function_pattern = FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
            "does-not-exist",
            MemoryType::Cpu,
            MemoryType::Cpu,
        )));
        let pattern = Pattern { template: "A01_s{iii}.tif".into(), files: vec!["/in/A01_s1.tif".into()] };
        let unit_patterns = UnitPatterns::Flat(vec![pattern]);
        let plan = ExecutionPlan { unit_id: "A01".into(), steps: vec![step] };
        let chunk_declarations = IndexMap::new();
        let resolver = move |_: &BackendId| Ok(backend.clone());

        let req = ExecuteRequest {
            plan: &plan,
            unit_patterns: &unit_patterns,
            chunk_declarations: &chunk_declarations,
            get_backend: &resolver,
            allow_cpu_fallback: false,
            is_cancelled: &|| false,
        };
        let outcome = execute_unit(&req);
        assert!(matches!(outcome, UnitOutcome::Failed { step_index: 0, .. }));
    }
}
