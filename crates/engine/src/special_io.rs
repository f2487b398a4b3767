// SPDX-License-Identifier: Apache-2.0

//! Runtime special-I/O (spec §4.5 step 2, §4.7 "Execution mapping"): load
//! each step's recorded special inputs before the function call, persist
//! its special outputs and invoke materializers after the step's main
//! writes complete. By execution time every name is a direct lookup into
//! the frozen plan; no name matching happens here.

use crate::error::Error;
use crate::materializer;
use openhcs_core::backend::BackendId;
use openhcs_core::plan::{SpecialInputRef, SpecialOutputRef, StepPlan};
use openhcs_vfs::Backend;
use std::collections::HashMap;
use std::sync::Arc;

/// How the executor resolves a [`BackendId`] to a live backend instance,
/// shared by every module that needs to reach the VFS at runtime.
pub type BackendResolver<'a> = dyn Fn(&BackendId) -> Result<Arc<dyn Backend>, openhcs_vfs::Error> + 'a;

/// Loads every special input a step declares, keyed by its bare name.
pub fn load_special_inputs(
    step: &StepPlan,
    get_backend: &BackendResolver<'_>,
) -> Result<HashMap<String, Vec<u8>>, Error> {
    let mut loaded = HashMap::with_capacity(step.special_inputs.len());
    for (name, input_ref) in &step.special_inputs {
        let bytes = load_one(input_ref, get_backend)?;
        loaded.insert(name.clone(), bytes);
    }
    Ok(loaded)
}

fn load_one(input_ref: &SpecialInputRef, get_backend: &BackendResolver<'_>) -> Result<Vec<u8>, Error> {
    let backend = get_backend(&input_ref.backend)?;
    Ok(backend.load(&input_ref.path)?)
}

/// The final namespaced name a function's declared special output resolves
/// to (spec §4.7 "Namespacing for function maps"): promoted to the bare
/// name when there's no ambiguity (a plain chain, or a map with one arm),
/// prefixed with `{component_value}_{chain_index}_` otherwise.
#[must_use]
pub fn namespaced_output_name(
    output_name: &str,
    component_value: Option<&str>,
    chain_index: usize,
    promote: bool,
) -> String {
    match component_value {
        Some(value) if !promote => format!("{value}_{chain_index}_{output_name}"),
        _ => output_name.to_string(),
    }
}

/// Persists a step's special outputs (declared order must already match
/// `values`'s order, enforced by the caller via
/// [`Error::SpecialOutputCountMismatch`]) and invokes each one's
/// materializer, if any.
pub fn persist_special_outputs(
    step: &StepPlan,
    values: &[Vec<u8>],
    get_backend: &BackendResolver<'_>,
) -> Result<(), Error> {
    if values.len() != step.special_outputs.len() {
        return Err(Error::SpecialOutputCountMismatch {
            step_index: step.step_index,
            name: step.name.clone(),
            expected: step.special_outputs.len(),
            actual: values.len(),
        });
    }
    for ((_, output_ref), data) in step.special_outputs.iter().zip(values) {
        persist_one(step, output_ref, data, get_backend)?;
    }
    Ok(())
}

fn persist_one(
    step: &StepPlan,
    output_ref: &SpecialOutputRef,
    data: &[u8],
    get_backend: &BackendResolver<'_>,
) -> Result<(), Error> {
    let backend = get_backend(&output_ref.backend)?;
    backend.save(&output_ref.path, data)?;
    if let Some(materializer_name) = &output_ref.materializer {
        let materializer = materializer::get_materializer(materializer_name)?;
        materializer
            .materialize(data, &output_ref.path, backend.as_ref())
            .map_err(|message| Error::FunctionFailed {
                step_index: step.step_index,
                name: step.name.clone(),
                function: materializer_name.clone(),
                message,
            })?;
    }
    Ok(())
}
