// SPDX-License-Identifier: Apache-2.0

//! The frozen, per-unit execution plan the compiler produces (spec §3, §4.4).

use crate::backend::BackendId;
use crate::component::Component;
use crate::memory::MemoryType;
use crate::step::FunctionPattern;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a step's special input comes from: a prior step's recorded output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialInputRef {
    /// Plate-relative path the input was written to.
    pub path: String,
    /// The backend it was written through.
    pub backend: BackendId,
}

/// Where a step's special output is written, and how it should be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialOutputRef {
    /// Plate-relative path to write the output to.
    pub path: String,
    /// The backend to write it through.
    pub backend: BackendId,
    /// The materializer id to invoke after the step's main writes complete,
    /// if this output is structured data rather than an array (spec §4.7).
    pub materializer: Option<String>,
}

/// One step's immutable, fully-resolved execution plan within a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepPlan {
    /// Index of this step within the pipeline.
    pub step_index: usize,
    /// Step name, carried through for diagnostics.
    pub name: String,
    /// Input directory (VFS path) for this step.
    pub input_dir: String,
    /// Output directory (VFS path) for this step.
    pub output_dir: String,
    /// Backend used to read this step's inputs.
    pub read_backend: BackendId,
    /// Backend used to write this step's outputs.
    pub write_backend: BackendId,
    /// Memory type arrays must have when entering this step.
    pub input_memory_type: MemoryType,
    /// Memory type arrays must have when leaving this step.
    pub output_memory_type: MemoryType,
    /// The GPU device assigned to this step, if it requires one.
    pub gpu_id: Option<u32>,
    /// The variable components substituted by `{iii}` for this step.
    pub variable_components: Vec<Component>,
    /// The component this step groups patterns by, if any.
    pub group_by: Option<Component>,
    /// The function(s) attached to this step.
    pub function_pattern: FunctionPattern,
    /// If this step declares per-step materialization, the directory its
    /// outputs are additionally written to.
    pub materialized_output_dir: Option<String>,
    /// Special inputs consumed by this step, by declared name.
    pub special_inputs: IndexMap<String, SpecialInputRef>,
    /// Special outputs produced by this step, by final namespaced name
    /// (spec §4.7 "Namespacing for function maps").
    pub special_outputs: IndexMap<String, SpecialOutputRef>,
}

/// The compiled plan for one parallelization unit: a totally-ordered
/// sequence of frozen step plans (spec §4.4 phase 7, "Freeze").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The unit this plan was compiled for, e.g. a well id.
    pub unit_id: String,
    /// The step plans, in declared pipeline order.
    pub steps: Vec<StepPlan>,
}

impl ExecutionPlan {
    /// Returns `true` iff every adjacent pair of steps has a continuous
    /// memory-type chain (spec §8 property 4).
    #[must_use]
    pub fn chain_is_continuous(&self) -> bool {
        self.steps
            .windows(2)
            .all(|w| w[0].output_memory_type == w[1].input_memory_type)
    }

    /// Returns `true` iff every GPU-requiring step shares one `gpu_id`
    /// (spec §8 property 5, GPU affinity).
    #[must_use]
    pub fn gpu_affinity_holds(&self) -> bool {
        let mut assigned = self.steps.iter().filter_map(|s| s.gpu_id);
        match assigned.next() {
            None => true,
            Some(first) => assigned.all(|g| g == first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{FunctionChain, FunctionPattern, FunctionRef};
    use indexmap::IndexMap;

    fn step_plan(index: usize, input: MemoryType, output: MemoryType, gpu: Option<u32>) -> StepPlan {
        StepPlan {
            step_index: index,
            name: format!("step{index}"),
            input_dir: format!("/in{index}"),
            output_dir: format!("/out{index}"),
            read_backend: BackendId::Memory,
            write_backend: BackendId::Memory,
            input_memory_type: input,
            output_memory_type: output,
            gpu_id: gpu,
            variable_components: vec!["site".into()],
            group_by: None,
            function_pattern: FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
                "noop", input, output,
            ))),
            materialized_output_dir: None,
            special_inputs: IndexMap::new(),
            special_outputs: IndexMap::new(),
        }
    }

    #[test]
    fn detects_chain_break() {
        let plan = ExecutionPlan {
            unit_id: "A01".into(),
            steps: vec![
                step_plan(0, MemoryType::Cpu, MemoryType::Cpu, None),
                step_plan(1, MemoryType::Cuda, MemoryType::Cpu, Some(0)),
            ],
        };
        assert!(!plan.chain_is_continuous());
    }

    #[test]
    fn continuous_chain_holds() {
        let plan = ExecutionPlan {
            unit_id: "A01".into(),
            steps: vec![
                step_plan(0, MemoryType::Cpu, MemoryType::Cpu, None),
                step_plan(1, MemoryType::Cpu, MemoryType::Cuda, Some(0)),
            ],
        };
        assert!(plan.chain_is_continuous());
        assert!(plan.gpu_affinity_holds());
    }

    #[test]
    fn detects_gpu_affinity_violation() {
        let plan = ExecutionPlan {
            unit_id: "A01".into(),
            steps: vec![
                step_plan(0, MemoryType::Cpu, MemoryType::Cuda, Some(0)),
                step_plan(1, MemoryType::Cuda, MemoryType::Cuda, Some(1)),
            ],
        };
        assert!(!plan.gpu_affinity_holds());
    }
}
