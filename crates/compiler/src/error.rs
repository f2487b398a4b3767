// SPDX-License-Identifier: Apache-2.0

//! Compilation-class errors (spec §7): the compiler fails the entire
//! compile on any of these, naming the offending step.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("step {step_index} (`{name}`): memory-type chain break, output `{from}` does not feed input `{to}`")]
    #[diagnostic(code(openhcs_compiler::chain_break))]
    MemoryTypeChainBreak {
        step_index: usize,
        name: String,
        from: openhcs_core::MemoryType,
        to: openhcs_core::MemoryType,
    },

    #[error("step {step_index} (`{name}`): function pattern map arms disagree on memory type")]
    #[diagnostic(code(openhcs_compiler::map_arms_disagree))]
    MapArmsDisagreeOnMemoryType { step_index: usize, name: String },

    #[error("step {step_index} (`{name}`): requires a GPU runtime but none is available")]
    #[diagnostic(
        code(openhcs_compiler::gpu_unavailable),
        help("the GPU registry snapshot has no device for a required runtime")
    )]
    GpuUnavailable { step_index: usize, name: String },

    #[error("step {step_index} (`{name}`): duplicate special output `{output_name}`")]
    #[diagnostic(
        code(openhcs_compiler::duplicate_special_output),
        help("two function-map arms produced the same namespaced output name; see spec Open Question 2")
    )]
    DuplicateSpecialOutput { step_index: usize, name: String, output_name: String },

    #[error("step {step_index} (`{name}`): unresolved special input `{input_name}`")]
    #[diagnostic(code(openhcs_compiler::unresolved_special_input))]
    UnresolvedSpecialInput { step_index: usize, name: String, input_name: String },

    #[error("step {step_index} (`{name}`): special input `{input_name}` references step {producer_index}, which is not earlier in the pipeline")]
    #[diagnostic(code(openhcs_compiler::backward_special_io_reference))]
    BackwardSpecialIoReference {
        step_index: usize,
        name: String,
        input_name: String,
        producer_index: usize,
    },

    #[error("materialization backend `{backend}` is incompatible with a virtual-only plate")]
    #[diagnostic(code(openhcs_compiler::materialization_backend_incompatible))]
    MaterializationBackendIncompatible { backend: openhcs_core::BackendId },

    #[error("step {step_index} (`{name}`): map function pattern requires a `group_by` component")]
    #[diagnostic(code(openhcs_compiler::missing_group_by))]
    MissingGroupBy { step_index: usize, name: String },

    #[error("pipeline has no steps")]
    #[diagnostic(code(openhcs_compiler::empty_pipeline))]
    EmptyPipeline,

    #[error("step {step_index} (`{name}`): function pattern declares no functions")]
    #[diagnostic(code(openhcs_compiler::empty_function_chain))]
    EmptyFunctionChain { step_index: usize, name: String },

    #[error("step_configs has {found} entries, pipeline has {expected} steps")]
    #[diagnostic(code(openhcs_compiler::step_config_count_mismatch))]
    StepConfigCountMismatch { expected: usize, found: usize },

    #[error("no backend is compatible with this plate's microscope handler")]
    #[diagnostic(code(openhcs_compiler::no_compatible_backend))]
    NoCompatibleBackend,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] openhcs_config::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vfs(#[from] openhcs_vfs::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] openhcs_discovery::Error),
}
