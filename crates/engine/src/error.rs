// SPDX-License-Identifier: Apache-2.0

//! Errors for the executor and memory system (spec §4.5, §4.7).

use miette::Diagnostic;
use openhcs_core::memory::MemoryType;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("cannot convert from {source} to {target} via {attempted_method}: {reason}")]
    #[diagnostic(code(openhcs::engine::memory_conversion))]
    MemoryConversion {
        source: MemoryType,
        target: MemoryType,
        attempted_method: &'static str,
        reason: String,
    },

    #[error("slice {path} has {actual} bytes, expected {expected} for a {y}x{x} plane")]
    #[diagnostic(code(openhcs::engine::slice_shape_mismatch))]
    SliceShapeMismatch {
        path: String,
        expected: usize,
        actual: usize,
        y: usize,
        x: usize,
    },

    #[error("expected the chunked columnar backend writing to {output_dir}, got a different backend")]
    #[diagnostic(code(openhcs::engine::chunked_backend_mismatch))]
    ChunkedBackendMismatch { output_dir: String },

    #[error("unknown processing function `{name}`")]
    #[diagnostic(
        code(openhcs::engine::unknown_function),
        help("check that the function's module registered under this name is compiled in")
    )]
    UnknownFunction { name: String },

    #[error("unknown materializer `{name}`")]
    #[diagnostic(code(openhcs::engine::unknown_materializer))]
    UnknownMaterializer { name: String },

    #[error("step {step_index} (\"{name}\") function returned {actual} special output(s), {expected} declared")]
    #[diagnostic(
        code(openhcs::engine::special_output_count_mismatch),
        help("a function's return tuple must match its declared special_outputs in count and order")
    )]
    SpecialOutputCountMismatch {
        step_index: usize,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("special input `{input_name}` for step {step_index} (\"{name}\") was never recorded at compile time")]
    #[diagnostic(code(openhcs::engine::missing_special_input))]
    MissingSpecialInput { step_index: usize, name: String, input_name: String },

    #[error("function at step {step_index} (\"{name}\") never produced its declared special output `{output_name}`")]
    #[diagnostic(code(openhcs::engine::missing_special_output))]
    MissingSpecialOutput { step_index: usize, name: String, output_name: String },

    #[error("step {step_index} (\"{name}\") function `{function}` failed: {message}")]
    #[diagnostic(code(openhcs::engine::function_failed))]
    FunctionFailed {
        step_index: usize,
        name: String,
        function: String,
        message: String,
    },

    #[error("unit was cancelled before step {step_index} (\"{name}\") started")]
    #[diagnostic(code(openhcs::engine::cancelled))]
    Cancelled { step_index: usize, name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vfs(#[from] openhcs_vfs::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Gpu(#[from] openhcs_gpu::Error),
}
