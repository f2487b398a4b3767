// SPDX-License-Identifier: Apache-2.0

//! Executor and memory system for the OpenHCS pipeline.
//!
//! Given a [`openhcs_compiler::CompiledUnit`], this crate runs one unit's
//! plan to completion: stacking each step's matched files into a 3-D array,
//! converting between memory types at step boundaries (spec §4.5.1),
//! invoking the step's registered processing function(s), loading and
//! persisting special inputs/outputs (spec §4.7), writing slices back out
//! through the VFS (plain per-file writes, or chunked through the columnar
//! backend per spec §4.8), and releasing per-worker GPU caches once the
//! unit is done (spec §4.5.3).

pub mod array;
pub mod chunked_write;
pub mod error;
pub mod executor;
pub mod function;
pub mod gpu_cache;
pub mod materializer;
pub mod memory;
pub mod special_io;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use array::{stack, unstack, Array3Data};
pub use error::Error;
pub use executor::{execute_unit, ExecuteRequest};
pub use function::{get_function, FunctionFactory, FunctionOutput, ProcessingFunction, FUNCTIONS};
pub use gpu_cache::GpuCacheTracker;
pub use materializer::{get_materializer, Materializer, MaterializerFactory, MATERIALIZERS};
pub use memory::{convert, conversion_method, ConversionMethod};
pub use special_io::{load_special_inputs, persist_special_outputs, BackendResolver};
pub use state::{StepState, UnitOutcome};
