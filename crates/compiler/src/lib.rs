// SPDX-License-Identifier: Apache-2.0

//! The pipeline compiler (spec §4.4): turns a pipeline definition, a
//! plate's resolved step configs, its discovered units, its microscope
//! handler's compatible backends, and the GPU registry snapshot into one
//! frozen [`openhcs_core::plan::ExecutionPlan`] per unit.

pub mod compiler;
pub mod error;
pub mod gpu_plan;
pub mod memory_plan;
pub mod special_io;

pub use compiler::{compile, ChunkDeclaration, CompileRequest, CompiledUnit};
pub use error::Error;
