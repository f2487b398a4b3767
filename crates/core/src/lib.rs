// SPDX-License-Identifier: Apache-2.0

//! Shared data model for the OpenHCS pipeline compiler and execution engine.
//!
//! Data Model:
//! - a plate has subdirectories, each parsed by a microscope handler into a
//!   component map per file
//! - files sharing a template after substituting variable components form a
//!   pattern
//! - patterns are grouped into parallelization units (typically wells)
//! - a pipeline is a sequence of steps, each attaching a function pattern
//! - compiling a pipeline against a plate produces one execution plan per unit
//!
//! This crate holds only the vocabulary; the config resolver, VFS, pattern
//! discovery, compiler and executor crates all depend on it.

pub mod backend;
pub mod component;
pub mod memory;
pub mod plan;
pub mod plate;
pub mod step;

pub use backend::{BackendFamily, BackendId};
pub use component::{Component, ComponentMap, ComponentValue, Pattern};
pub use memory::MemoryType;
pub use plan::{ExecutionPlan, SpecialInputRef, SpecialOutputRef, StepPlan};
pub use plate::{PlateMetadata, SubdirectoryMetadata};
pub use step::{FunctionChain, FunctionPattern, FunctionRef, PipelineDefinition, StepDefinition};

/// A plate-relative POSIX path. Strings, never platform `PathBuf`s, because
/// two different backends may share the same path string (VFS location
/// transparency, spec §4.2).
pub type VPath = String;

/// Identifier of a parallelization unit, e.g. a well id such as `"A01"`.
pub type UnitId = String;
