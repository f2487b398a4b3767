// SPDX-License-Identifier: Apache-2.0

//! Hierarchical configuration resolution for the OpenHCS pipeline compiler
//! (global → pipeline → step), with a sentinel `INHERIT` value kept
//! distinct from every concrete value it might resolve to.
//!
//! [`resolver::ResolutionContext`] implements the generic MRO × scope-stack
//! walk; [`scopes`] wires the concrete resolvable config groups
//! (components, path planning, VFS defaults, materialization, zarr, GPU)
//! into the Global/Pipeline/Step records the compiler actually loads.

pub mod components;
pub mod error;
pub mod field;
pub mod gpu;
pub mod loader;
pub mod materialization;
pub mod path_planning;
pub mod resolver;
pub mod scopes;
pub mod vfs;
pub mod zarr;

pub use components::ComponentsConfig;
pub use error::Error;
pub use field::Field;
pub use loader::{load_global_config, load_pipeline_config};
pub use resolver::{ResolutionContext, ScopeKind};
pub use scopes::{resolve_step, GlobalConfig, PipelineConfig, ResolvedStepConfig, StepConfig};
