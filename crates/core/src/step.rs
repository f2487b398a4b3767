// SPDX-License-Identifier: Apache-2.0

//! Steps and function patterns (spec §3 "Step", "Function pattern").

use crate::component::Component;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A reference to one registered processing function plus its keyword
/// arguments, and the special inputs/outputs it declares (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRef {
    /// The name the function is registered under.
    pub name: String,
    /// Keyword arguments passed to the function at call time.
    #[serde(default)]
    pub kwargs: serde_json::Value,
    /// `(input_memory_type, output_memory_type)` the function declares.
    pub memory_type: (crate::memory::MemoryType, crate::memory::MemoryType),
    /// Names of special inputs this function consumes, in declared order.
    #[serde(default)]
    pub special_inputs: Vec<String>,
    /// Names of special outputs this function produces, each optionally
    /// paired with a materializer id, in declared order.
    #[serde(default)]
    pub special_outputs: Vec<(String, Option<String>)>,
}

impl FunctionRef {
    /// Creates a function reference with no special I/O and the given
    /// memory-type contract.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        input: crate::memory::MemoryType,
        output: crate::memory::MemoryType,
    ) -> Self {
        Self {
            name: name.into(),
            kwargs: serde_json::Value::Null,
            memory_type: (input, output),
            special_inputs: Vec::new(),
            special_outputs: Vec::new(),
        }
    }
}

/// Either a single function or a sequence of functions applied in order.
///
/// A sequence's step `i` output memory type must equal step `i+1`'s input
/// memory type (spec §3 invariant on function patterns).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionChain {
    /// A single function (optionally with kwargs, folded into [`FunctionRef`]).
    Single(FunctionRef),
    /// A sequence of functions applied in order.
    Sequence(Vec<FunctionRef>),
}

impl FunctionChain {
    /// The functions in this chain, in execution order.
    #[must_use]
    pub fn functions(&self) -> &[FunctionRef] {
        match self {
            FunctionChain::Single(f) => std::slice::from_ref(f),
            FunctionChain::Sequence(fs) => fs,
        }
    }
}

/// A step's attached function(s).
///
/// Nested maps are structurally impossible here: a [`FunctionPattern::Map`]'s
/// arms are [`FunctionChain`]s, never another [`FunctionPattern`] (spec §3:
/// "Nested maps are rejected").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionPattern {
    /// A single function or sequence applied uniformly to every group.
    Chain(FunctionChain),
    /// A per-`group_by`-value dispatch: `component_value -> function|sequence`.
    Map {
        /// The component whose value selects an arm, e.g. `"channel"`.
        group_by: Component,
        /// The arms, keyed by the component's string value.
        arms: IndexMap<String, FunctionChain>,
    },
}

impl FunctionPattern {
    /// Whether this pattern requires a `group_by` on its step.
    #[must_use]
    pub fn requires_group_by(&self) -> bool {
        matches!(self, FunctionPattern::Map { .. })
    }
}

/// A user-declared processing step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// A human-readable step name, used in diagnostics.
    pub name: String,
    /// The function(s) attached to this step.
    pub function_pattern: FunctionPattern,
    /// The variable components for this step (substituted with `{iii}`).
    pub variable_components: Vec<Component>,
    /// The component this step groups patterns by, if any.
    #[serde(default)]
    pub group_by: Option<Component>,
}

/// An ordered sequence of steps: one user pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineDefinition {
    /// The steps, executed strictly in order within one unit.
    pub steps: Vec<StepDefinition>,
}
