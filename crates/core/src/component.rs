// SPDX-License-Identifier: Apache-2.0

//! Components: named categorical dimensions of a plate (well, site, channel,
//! z_index, timepoint, ...) and the maps/patterns built from them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a component dimension, e.g. `"channel"`.
pub type Component = String;

/// The value a component takes for one file: either a numeric index
/// (`site=3`) or an opaque categorical string (`channel="DAPI"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentValue {
    /// An integer index, e.g. a z-plane or site number.
    Index(i64),
    /// An opaque categorical label, e.g. a channel name.
    Name(String),
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentValue::Index(i) => write!(f, "{i}"),
            ComponentValue::Name(n) => write!(f, "{n}"),
        }
    }
}

/// An unordered mapping from component name to its value for one file.
///
/// Backed by an `IndexMap` (not a `HashMap`) so that iteration order is
/// deterministic given identical insertion order, which in turn keeps
/// pattern-template formatting and compiled-plan serialization
/// byte-identical across runs (spec §8 property 1, compile determinism).
pub type ComponentMap = IndexMap<Component, ComponentValue>;

/// A filename template over a subset of components, with `{iii}` placeholders
/// standing in for the variable components, plus the concrete files that
/// match it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// The templated filename, e.g. `"A01_s{iii}_w1.tif"`.
    pub template: String,
    /// Concrete plate-relative filenames matching `template`, in natural
    /// order (spec §8 property 8).
    pub files: Vec<String>,
}

impl Pattern {
    /// Creates a pattern with no matched files yet.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            files: Vec::new(),
        }
    }
}
