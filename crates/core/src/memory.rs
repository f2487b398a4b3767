// SPDX-License-Identifier: Apache-2.0

//! The fixed set of array runtimes arrays can live on, and the 3-D shape
//! contract every processing function must honor (spec §3, §4.5.2).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the array runtimes a step's input/output can be tagged with.
///
/// Every processing function declares `(input_memory_type, output_memory_type)`.
/// Arrays crossing a step boundary have exactly the declared type; conversion
/// happens only at stack/unstack (spec §4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Host-resident `ndarray` arrays.
    Cpu,
    /// Device-resident arrays on a CUDA-capable GPU runtime.
    Cuda,
    /// The shared-GPU fallback runtime: device-resident arrays reachable via
    /// a zero-copy buffer-sharing protocol when a dedicated CUDA context is
    /// unavailable or oversubscribed.
    SharedGpu,
}

impl MemoryType {
    /// Whether this memory type designates a GPU-resident runtime.
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        matches!(self, MemoryType::Cuda | MemoryType::SharedGpu)
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryType::Cpu => "cpu",
            MemoryType::Cuda => "cuda",
            MemoryType::SharedGpu => "shared_gpu",
        };
        write!(f, "{s}")
    }
}

/// The 3-D shape every array must have at a step boundary: `[z, y, x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape3D {
    /// Number of z-planes (or slices) stacked together.
    pub z: usize,
    /// Row count of one slice.
    pub y: usize,
    /// Column count of one slice.
    pub x: usize,
}

impl Shape3D {
    /// Builds a shape from already-known array dimensions.
    #[must_use]
    pub const fn new(z: usize, y: usize, x: usize) -> Self {
        Self { z, y, x }
    }
}
