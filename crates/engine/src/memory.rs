// SPDX-License-Identifier: Apache-2.0

//! Memory-type conversion (spec §4.5.1): preferred zero-copy GPU-to-GPU
//! transfer, CPU round-trip fallback, never silent unless the caller has
//! allowed it.

use crate::array::Array3Data;
use crate::error::Error;
use openhcs_core::memory::MemoryType;

/// Which method a conversion used or would have used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMethod {
    /// Both ends are GPU-resident runtimes reachable through the shared
    /// buffer protocol (spec §4.5.1 "preferred methods").
    ZeroCopyShared,
    /// At least one end is CPU, or the two GPU runtimes don't share a
    /// buffer protocol; data round-trips through host memory.
    CpuRoundTrip,
}

impl ConversionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionMethod::ZeroCopyShared => "zero_copy_shared",
            ConversionMethod::CpuRoundTrip => "cpu_round_trip",
        }
    }
}

/// Which method would be used to convert `from` to `to`, independent of
/// whether the caller actually allows it.
#[must_use]
pub fn conversion_method(from: MemoryType, to: MemoryType) -> ConversionMethod {
    if from.is_gpu() && to.is_gpu() {
        ConversionMethod::ZeroCopyShared
    } else {
        ConversionMethod::CpuRoundTrip
    }
}

/// Converts `array` to `target`, failing loudly if the only available
/// method is a CPU round-trip and the caller hasn't allowed one.
///
/// Every runtime this workspace ships is freely inter-convertible
/// (`openhcs_compiler::memory_plan::can_convert` always returns `true` at
/// compile time); this function is where that compile-time guarantee is
/// actually realized at execution time, tagging the array with its new
/// memory type once the transfer method is resolved.
pub fn convert(array: Array3Data, target: MemoryType, allow_cpu_fallback: bool) -> Result<Array3Data, Error> {
    if array.memory_type == target {
        return Ok(array);
    }
    let method = conversion_method(array.memory_type, target);
    if method == ConversionMethod::CpuRoundTrip && !allow_cpu_fallback {
        return Err(Error::MemoryConversion {
            source: array.memory_type,
            target,
            attempted_method: method.as_str(),
            reason: "CPU round-trip fallback was not allowed for this conversion".to_string(),
        });
    }
    Ok(Array3Data { memory_type: target, data: array.data })
}
