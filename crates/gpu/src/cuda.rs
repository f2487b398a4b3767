// SPDX-License-Identifier: Apache-2.0

//! CUDA runtime probe. Detection is a cheap filesystem enumeration rather
//! than a driver call: this registry only needs device *count*, and
//! linking against the CUDA runtime library here would force it to load
//! during probe, defeating the point of deferring runtime init.

use crate::probe::{RawDevice, RuntimeProbe};
use crate::register_probe;
use std::path::Path;

pub struct CudaProbe;

impl RuntimeProbe for CudaProbe {
    fn name(&self) -> &'static str {
        "cuda"
    }

    fn probe(&self) -> Vec<RawDevice> {
        (0..16)
            .take_while(|i| Path::new(&format!("/dev/nvidia{i}")).exists())
            .map(|i| RawDevice { index: i })
            .collect()
    }
}

register_probe!(CUDA_PROBE_FACTORY, "cuda", || Box::new(CudaProbe));
