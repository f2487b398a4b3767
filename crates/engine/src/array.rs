// SPDX-License-Identifier: Apache-2.0

//! The in-memory 3-D array every processing function is called with (spec
//! §4.5.2 "The 3-D contract"). Pixel decoding itself is out of scope (spec
//! §1 "no correctness guarantees about user-supplied processing functions
//! beyond their declared type contracts"); a slice's bytes are interpreted
//! as a flat row-major `u8` plane and widened to `f32` for processing,
//! the simplest contract-preserving representation available without
//! pulling in a real image codec.

use crate::error::Error;
use openhcs_core::memory::{MemoryType, Shape3D};
use ndarray::Array3;

/// A 3-D array tagged with the memory type it currently lives on.
///
/// Every runtime this workspace ships keeps its pixel data host-resident
/// (spec §4.6: the GPU registry only ever counts devices, it never drives
/// one), so `memory_type` here is the array's *declared* placement for
/// routing and conversion-accounting purposes, not a claim about where the
/// bytes physically are.
///
/// The 3-D contract (spec §4.5.2: "a 2-D input is an error") is enforced by
/// this type rather than by a runtime check: `Array3` can't be anything but
/// rank 3, so a 2-D array is structurally unrepresentable here. Stack and
/// unstack (below) are the only functions in this crate that convert
/// to/from a different rank.
#[derive(Debug, Clone)]
pub struct Array3Data {
    pub memory_type: MemoryType,
    pub data: Array3<f32>,
}

impl Array3Data {
    #[must_use]
    pub fn shape(&self) -> Shape3D {
        let (z, y, x) = self.data.dim();
        Shape3D::new(z, y, x)
    }
}

/// Stacks 2-D byte slices (one per z-plane, in pattern order) into a 3-D
/// array (spec §4.5 step 2 "Stack").
pub fn stack(slices: &[(String, Vec<u8>)], y: usize, x: usize, memory_type: MemoryType) -> Result<Array3Data, Error> {
    let expected = y * x;
    let mut data = Array3::<f32>::zeros((slices.len(), y, x));
    for (z, (path, bytes)) in slices.iter().enumerate() {
        if bytes.len() != expected {
            return Err(Error::SliceShapeMismatch { path: path.clone(), expected, actual: bytes.len(), y, x });
        }
        for (i, &byte) in bytes.iter().enumerate() {
            data[(z, i / x, i % x)] = f32::from(byte);
        }
    }
    Ok(Array3Data { memory_type, data })
}

/// Splits a 3-D array back into 2-D byte slices, one per z-plane, clamped
/// to `u8` range (spec §4.5 step 2 "Unstack").
#[must_use]
pub fn unstack(array: &Array3Data) -> Vec<Vec<u8>> {
    let (z, y, x) = array.data.dim();
    (0..z)
        .map(|zi| {
            let mut bytes = Vec::with_capacity(y * x);
            for yi in 0..y {
                for xi in 0..x {
                    bytes.push(array.data[(zi, yi, xi)].clamp(0.0, 255.0) as u8);
                }
            }
            bytes
        })
        .collect()
}
