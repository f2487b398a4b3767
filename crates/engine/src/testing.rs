// SPDX-License-Identifier: Apache-2.0

//! Test-only fixtures for the function and materializer registries: a
//! pass-through function and a no-op materializer, registered under fixed
//! names so executor tests can exercise a real [`crate::executor`] run
//! without depending on any real processing module.

use crate::array::Array3Data;
use crate::function::{FunctionOutput, ProcessingFunction};
use crate::materializer::Materializer;
use crate::{register_function, register_materializer};
use openhcs_vfs::Backend;
use serde_json::Value;
use std::collections::HashMap;

/// Registered as `"echo"`: returns its input unchanged, with no special
/// outputs.
pub struct EchoFunction;

impl ProcessingFunction for EchoFunction {
    fn call(
        &self,
        input: Array3Data,
        _special_inputs: &HashMap<String, Vec<u8>>,
        _kwargs: &Value,
    ) -> Result<FunctionOutput, String> {
        Ok(FunctionOutput { array: input, special_outputs: Vec::new() })
    }
}

register_function!(ECHO_FUNCTION, "echo", || Box::new(EchoFunction));

/// Registered as `"noop"`: writes nothing beyond what the caller already
/// saved via [`Backend::save`] before invoking it.
pub struct NoopMaterializer;

impl Materializer for NoopMaterializer {
    fn materialize(&self, _data: &[u8], _target_path: &str, _backend: &dyn Backend) -> Result<(), String> {
        Ok(())
    }
}

register_materializer!(NOOP_MATERIALIZER, "noop", || Box::new(NoopMaterializer));
