// SPDX-License-Identifier: Apache-2.0

//! The registry of user-registered processing functions (spec §4.5,
//! §4.7): every [`openhcs_core::step::FunctionRef`] names one entry here by
//! `FunctionRef::name`. Self-registering via [`linkme::distributed_slice`],
//! the same pattern `openhcs_vfs::registry` uses for backends, so a
//! function module only needs to link in to become callable.

use crate::array::Array3Data;
use crate::error::Error;
use linkme::distributed_slice;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::HashMap;

/// One function call's result: the main array, plus any special outputs in
/// declared order (spec §4.7 "The return contract").
pub struct FunctionOutput {
    pub array: Array3Data,
    pub special_outputs: Vec<Vec<u8>>,
}

/// A registered processing function.
pub trait ProcessingFunction: Send + Sync {
    fn call(
        &self,
        input: Array3Data,
        special_inputs: &HashMap<String, Vec<u8>>,
        kwargs: &Value,
    ) -> Result<FunctionOutput, String>;
}

pub struct FunctionFactory {
    pub name: &'static str,
    pub create: fn() -> Box<dyn ProcessingFunction>,
}

#[distributed_slice]
pub static FUNCTIONS: [FunctionFactory] = [..];

#[macro_export]
macro_rules! register_function {
    ($static_name:ident, $name:expr, $ctor:expr) => {
        #[linkme::distributed_slice($crate::function::FUNCTIONS)]
        static $static_name: $crate::function::FunctionFactory =
            $crate::function::FunctionFactory { name: $name, create: $ctor };
    };
}

static REGISTRY: OnceCell<HashMap<&'static str, fn() -> Box<dyn ProcessingFunction>>> = OnceCell::new();

fn registry() -> &'static HashMap<&'static str, fn() -> Box<dyn ProcessingFunction>> {
    REGISTRY.get_or_init(|| FUNCTIONS.iter().map(|f| (f.name, f.create)).collect())
}

/// Looks up and instantiates a processing function by its registered name.
pub fn get_function(name: &str) -> Result<Box<dyn ProcessingFunction>, Error> {
    registry()
        .get(name)
        .map(|create| create())
        .ok_or_else(|| Error::UnknownFunction { name: name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_fails_loudly() {
        assert!(matches!(get_function("does-not-exist"), Err(Error::UnknownFunction { .. })));
    }
}
