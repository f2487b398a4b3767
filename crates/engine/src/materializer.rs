// SPDX-License-Identifier: Apache-2.0

//! Materializer registry (spec §4.7 "Materializers"): a materializer
//! serializes one structured special output (e.g. tabular results) through
//! the VFS after a step's main writes complete. Self-registering via
//! [`linkme::distributed_slice`], mirroring [`crate::function`]'s registry.

use crate::error::Error;
use linkme::distributed_slice;
use once_cell::sync::OnceCell;
use openhcs_vfs::Backend;
use std::collections::HashMap;

pub trait Materializer: Send + Sync {
    fn materialize(&self, data: &[u8], target_path: &str, backend: &dyn Backend) -> Result<(), String>;
}

pub struct MaterializerFactory {
    pub name: &'static str,
    pub create: fn() -> Box<dyn Materializer>,
}

#[distributed_slice]
pub static MATERIALIZERS: [MaterializerFactory] = [..];

#[macro_export]
macro_rules! register_materializer {
    ($static_name:ident, $name:expr, $ctor:expr) => {
        #[linkme::distributed_slice($crate::materializer::MATERIALIZERS)]
        static $static_name: $crate::materializer::MaterializerFactory =
            $crate::materializer::MaterializerFactory { name: $name, create: $ctor };
    };
}

static REGISTRY: OnceCell<HashMap<&'static str, fn() -> Box<dyn Materializer>>> = OnceCell::new();

fn registry() -> &'static HashMap<&'static str, fn() -> Box<dyn Materializer>> {
    REGISTRY.get_or_init(|| MATERIALIZERS.iter().map(|m| (m.name, m.create)).collect())
}

pub fn get_materializer(name: &str) -> Result<Box<dyn Materializer>, Error> {
    registry()
        .get(name)
        .map(|create| create())
        .ok_or_else(|| Error::UnknownMaterializer { name: name.to_string() })
}
