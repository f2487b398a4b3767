// SPDX-License-Identifier: Apache-2.0

//! Microscope handlers (spec §4.3): one per vendor format, each supplying
//! a filename parser, a metadata handler, the root image directory, the
//! compatible-backend list, and virtual-mapping construction for layouts
//! that are not naturally flat.

use crate::error::Error;
use crate::parser::FilenameParser;
use indexmap::IndexMap;
use linkme::distributed_slice;
use once_cell::sync::OnceCell;
use openhcs_core::backend::BackendId;
use openhcs_vfs::Backend;
use std::collections::HashMap;
use std::sync::Arc;

/// Vendor metadata a handler can expose once it has located the plate's
/// metadata file (spec §4.3 "metadata handler").
#[derive(Debug, Clone, Default)]
pub struct VendorMetadata {
    pub grid_dimensions: Option<(u32, u32)>,
    pub pixel_size: Option<f64>,
    pub channels: IndexMap<String, Option<String>>,
    pub wells: IndexMap<String, Option<String>>,
    pub sites: IndexMap<String, Option<String>>,
    pub z_indexes: IndexMap<String, Option<String>>,
}

pub trait MicroscopeHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn filename_parser(&self) -> Arc<dyn FilenameParser>;

    /// Where, relative to the plate root, this format's images live.
    fn root_dir(&self, plate_root: &str) -> String;

    /// Backends this format's plate can be read from/written to, in
    /// priority order (spec §4.2 "Primary backend selection").
    fn compatible_backends(&self) -> Vec<BackendId>;

    /// Locates and parses this format's vendor metadata, if present.
    fn read_vendor_metadata(&self, backend: &dyn Backend, plate_root: &str) -> Result<VendorMetadata, Error>;

    /// For layouts with nested per-timepoint or per-z subfolders, produces
    /// a virtual-path -> real-path mapping that makes the plate look flat,
    /// without copying or symlinking any file (spec §4.3
    /// `build_virtual_mapping`). Formats that are already flat return an
    /// empty map.
    fn build_virtual_mapping(
        &self,
        backend: &dyn Backend,
        plate_root: &str,
    ) -> Result<IndexMap<String, String>, Error>;

    /// Handlers may reassign component values after parsing — e.g.
    /// remapping field indices to a spatial order read from vendor XML —
    /// before pattern formation (spec §4.3). Default: no remapping.
    fn remap_components(&self, map: openhcs_core::component::ComponentMap) -> openhcs_core::component::ComponentMap {
        map
    }
}

pub struct HandlerFactory {
    pub name: &'static str,
    pub create: fn() -> Arc<dyn MicroscopeHandler>,
}

#[distributed_slice]
pub static HANDLER_FACTORIES: [HandlerFactory] = [..];

static HANDLERS: OnceCell<HashMap<&'static str, Arc<dyn MicroscopeHandler>>> = OnceCell::new();

fn handlers() -> &'static HashMap<&'static str, Arc<dyn MicroscopeHandler>> {
    HANDLERS.get_or_init(|| {
        HANDLER_FACTORIES.iter().map(|f| (f.name, (f.create)())).collect()
    })
}

/// Looks up a registered microscope handler by name.
pub fn get_handler(name: &str) -> Result<Arc<dyn MicroscopeHandler>, Error> {
    handlers()
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownMicroscopeType { name: name.to_string() })
}

#[macro_export]
macro_rules! register_handler {
    ($static_name:ident, $name:expr, $ctor:expr) => {
        #[linkme::distributed_slice($crate::handler::HANDLER_FACTORIES)]
        static $static_name: $crate::handler::HandlerFactory =
            $crate::handler::HandlerFactory { name: $name, create: $ctor };
    };
}
