// SPDX-License-Identifier: Apache-2.0

//! Lazy, self-registering backend registry (spec §4.2 "Registry contract").
//!
//! Backends register themselves at class-definition time via
//! [`distributed_slice`]; the registry itself is built lazily on first use
//! so that GPU-heavy or remote backends are only constructed on demand,
//! matching `otap-df-engine`'s `get_factory_map` pattern for its receiver/
//! processor/exporter factories.

use crate::backend::Backend;
use crate::error::Error;
use linkme::distributed_slice;
use once_cell::sync::OnceCell;
use openhcs_core::backend::BackendId;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered backend's name and a constructor function. Worker processes
/// that opt out of GPU-heavy/remote backends (spec §4.2) simply never call
/// `create` for those entries; nothing here forces eager construction.
pub struct BackendFactory {
    pub id: BackendId,
    pub create: fn() -> Result<Arc<dyn Backend>, Error>,
}

#[distributed_slice]
pub static BACKEND_FACTORIES: [BackendFactory] = [..];

struct Registry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

fn registry(disable_gpu_backends: bool) -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut backends = HashMap::new();
        for factory in BACKEND_FACTORIES.iter() {
            if disable_gpu_backends && factory.id == BackendId::RemoteObject {
                continue;
            }
            match (factory.create)() {
                Ok(backend) => {
                    let _ = backends.insert(factory.id.as_str().to_string(), backend);
                }
                Err(err) => {
                    tracing::warn!(backend = %factory.id, error = %err, "backend failed to initialize, skipping");
                }
            }
        }
        Registry { backends }
    })
}

/// Looks up a backend by id, initializing the registry on first call.
///
/// `disable_gpu_backends` mirrors the worker-process opt-out flag (spec
/// §4.2); it only has effect the first time the registry is built, since
/// the registry is a process-wide singleton, matching how a worker process
/// decides its backend set once at startup.
pub fn get_backend(id: &BackendId, disable_gpu_backends: bool) -> Result<Arc<dyn Backend>, Error> {
    registry(disable_gpu_backends)
        .backends
        .get(id.as_str())
        .cloned()
        .ok_or_else(|| Error::UnknownBackend { id: id.as_str().to_string() })
}

/// Registers a backend factory. Call from each backend module's own
/// `#[distributed_slice(BACKEND_FACTORIES)]` static.
#[macro_export]
macro_rules! register_backend {
    ($name:ident, $id:expr, $ctor:expr) => {
        #[linkme::distributed_slice($crate::registry::BACKEND_FACTORIES)]
        static $name: $crate::registry::BackendFactory = $crate::registry::BackendFactory {
            id: $id,
            create: $ctor,
        };
    };
}
