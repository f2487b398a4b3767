// SPDX-License-Identifier: Apache-2.0

//! Runtime availability probes (spec §4.6): each supported GPU runtime
//! contributes a probe that enumerates its devices. Probes run lazily, on
//! first registry access, because a runtime's initialization can spawn many
//! threads and must never happen at process startup or static-link time.

use linkme::distributed_slice;

/// A device as reported by a runtime probe, before it is turned into a
/// [`crate::registry::GpuDevice`] with its computed `max_concurrent_units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDevice {
    pub index: u32,
}

pub trait RuntimeProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Enumerates this runtime's devices. Returns an empty vec, never an
    /// error, when the runtime's driver/library isn't present on this
    /// machine — absence of a runtime is not a registry failure.
    fn probe(&self) -> Vec<RawDevice>;
}

pub struct ProbeFactory {
    pub name: &'static str,
    pub create: fn() -> Box<dyn RuntimeProbe>,
}

#[distributed_slice]
pub static RUNTIME_PROBES: [ProbeFactory] = [..];

#[macro_export]
macro_rules! register_probe {
    ($static_name:ident, $name:expr, $ctor:expr) => {
        #[linkme::distributed_slice($crate::probe::RUNTIME_PROBES)]
        static $static_name: $crate::probe::ProbeFactory =
            $crate::probe::ProbeFactory { name: $name, create: $ctor };
    };
}
