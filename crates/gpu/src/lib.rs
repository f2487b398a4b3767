// SPDX-License-Identifier: Apache-2.0

//! GPU runtime detection and device registry (spec §4.6): a thread-safe,
//! lazily-built snapshot of `gpu_id -> { max_concurrent_units }` across
//! every supported runtime, probed once and memoized for the process.

pub mod cuda;
pub mod error;
pub mod probe;
pub mod registry;

pub use error::Error;
pub use probe::{ProbeFactory, RawDevice, RuntimeProbe, RUNTIME_PROBES};
pub use registry::{snapshot, GpuDevice, GpuSnapshot};
