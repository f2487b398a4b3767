// SPDX-License-Identifier: Apache-2.0

//! The worker pool that runs compiled pipelines (spec §5).
//!
//! Parallelism is across units, not within one: a unit's steps run
//! strictly sequentially on whichever worker picks it up, while
//! `num_workers` workers run different units concurrently. Workers are
//! plain OS threads pinned to distinct CPU cores where the platform
//! supports it; none of them share mutable state, so one unit's failure,
//! cancellation, or panic never reaches its peers.

pub mod error;
pub mod pool;
pub mod report;

pub use error::Error;
pub use pool::{RunRequest, SharedBackendResolver, UnitTask, WorkerPool};
pub use report::{RunReport, UnitResult};
