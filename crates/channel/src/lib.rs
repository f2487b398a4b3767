// SPDX-License-Identifier: Apache-2.0

//! Bounded channels for cross-thread unit-result and task-queue passing
//! (spec §5: workers are OS threads, not a single-threaded event loop per
//! core, so every value crossing a channel here must be `Send`).

pub mod error;
pub mod mpmc;
pub mod mpsc;

pub use error::{RecvError, SendError};
