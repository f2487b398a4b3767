// SPDX-License-Identifier: Apache-2.0

//! Errors for the controller crate.

use miette::Diagnostic;

/// Errors that can occur in the controller crate.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum Error {
    /// Compiling the pipeline into per-unit plans failed.
    #[error("compilation failed: {0}")]
    Compile(#[from] openhcs_compiler::Error),

    /// Failed to spawn an OS thread.
    #[error("failed to spawn worker thread '{thread_name}': {source}")]
    ThreadSpawnError {
        thread_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to enumerate available CPU cores on this platform.
    #[error("failed to get available CPU cores (core detection unavailable on this platform)")]
    CoreDetectionUnavailable,

    /// Invalid or out-of-bounds requested CPU core ID range.
    #[error("invalid core ID range [{start}..={end}]: {message}. Available core IDs: {available:?}")]
    InvalidCoreRange {
        start: usize,
        end: usize,
        message: String,
        available: Vec<usize>,
    },

    /// Core affinity error.
    #[error("failed to set core affinity for worker {thread_id} to core {core_id}: {message}")]
    CoreAffinityError {
        thread_id: usize,
        core_id: usize,
        message: String,
    },

    /// A worker thread panicked while running a unit.
    #[error("worker {thread_name}(worker_id: {thread_id}, core_id: {core_id}) panicked: {panic_message}")]
    ThreadPanic {
        thread_name: String,
        thread_id: usize,
        core_id: usize,
        panic_message: String,
    },

    /// Joining a worker thread failed after shutdown was requested.
    #[error("worker '{thread_name}' panicked: {panic_message}")]
    ThreadJoinPanic {
        thread_name: String,
        panic_message: String,
    },

    /// The task queue or result channel closed unexpectedly (a worker
    /// panicked and poisoned the channel, or every sender dropped early).
    #[error("unit result channel closed before every unit reported back")]
    ResultChannelClosed,
}
