// SPDX-License-Identifier: Apache-2.0

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("no GPU devices detected for runtime `{runtime}`")]
    #[diagnostic(code(openhcs_gpu::no_devices))]
    NoDevicesDetected { runtime: &'static str },

    #[error("unknown GPU runtime `{name}`")]
    #[diagnostic(code(openhcs_gpu::unknown_runtime))]
    UnknownRuntime { name: String },

    #[error("GPU device `{gpu_id}` is not registered")]
    #[diagnostic(code(openhcs_gpu::unknown_device))]
    UnknownDevice { gpu_id: u32 },

    #[error("no GPU runtime produced any device and one was required")]
    #[diagnostic(
        code(openhcs_gpu::no_gpus_available),
        help("a step or pipeline declared gpu.required = true but the registry snapshot is empty")
    )]
    NoGpusAvailable,
}
