// SPDX-License-Identifier: Apache-2.0

//! CLI entry point (spec §6): `compile` prints a JSON plan summary and
//! exits 0 or 2; `run` additionally executes the compiled units on a
//! worker pool and exits 0 or 3 depending on whether every unit succeeded;
//! `schema` prints the global config document's JSON Schema and always
//! exits 0.

mod cache;
mod cli;
mod compile_flow;
mod error;
mod pipeline_loader;
mod summary;

use clap::Parser;
use cli::{Cli, Command};
use error::Error;
use openhcs_controller::{RunRequest, SharedBackendResolver, UnitTask, WorkerPool};
use openhcs_core::backend::BackendId;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use summary::CompiledPlanSummary;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn backend_resolver(disable_gpu_backends: bool) -> Arc<SharedBackendResolver> {
    Arc::new(move |id: &BackendId| openhcs_vfs::registry::get_backend(id, disable_gpu_backends))
}

fn run_compile(
    path: std::path::PathBuf,
    pipeline: std::path::PathBuf,
    config: std::path::PathBuf,
    well_filter: Option<Vec<String>>,
) -> Result<(), Error> {
    let disable_gpu_backends = compile_flow::gpu_discovery_disabled();
    let loaded = compile_flow::load(&path, &pipeline, &config, well_filter.as_deref(), disable_gpu_backends)?;

    let gpu_snap = compile_flow::gpu_snapshot(disable_gpu_backends);
    let ids: Vec<u32> = gpu_snap.devices().map(|d| d.gpu_id).collect();
    cache::save("gpu", "v1", &ids);

    let (compiled, _step_configs) = compile_flow::compile_loaded(&loaded, &path, &gpu_snap)?;

    let summary = CompiledPlanSummary::from_compiled(&compiled);
    let json = serde_json::to_string_pretty(&summary).expect("summary serializes");
    println!("{json}");
    Ok(())
}

fn run_run(
    path: std::path::PathBuf,
    pipeline: std::path::PathBuf,
    config: std::path::PathBuf,
    well_filter: Option<Vec<String>>,
    workers: Option<usize>,
) -> Result<(), Error> {
    let disable_gpu_backends = compile_flow::gpu_discovery_disabled();
    let loaded = compile_flow::load(&path, &pipeline, &config, well_filter.as_deref(), disable_gpu_backends)?;

    let gpu_snap = compile_flow::gpu_snapshot(disable_gpu_backends);
    let (compiled, step_configs) = compile_flow::compile_loaded(&loaded, &path, &gpu_snap)?;

    let num_workers = workers.unwrap_or(loaded.global.num_workers);
    let allow_cpu_fallback = compile_flow::allow_cpu_fallback(&step_configs);

    let tasks: Vec<UnitTask> = compiled
        .into_iter()
        .map(|(unit_id, compiled_unit)| {
            let patterns = loaded
                .units
                .get(&unit_id)
                .cloned()
                .expect("compile returns one entry per discovered unit");
            UnitTask { unit_id, compiled: compiled_unit, patterns }
        })
        .collect();

    let pool = WorkerPool::new(num_workers);
    let req = RunRequest {
        tasks,
        get_backend: backend_resolver(disable_gpu_backends),
        allow_cpu_fallback,
        unit_timeout: loaded.global.unit_timeout,
    };
    let report = pool.run(req, Arc::new(AtomicBool::new(false)))?;

    if !report.all_succeeded() {
        let failed: Vec<String> = report
            .results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.unit_id.clone())
            .collect();
        return Err(Error::UnitsFailed { failed });
    }
    Ok(())
}

fn run_schema() -> Result<(), Error> {
    let schema = schemars::schema_for!(openhcs_config::GlobalConfig);
    let json = serde_json::to_string_pretty(&schema).expect("schema serializes");
    println!("{json}");
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Compile { path, pipeline, config, well_filter } => run_compile(path, pipeline, config, well_filter),
        Command::Run { path, pipeline, config, well_filter, workers } => {
            run_run(path, pipeline, config, well_filter, workers)
        }
        Command::Schema => run_schema(),
    };

    if let Err(err) = result {
        eprintln!("{err:?}");
        std::process::exit(err.exit_code());
    }
}
