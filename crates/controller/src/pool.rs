// SPDX-License-Identifier: Apache-2.0

//! The worker pool (spec §5): `num_workers` OS threads, each pinned to a
//! distinct CPU core where possible, pulling units off a shared queue and
//! running them to completion one at a time. A unit's steps are strictly
//! sequential within its worker; units never share mutable state, so a
//! unit's failure or panic never reaches its peers.

use crate::error::Error;
use crate::report::{RunReport, UnitResult};
use openhcs_compiler::CompiledUnit;
use openhcs_core::backend::BackendId;
use openhcs_core::UnitId;
use openhcs_discovery::UnitPatterns;
use openhcs_engine::{execute_unit, BackendResolver, ExecuteRequest, UnitOutcome};
use openhcs_vfs::Backend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the pool resolves a [`BackendId`] to a live backend instance from
/// any worker thread. Unlike [`openhcs_engine::special_io::BackendResolver`]
/// this must be `Send + Sync`: the same resolver is shared across every
/// worker thread in the pool.
pub type SharedBackendResolver = dyn Fn(&BackendId) -> Result<Arc<dyn Backend>, openhcs_vfs::Error> + Send + Sync;

/// One unit queued for execution: its compiled plan plus the discovered
/// patterns the executor groups files by.
pub struct UnitTask {
    pub unit_id: UnitId,
    pub compiled: CompiledUnit,
    pub patterns: UnitPatterns,
}

/// Everything the pool needs to run a batch of units to completion.
pub struct RunRequest {
    pub tasks: Vec<UnitTask>,
    pub get_backend: Arc<SharedBackendResolver>,
    pub allow_cpu_fallback: bool,
    /// Per-unit wall-clock budget (spec §5 "timeouts are per-unit,
    /// equivalent to cancelling that unit on expiration").
    pub unit_timeout: Option<Duration>,
}

/// A fixed-size pool of worker threads, pinned to distinct CPU cores when
/// the platform reports any.
pub struct WorkerPool {
    num_workers: usize,
    core_ids: Option<Vec<core_affinity::CoreId>>,
}

impl WorkerPool {
    /// Builds a pool sized by `num_workers` (spec §5: parallelism is across
    /// units, on a fixed worker pool sized by `num_workers`). Core pinning
    /// is attempted on a best-effort basis: if the platform can't report
    /// core IDs, workers simply run unpinned rather than failing the pool.
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        let core_ids = core_affinity::get_core_ids().filter(|ids| !ids.is_empty());
        if core_ids.is_none() {
            tracing::warn!("core detection unavailable on this platform; workers will run unpinned");
        }
        Self { num_workers: num_workers.max(1), core_ids }
    }

    /// Runs every task in `req.tasks` to completion, returning one
    /// [`UnitResult`] per unit regardless of outcome (spec §5 "Failure
    /// isolation": a unit's failure never aborts its peers). `cancel`,
    /// shared with the caller, lets the caller cancel every in-flight and
    /// not-yet-started unit (e.g. on SIGINT or an overall run timeout).
    pub fn run(&self, req: RunRequest, cancel: Arc<AtomicBool>) -> Result<RunReport, Error> {
        let task_count = req.tasks.len();
        let (task_tx, task_rx) = openhcs_channel::mpmc::bounded::<UnitTask>(task_count.max(1));
        let (result_tx, result_rx) = openhcs_channel::mpsc::bounded::<UnitResult>(task_count.max(1));

        for task in req.tasks {
            task_tx.send(task).expect("queue sized to hold every task");
        }
        drop(task_tx);

        let get_backend = req.get_backend;
        let allow_cpu_fallback = req.allow_cpu_fallback;
        let unit_timeout = req.unit_timeout;

        let handles: Vec<_> = (0..self.num_workers)
            .map(|worker_id| {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let get_backend = Arc::clone(&get_backend);
                let cancel = Arc::clone(&cancel);
                let core_id = self.core_ids.as_ref().map(|ids| ids[worker_id % ids.len()]);
                let thread_name = format!("openhcs-worker-{worker_id}");
                std::thread::Builder::new()
                    .name(thread_name.clone())
                    .spawn(move || {
                        if let Some(core_id) = core_id {
                            if !core_affinity::set_for_current(core_id) {
                                tracing::warn!(worker_id, core_id = core_id.id, "failed to pin worker to core");
                            }
                        }
                        run_worker(worker_id, &task_rx, &result_tx, get_backend.as_ref(), allow_cpu_fallback, unit_timeout, &cancel);
                    })
                    .map_err(|source| Error::ThreadSpawnError { thread_name, source })
            })
            .collect::<Result<_, _>>()?;
        drop(result_tx);

        let mut results = Vec::with_capacity(task_count);
        while let Ok(result) = result_rx.recv() {
            results.push(result);
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            let thread_name = format!("openhcs-worker-{worker_id}");
            let core_id = self.core_ids.as_ref().map(|ids| ids[worker_id % ids.len()].id).unwrap_or(0);
            if let Err(panic) = handle.join() {
                return Err(Error::ThreadPanic {
                    thread_name,
                    thread_id: worker_id,
                    core_id,
                    panic_message: format!("{panic:?}"),
                });
            }
        }

        if results.len() != task_count {
            return Err(Error::ResultChannelClosed);
        }
        Ok(RunReport::new(results))
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    _worker_id: usize,
    task_rx: &openhcs_channel::mpmc::Receiver<UnitTask>,
    result_tx: &openhcs_channel::mpsc::Sender<UnitResult>,
    get_backend: &SharedBackendResolver,
    allow_cpu_fallback: bool,
    unit_timeout: Option<Duration>,
    cancel: &Arc<AtomicBool>,
) {
    while let Ok(task) = task_rx.recv() {
        let started_at = Instant::now();
        let cancel = Arc::clone(cancel);
        let is_cancelled = move || {
            cancel.load(Ordering::Relaxed)
                || unit_timeout.is_some_and(|timeout| started_at.elapsed() > timeout)
        };
        let resolver: &BackendResolver<'_> = &|id: &BackendId| get_backend(id);
        let outcome = execute_unit(&ExecuteRequest {
            plan: &task.compiled.plan,
            unit_patterns: &task.patterns,
            chunk_declarations: &task.compiled.chunk_declarations,
            get_backend: resolver,
            allow_cpu_fallback,
            is_cancelled: &is_cancelled,
        });
        let _ = result_tx.send(UnitResult { unit_id: task.unit_id, outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhcs_core::component::Pattern;
    use openhcs_core::memory::MemoryType;
    use openhcs_core::plan::ExecutionPlan;
    use openhcs_vfs::memory::MemoryBackend;
    use indexmap::IndexMap;

    fn empty_plan(unit_id: &str) -> CompiledUnit {
        CompiledUnit {
            plan: ExecutionPlan { unit_id: unit_id.to_string(), steps: Vec::new() },
            chunk_declarations: IndexMap::new(),
        }
    }

    fn backend_resolver() -> Arc<SharedBackendResolver> {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        Arc::new(move |_: &BackendId| Ok(Arc::clone(&backend)))
    }

    #[test]
    fn every_task_reports_a_result_regardless_of_order() {
        let pool = WorkerPool::new(2);
        let tasks = (0..5)
            .map(|i| UnitTask {
                unit_id: format!("well-{i}"),
                compiled: empty_plan(&format!("well-{i}")),
                patterns: UnitPatterns::Flat(vec![Pattern::new(String::new())]),
            })
            .collect();
        let req = RunRequest {
            tasks,
            get_backend: backend_resolver(),
            allow_cpu_fallback: true,
            unit_timeout: None,
        };
        let report = pool.run(req, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(report.results.len(), 5);
        assert!(report.results.iter().all(|r| r.outcome == UnitOutcome::Done));
    }

    #[test]
    fn multiple_queued_units_all_complete_independently() {
        let pool = WorkerPool::new(2);
        let tasks = vec![
            UnitTask { unit_id: "a".into(), compiled: empty_plan("a"), patterns: UnitPatterns::Flat(Vec::new()) },
            UnitTask { unit_id: "b".into(), compiled: empty_plan("b"), patterns: UnitPatterns::Flat(Vec::new()) },
        ];
        let req = RunRequest { tasks, get_backend: backend_resolver(), allow_cpu_fallback: true, unit_timeout: None };
        let report = pool.run(req, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.done_count(), 2);
    }

    fn step_with_function(function_name: &str) -> openhcs_core::plan::StepPlan {
        openhcs_core::plan::StepPlan {
            step_index: 0,
            name: "only".into(),
            input_dir: "in".into(),
            output_dir: "out".into(),
            read_backend: BackendId::Memory,
            write_backend: BackendId::Memory,
            input_memory_type: MemoryType::Cpu,
            output_memory_type: MemoryType::Cpu,
            gpu_id: None,
            variable_components: Vec::new(),
            group_by: None,
            function_pattern: openhcs_core::step::FunctionPattern::Chain(
                openhcs_core::step::FunctionChain::Single(openhcs_core::step::FunctionRef::new(
                    function_name,
                    MemoryType::Cpu,
                    MemoryType::Cpu,
                )),
            ),
            materialized_output_dir: None,
            special_inputs: IndexMap::new(),
            special_outputs: IndexMap::new(),
        }
    }

    #[test]
    fn one_units_failure_never_stops_its_peer_from_completing() {
        let pool = WorkerPool::new(2);
        let mut broken = empty_plan("broken");
        broken.plan.steps.push(step_with_function("does-not-exist"));
        let tasks = vec![
            UnitTask {
                unit_id: "broken".into(),
                compiled: broken,
                patterns: UnitPatterns::Flat(vec![Pattern::new(String::new())]),
            },
            UnitTask { unit_id: "fine".into(), compiled: empty_plan("fine"), patterns: UnitPatterns::Flat(Vec::new()) },
        ];
        let req = RunRequest { tasks, get_backend: backend_resolver(), allow_cpu_fallback: true, unit_timeout: None };
        let report = pool.run(req, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.done_count(), 1);
        assert_eq!(report.failed().count(), 1);
    }

    #[test]
    fn pre_cancelled_units_report_cancelled_with_no_steps_run() {
        let pool = WorkerPool::new(1);
        let mut plan = empty_plan("a");
        plan.plan.steps.push(step_with_function("echo"));
        let req = RunRequest {
            tasks: vec![UnitTask { unit_id: "a".into(), compiled: plan, patterns: UnitPatterns::Flat(Vec::new()) }],
            get_backend: backend_resolver(),
            allow_cpu_fallback: true,
            unit_timeout: None,
        };
        let report = pool.run(req, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(report.results.len(), 1);
        assert!(matches!(report.results[0].outcome, UnitOutcome::Cancelled { step_index: 0, .. }));
    }
}
