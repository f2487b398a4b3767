// SPDX-License-Identifier: Apache-2.0

//! JSON output shape for the `compile` subcommand: one entry per unit,
//! listing step count, read/write backends, assigned GPU, and special-I/O
//! link count, without re-serializing the full frozen [`ExecutionPlan`].

use indexmap::IndexMap;
use openhcs_compiler::CompiledUnit;
use openhcs_core::backend::BackendId;
use openhcs_core::UnitId;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UnitPlanSummary {
    pub unit_id: UnitId,
    pub step_count: usize,
    pub read_backends: Vec<BackendId>,
    pub write_backends: Vec<BackendId>,
    pub gpu_ids: Vec<u32>,
    pub special_io_links: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledPlanSummary {
    pub units: Vec<UnitPlanSummary>,
}

impl CompiledPlanSummary {
    #[must_use]
    pub fn from_compiled(compiled: &IndexMap<UnitId, CompiledUnit>) -> Self {
        let units = compiled
            .iter()
            .map(|(unit_id, unit)| {
                let mut read_backends = Vec::new();
                let mut write_backends = Vec::new();
                let mut gpu_ids = Vec::new();
                let mut special_io_links = 0;
                for step in &unit.plan.steps {
                    read_backends.push(step.read_backend.clone());
                    write_backends.push(step.write_backend.clone());
                    if let Some(gpu_id) = step.gpu_id {
                        gpu_ids.push(gpu_id);
                    }
                    special_io_links += step.special_inputs.len() + step.special_outputs.len();
                }
                UnitPlanSummary {
                    unit_id: unit_id.clone(),
                    step_count: unit.plan.steps.len(),
                    read_backends,
                    write_backends,
                    gpu_ids,
                    special_io_links,
                }
            })
            .collect();
        Self { units }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhcs_core::plan::ExecutionPlan;

    #[test]
    fn summarizes_an_empty_compiled_plan_set() {
        let compiled: IndexMap<UnitId, CompiledUnit> = IndexMap::new();
        let summary = CompiledPlanSummary::from_compiled(&compiled);
        assert!(summary.units.is_empty());
    }

    #[test]
    fn counts_steps_and_gpu_assignments() {
        let mut compiled = IndexMap::new();
        compiled.insert(
            "A01".to_string(),
            CompiledUnit {
                plan: ExecutionPlan { unit_id: "A01".to_string(), steps: Vec::new() },
                chunk_declarations: IndexMap::new(),
            },
        );
        let summary = CompiledPlanSummary::from_compiled(&compiled);
        assert_eq!(summary.units.len(), 1);
        assert_eq!(summary.units[0].unit_id, "A01");
        assert_eq!(summary.units[0].step_count, 0);
    }
}
