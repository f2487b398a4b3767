// SPDX-License-Identifier: Apache-2.0

//! Aggregated outcome of running a batch of units (spec §5 "Result
//! aggregation": the orchestrator aggregates results at join, a unit's
//! failure never aborting its peers).

use openhcs_core::UnitId;
use openhcs_engine::UnitOutcome;

/// One unit's final outcome, as reported back by whichever worker ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitResult {
    pub unit_id: UnitId,
    pub outcome: UnitOutcome,
}

/// The joined result of a worker-pool run: every unit's outcome, with the
/// counts a caller typically wants without re-scanning the list.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<UnitResult>,
}

impl RunReport {
    #[must_use]
    pub fn new(results: Vec<UnitResult>) -> Self {
        Self { results }
    }

    #[must_use]
    pub fn done_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> impl Iterator<Item = &UnitResult> {
        self.results.iter().filter(|r| matches!(r.outcome, UnitOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn cancelled(&self) -> impl Iterator<Item = &UnitResult> {
        self.results.iter().filter(|r| matches!(r.outcome, UnitOutcome::Cancelled { .. }))
    }

    /// Whether every unit completed successfully (spec §6 exit code 0).
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }
}
