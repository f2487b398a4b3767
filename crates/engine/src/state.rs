// SPDX-License-Identifier: Apache-2.0

//! Per-step state machine (spec §4.5 "State machine per step"):
//! `Planned -> Loading -> Executing -> Writing -> Done`, with `Failed`
//! reachable from any non-terminal state.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    Planned,
    Loading,
    Executing,
    Writing,
    Done,
    Failed { reason: String },
}

impl StepState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepState::Done | StepState::Failed { .. })
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Planned => write!(f, "planned"),
            StepState::Loading => write!(f, "loading"),
            StepState::Executing => write!(f, "executing"),
            StepState::Writing => write!(f, "writing"),
            StepState::Done => write!(f, "done"),
            StepState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// The result of running one unit's entire plan (spec §5 "Failure isolation":
/// a unit's failure marks its plan `Failed` and never aborts peers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Done,
    Failed { step_index: usize, step_name: String, reason: String },
    Cancelled { step_index: usize, step_name: String },
}

impl UnitOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_done_and_failed_are_terminal() {
        assert!(!StepState::Planned.is_terminal());
        assert!(!StepState::Loading.is_terminal());
        assert!(!StepState::Executing.is_terminal());
        assert!(!StepState::Writing.is_terminal());
        assert!(StepState::Done.is_terminal());
        assert!(StepState::Failed { reason: "x".into() }.is_terminal());
    }

    #[test]
    fn unit_outcome_success_classification() {
        assert!(UnitOutcome::Done.is_success());
        assert!(!UnitOutcome::Failed { step_index: 0, step_name: "a".into(), reason: "x".into() }.is_success());
        assert!(!UnitOutcome::Cancelled { step_index: 0, step_name: "a".into() }.is_success());
    }
}
