// SPDX-License-Identifier: Apache-2.0

//! Phase 4, memory-type propagation (spec §4.4): extract each step's
//! `(input_memory_type, output_memory_type)` from its function pattern and
//! validate chain continuity across the whole pipeline. Unit-independent:
//! a function's declared memory types don't vary per parallelization unit.

use crate::error::Error;
use openhcs_core::memory::MemoryType;
use openhcs_core::step::{FunctionChain, FunctionPattern, PipelineDefinition};

/// Whether a conversion between two memory types is possible. All three
/// runtimes this workspace ships convert freely (CPU round-trip is always
/// available as a fallback, spec §4.5.1); this table is still explicit so a
/// future runtime that isn't universally convertible has somewhere to
/// register its restriction.
#[must_use]
pub fn can_convert(_from: MemoryType, _to: MemoryType) -> bool {
    true
}

fn chain_memory_type(chain: &FunctionChain, step_index: usize, name: &str) -> Result<(MemoryType, MemoryType), Error> {
    let functions = chain.functions();
    let first = functions
        .first()
        .ok_or_else(|| Error::EmptyFunctionChain { step_index, name: name.to_string() })?;
    let last = functions
        .last()
        .ok_or_else(|| Error::EmptyFunctionChain { step_index, name: name.to_string() })?;
    for pair in functions.windows(2) {
        let (out, next_in) = (pair[0].memory_type.1, pair[1].memory_type.0);
        if out != next_in && !can_convert(out, next_in) {
            return Err(Error::MemoryTypeChainBreak {
                step_index,
                name: name.to_string(),
                from: out,
                to: next_in,
            });
        }
    }
    Ok((first.memory_type.0, last.memory_type.1))
}

/// Extracts `(input, output)` memory types for every step, in pipeline
/// order, validating both within-chain continuity and map-arm agreement.
pub fn compute(pipeline: &PipelineDefinition) -> Result<Vec<(MemoryType, MemoryType)>, Error> {
    let mut types = Vec::with_capacity(pipeline.steps.len());
    for (step_index, step) in pipeline.steps.iter().enumerate() {
        let pair = match &step.function_pattern {
            FunctionPattern::Chain(chain) => chain_memory_type(chain, step_index, &step.name)?,
            FunctionPattern::Map { arms, .. } => {
                let mut arm_types = arms
                    .values()
                    .map(|chain| chain_memory_type(chain, step_index, &step.name));
                let first = arm_types
                    .next()
                    .ok_or_else(|| Error::EmptyFunctionChain { step_index, name: step.name.clone() })??;
                for other in arm_types {
                    if other? != first {
                        return Err(Error::MapArmsDisagreeOnMemoryType {
                            step_index,
                            name: step.name.clone(),
                        });
                    }
                }
                first
            }
        };
        types.push(pair);
    }

    for (i, pair) in types.windows(2).enumerate() {
        let (out, next_in) = (pair[0].1, pair[1].0);
        if out != next_in && !can_convert(out, next_in) {
            return Err(Error::MemoryTypeChainBreak {
                step_index: i + 1,
                name: pipeline.steps[i + 1].name.clone(),
                from: out,
                to: next_in,
            });
        }
    }

    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use openhcs_core::step::{FunctionRef, StepDefinition};

    fn step(name: &str, pattern: FunctionPattern) -> StepDefinition {
        StepDefinition {
            name: name.to_string(),
            function_pattern: pattern,
            variable_components: vec!["site".into()],
            group_by: None,
        }
    }

    #[test]
    fn single_step_uses_its_own_function_types() {
        let pipeline = PipelineDefinition {
            steps: vec![step(
                "blur",
                FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
                    "blur",
                    MemoryType::Cpu,
                    MemoryType::Cpu,
                ))),
            )],
        };
        let types = compute(&pipeline).unwrap();
        assert_eq!(types, vec![(MemoryType::Cpu, MemoryType::Cpu)]);
    }

    #[test]
    fn map_arms_must_agree() {
        let mut arms = IndexMap::new();
        arms.insert(
            "1".to_string(),
            FunctionChain::Single(FunctionRef::new("dapi", MemoryType::Cpu, MemoryType::Cpu)),
        );
        arms.insert(
            "2".to_string(),
            FunctionChain::Single(FunctionRef::new("gfp", MemoryType::Cpu, MemoryType::Cuda)),
        );
        let pipeline = PipelineDefinition {
            steps: vec![step(
                "per-channel",
                FunctionPattern::Map { group_by: "channel".into(), arms },
            )],
        };
        assert!(matches!(
            compute(&pipeline).unwrap_err(),
            Error::MapArmsDisagreeOnMemoryType { .. }
        ));
    }

    #[test]
    fn chain_continuity_holds_across_steps() {
        let pipeline = PipelineDefinition {
            steps: vec![
                step(
                    "normalize",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
                        "normalize",
                        MemoryType::Cpu,
                        MemoryType::Cpu,
                    ))),
                ),
                step(
                    "threshold",
                    FunctionPattern::Chain(FunctionChain::Single(FunctionRef::new(
                        "threshold",
                        MemoryType::Cpu,
                        MemoryType::Cuda,
                    ))),
                ),
            ],
        };
        let types = compute(&pipeline).unwrap();
        assert_eq!(types, vec![(MemoryType::Cpu, MemoryType::Cpu), (MemoryType::Cpu, MemoryType::Cuda)]);
    }
}
