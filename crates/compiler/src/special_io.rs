// SPDX-License-Identifier: Apache-2.0

//! Phase 6, special-I/O resolution (spec §4.4, §4.7): namespace every
//! function's declared special outputs, link every step's declared special
//! inputs to an earlier step's output, and reject missing dependencies,
//! duplicate producers, and backward references. Unit-independent: the
//! declared special I/O names don't vary per parallelization unit, only
//! the concrete paths they're written to do (computed per-unit later).

use crate::error::Error;
use indexmap::IndexMap;
use openhcs_core::step::{FunctionChain, FunctionPattern, PipelineDefinition};

/// One step's namespaced special outputs (final name -> materializer id)
/// plus the bare special-input names it declares.
#[derive(Debug, Clone, Default)]
pub struct StepSpecialIo {
    pub outputs: IndexMap<String, Option<String>>,
    pub inputs: Vec<String>,
}

/// The pipeline-wide resolution: per step, its namespaced outputs and
/// inputs, plus the producer step index for every input name.
#[derive(Debug, Clone, Default)]
pub struct SpecialIoPlan {
    pub steps: Vec<StepSpecialIo>,
    /// `links[k][input_name] = producer_step_index`.
    pub links: Vec<IndexMap<String, usize>>,
}

fn namespaced_outputs(pattern: &FunctionPattern) -> IndexMap<String, Option<String>> {
    let mut outputs = IndexMap::new();
    match pattern {
        FunctionPattern::Chain(chain) => {
            for f in chain.functions() {
                for (name, materializer) in &f.special_outputs {
                    outputs.insert(name.clone(), materializer.clone());
                }
            }
        }
        FunctionPattern::Map { arms, .. } => {
            let promote = arms.len() == 1;
            for (component_value, chain) in arms {
                for (chain_index, f) in chain.functions().iter().enumerate() {
                    for (name, materializer) in &f.special_outputs {
                        let final_name = if promote {
                            name.clone()
                        } else {
                            format!("{component_value}_{chain_index}_{name}")
                        };
                        outputs.insert(final_name, materializer.clone());
                    }
                }
            }
        }
    }
    outputs
}

fn declared_inputs(pattern: &FunctionPattern) -> Vec<String> {
    let chains: Vec<&FunctionChain> = match pattern {
        FunctionPattern::Chain(chain) => vec![chain],
        FunctionPattern::Map { arms, .. } => arms.values().collect(),
    };
    let mut names = Vec::new();
    for chain in chains {
        for f in chain.functions() {
            for name in &f.special_inputs {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }
    names
}

/// Resolves special-I/O linkage for an entire pipeline.
pub fn resolve(pipeline: &PipelineDefinition) -> Result<SpecialIoPlan, Error> {
    let mut steps = Vec::with_capacity(pipeline.steps.len());
    let mut all_links = Vec::with_capacity(pipeline.steps.len());
    // final_output_name -> producer step index, built incrementally so a
    // step can only depend on a *prior* step's output (enforces the
    // "reject backward references" rule structurally: step k only ever
    // sees producers from steps 0..k).
    let mut producers: IndexMap<String, usize> = IndexMap::new();

    for (step_index, step) in pipeline.steps.iter().enumerate() {
        let outputs = namespaced_outputs(&step.function_pattern);
        let inputs = declared_inputs(&step.function_pattern);

        let mut links = IndexMap::new();
        for input_name in &inputs {
            let producer_index = producers.get(input_name).copied().ok_or_else(|| Error::UnresolvedSpecialInput {
                step_index,
                name: step.name.clone(),
                input_name: input_name.clone(),
            })?;
            links.insert(input_name.clone(), producer_index);
        }

        for output_name in outputs.keys() {
            if let Some(&existing) = producers.get(output_name) {
                return Err(Error::DuplicateSpecialOutput {
                    step_index,
                    name: step.name.clone(),
                    output_name: format!("{output_name} (already produced by step {existing})"),
                });
            }
            producers.insert(output_name.clone(), step_index);
        }

        steps.push(StepSpecialIo { outputs, inputs });
        all_links.push(links);
    }

    Ok(SpecialIoPlan { steps, links: all_links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap as Map;
    use openhcs_core::memory::MemoryType;
    use openhcs_core::step::{FunctionRef, StepDefinition};

    fn step(name: &str, pattern: FunctionPattern) -> StepDefinition {
        StepDefinition {
            name: name.to_string(),
            function_pattern: pattern,
            variable_components: vec![],
            group_by: None,
        }
    }

    #[test]
    fn links_consumer_to_earlier_producer() {
        let mut producer = FunctionRef::new("locate", MemoryType::Cpu, MemoryType::Cpu);
        producer.special_outputs.push(("positions".into(), None));
        let mut consumer = FunctionRef::new("overlay", MemoryType::Cpu, MemoryType::Cpu);
        consumer.special_inputs.push("positions".into());

        let pipeline = PipelineDefinition {
            steps: vec![
                step("locate", FunctionPattern::Chain(FunctionChain::Single(producer))),
                step("overlay", FunctionPattern::Chain(FunctionChain::Single(consumer))),
            ],
        };

        let plan = resolve(&pipeline).unwrap();
        assert_eq!(plan.links[1]["positions"], 0);
    }

    #[test]
    fn unresolved_input_fails_loudly() {
        let mut consumer = FunctionRef::new("overlay", MemoryType::Cpu, MemoryType::Cpu);
        consumer.special_inputs.push("positions".into());
        let pipeline = PipelineDefinition {
            steps: vec![step("overlay", FunctionPattern::Chain(FunctionChain::Single(consumer)))],
        };
        assert!(matches!(resolve(&pipeline).unwrap_err(), Error::UnresolvedSpecialInput { .. }));
    }

    #[test]
    fn single_key_map_promotes_output_to_global_scope() {
        let mut f = FunctionRef::new("dapi", MemoryType::Cpu, MemoryType::Cpu);
        f.special_outputs.push(("count".into(), None));
        let mut arms = Map::new();
        arms.insert("1".to_string(), FunctionChain::Single(f));
        let pipeline = PipelineDefinition {
            steps: vec![step("per-channel", FunctionPattern::Map { group_by: "channel".into(), arms })],
        };
        let plan = resolve(&pipeline).unwrap();
        assert!(plan.steps[0].outputs.contains_key("count"));
    }

    #[test]
    fn multi_key_map_namespaces_outputs_by_arm_and_chain_index() {
        let mut dapi = FunctionRef::new("dapi", MemoryType::Cpu, MemoryType::Cpu);
        dapi.special_outputs.push(("count".into(), None));
        let mut gfp = FunctionRef::new("gfp", MemoryType::Cpu, MemoryType::Cpu);
        gfp.special_outputs.push(("count".into(), None));
        let mut arms = Map::new();
        arms.insert("1".to_string(), FunctionChain::Single(dapi));
        arms.insert("2".to_string(), FunctionChain::Single(gfp));
        let pipeline = PipelineDefinition {
            steps: vec![step("per-channel", FunctionPattern::Map { group_by: "channel".into(), arms })],
        };
        let plan = resolve(&pipeline).unwrap();
        assert!(plan.steps[0].outputs.contains_key("1_0_count"));
        assert!(plan.steps[0].outputs.contains_key("2_0_count"));
    }

    #[test]
    fn duplicate_promoted_output_across_steps_is_rejected() {
        let mut a = FunctionRef::new("a", MemoryType::Cpu, MemoryType::Cpu);
        a.special_outputs.push(("summary".into(), None));
        let mut arms_a = Map::new();
        arms_a.insert("1".to_string(), FunctionChain::Single(a));

        let mut b = FunctionRef::new("b", MemoryType::Cpu, MemoryType::Cpu);
        b.special_outputs.push(("summary".into(), None));
        let mut arms_b = Map::new();
        arms_b.insert("1".to_string(), FunctionChain::Single(b));

        let pipeline = PipelineDefinition {
            steps: vec![
                step("first", FunctionPattern::Map { group_by: "channel".into(), arms: arms_a }),
                step("second", FunctionPattern::Map { group_by: "channel".into(), arms: arms_b }),
            ],
        };
        assert!(matches!(resolve(&pipeline).unwrap_err(), Error::DuplicateSpecialOutput { .. }));
    }
}
