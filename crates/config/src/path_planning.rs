// SPDX-License-Identifier: Apache-2.0

//! Path-planning config: per-step output directory naming conventions,
//! resolvable at Global/Pipeline/Step scope.

use crate::error::Error;
use crate::field::Field;
use crate::resolver::{ResolutionContext, ScopeKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The MRO for path-planning fields: a step's own setting wins, then its
/// pipeline's, then the global default.
pub const MRO: [ScopeKind; 3] = [ScopeKind::Step, ScopeKind::Pipeline, ScopeKind::Global];

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LazyPathPlanningConfig {
    #[serde(default)]
    pub output_dir_suffix: Field<String>,
    #[serde(default)]
    pub intermediate_dir_prefix: Field<String>,
    #[serde(default)]
    pub sub_dir: Field<String>,
}

#[derive(Debug, Clone)]
pub struct PathPlanningConfig {
    pub output_dir_suffix: String,
    pub intermediate_dir_prefix: String,
    pub sub_dir: String,
}

/// Resolves a fully concrete [`PathPlanningConfig`] from whatever scopes are
/// currently pushed on `ctx`.
pub fn resolve(ctx: &ResolutionContext<LazyPathPlanningConfig>) -> Result<PathPlanningConfig, Error> {
    Ok(PathPlanningConfig {
        output_dir_suffix: ctx.resolve_field("output_dir_suffix", &MRO, |c| c.output_dir_suffix.clone())?,
        intermediate_dir_prefix: ctx
            .resolve_field("intermediate_dir_prefix", &MRO, |c| c.intermediate_dir_prefix.clone())?,
        sub_dir: ctx.resolve_field("sub_dir", &MRO, |c| c.sub_dir.clone())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_from_global_when_step_inherits() {
        let mut ctx: ResolutionContext<LazyPathPlanningConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyPathPlanningConfig {
                output_dir_suffix: Field::Value("_out".into()),
                intermediate_dir_prefix: Field::Value("step_".into()),
                sub_dir: Field::Value("images".into()),
            },
        )
        .unwrap();
        ctx.push(ScopeKind::Step, LazyPathPlanningConfig::default()).unwrap();

        let resolved = resolve(&ctx).unwrap();
        assert_eq!(resolved.output_dir_suffix, "_out");
        assert_eq!(resolved.sub_dir, "images");
    }

    #[test]
    fn step_override_wins() {
        let mut ctx: ResolutionContext<LazyPathPlanningConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyPathPlanningConfig {
                output_dir_suffix: Field::Value("_out".into()),
                intermediate_dir_prefix: Field::Value("step_".into()),
                sub_dir: Field::Value("images".into()),
            },
        )
        .unwrap();
        ctx.push(
            ScopeKind::Step,
            LazyPathPlanningConfig {
                output_dir_suffix: Field::Value("_custom".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let resolved = resolve(&ctx).unwrap();
        assert_eq!(resolved.output_dir_suffix, "_custom");
        assert_eq!(resolved.intermediate_dir_prefix, "step_");
    }
}
