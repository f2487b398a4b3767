// SPDX-License-Identifier: Apache-2.0

//! GPU config (spec §4.6): whether a pipeline/step may use a GPU runtime at
//! all, and the preferred runtime when more than one is detected.

use crate::error::Error;
use crate::field::Field;
use crate::resolver::{ResolutionContext, ScopeKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MRO: [ScopeKind; 3] = [ScopeKind::Step, ScopeKind::Pipeline, ScopeKind::Global];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GpuRuntimePreference {
    Cuda,
    Any,
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LazyGpuConfig {
    #[serde(default)]
    pub enabled: Field<bool>,
    #[serde(default)]
    pub runtime_preference: Field<GpuRuntimePreference>,
    #[serde(default)]
    pub required: Field<bool>,
}

#[derive(Debug, Clone)]
pub struct GpuConfig {
    pub enabled: bool,
    pub runtime_preference: GpuRuntimePreference,
    /// If `true`, compilation fails loudly when no GPU is available rather
    /// than silently falling back to CPU (spec §7 "GPU unavailable but
    /// required").
    pub required: bool,
}

pub fn resolve(ctx: &ResolutionContext<LazyGpuConfig>) -> Result<GpuConfig, Error> {
    Ok(GpuConfig {
        enabled: ctx.resolve_field("enabled", &MRO, |c| c.enabled)?,
        runtime_preference: ctx.resolve_field("runtime_preference", &MRO, |c| c.runtime_preference)?,
        required: ctx.resolve_field("required", &MRO, |c| c.required)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_can_opt_out_of_inherited_gpu_requirement() {
        let mut ctx: ResolutionContext<LazyGpuConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyGpuConfig {
                enabled: Field::Value(true),
                runtime_preference: Field::Value(GpuRuntimePreference::Cuda),
                required: Field::Value(true),
            },
        )
        .unwrap();
        ctx.push(
            ScopeKind::Step,
            LazyGpuConfig {
                required: Field::Value(false),
                ..Default::default()
            },
        )
        .unwrap();

        let resolved = resolve(&ctx).unwrap();
        assert!(resolved.enabled);
        assert!(!resolved.required);
        assert_eq!(resolved.runtime_preference, GpuRuntimePreference::Cuda);
    }
}
