// SPDX-License-Identifier: Apache-2.0

//! VFS defaults config: which backend families a step prefers, resolvable
//! the same way as path-planning.

use crate::error::Error;
use crate::field::Field;
use crate::resolver::{ResolutionContext, ScopeKind};
use openhcs_core::backend::BackendId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MRO: [ScopeKind; 3] = [ScopeKind::Step, ScopeKind::Pipeline, ScopeKind::Global];

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LazyVfsConfig {
    #[serde(default)]
    pub intermediate_backend: Field<BackendId>,
    #[serde(default)]
    pub materialization_backend: Field<BackendId>,
    #[serde(default)]
    pub disable_gpu_backends: Field<bool>,
}

#[derive(Debug, Clone)]
pub struct VfsConfig {
    pub intermediate_backend: BackendId,
    pub materialization_backend: BackendId,
    pub disable_gpu_backends: bool,
}

pub fn resolve(ctx: &ResolutionContext<LazyVfsConfig>) -> Result<VfsConfig, Error> {
    Ok(VfsConfig {
        intermediate_backend: ctx
            .resolve_field("intermediate_backend", &MRO, |c| c.intermediate_backend.clone())?,
        materialization_backend: ctx
            .resolve_field("materialization_backend", &MRO, |c| c.materialization_backend.clone())?,
        disable_gpu_backends: ctx
            .resolve_field("disable_gpu_backends", &MRO, |c| c.disable_gpu_backends)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_intermediate_backend_from_global() {
        let mut ctx: ResolutionContext<LazyVfsConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyVfsConfig {
                intermediate_backend: Field::Value(BackendId::Memory),
                materialization_backend: Field::Value(BackendId::Disk),
                disable_gpu_backends: Field::Value(false),
            },
        )
        .unwrap();
        ctx.push(ScopeKind::Pipeline, LazyVfsConfig::default()).unwrap();

        let resolved = resolve(&ctx).unwrap();
        assert_eq!(resolved.intermediate_backend, BackendId::Memory);
        assert_eq!(resolved.materialization_backend, BackendId::Disk);
        assert!(!resolved.disable_gpu_backends);
    }
}
