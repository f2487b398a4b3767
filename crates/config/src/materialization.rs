// SPDX-License-Identifier: Apache-2.0

//! Per-step materialization config: whether a step's intermediate results
//! are additionally persisted to a durable backend (spec §4.4 phase 2(d)).

use crate::error::Error;
use crate::field::Field;
use crate::resolver::{ResolutionContext, ScopeKind};
use openhcs_core::backend::BackendId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MRO: [ScopeKind; 3] = [ScopeKind::Step, ScopeKind::Pipeline, ScopeKind::Global];

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LazyMaterializationConfig {
    #[serde(default)]
    pub materialize: Field<bool>,
    #[serde(default)]
    pub backend: Field<BackendId>,
    #[serde(default)]
    pub sub_dir: Field<String>,
}

#[derive(Debug, Clone)]
pub struct MaterializationConfig {
    pub materialize: bool,
    pub backend: BackendId,
    pub sub_dir: String,
}

pub fn resolve(
    ctx: &ResolutionContext<LazyMaterializationConfig>,
) -> Result<MaterializationConfig, Error> {
    Ok(MaterializationConfig {
        materialize: ctx.resolve_field("materialize", &MRO, |c| c.materialize)?,
        backend: ctx.resolve_field("backend", &MRO, |c| c.backend.clone())?,
        sub_dir: ctx.resolve_field("sub_dir", &MRO, |c| c.sub_dir.clone())?,
    })
}
