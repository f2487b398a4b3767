// SPDX-License-Identifier: Apache-2.0

//! Chunked-columnar (zarr-like) store config (spec §4.4 phase 3, §4.8
//! "Chunked-store layout"): chunk strategy and compression, resolvable at
//! Global/Pipeline scope (chunking is a per-unit write-side concern, not
//! meaningfully overridden per step).

use crate::error::Error;
use crate::field::Field;
use crate::resolver::{ResolutionContext, ScopeKind};
use byte_unit::{Byte, UnitType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MRO: [ScopeKind; 2] = [ScopeKind::Pipeline, ScopeKind::Global];

/// The default chunk target if nothing resolves a concrete value: 16 MiB,
/// a reasonable single-chunk read/write unit for compressed microscopy
/// tiles without either read-amplifying tiny chunks or oversized ones.
pub const DEFAULT_TARGET_CHUNK_BYTES: u64 = 16 * 1024 * 1024;

/// The two chunk strategies spec §4.8 defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// One chunk spans `(field, channel, z, y, x)` of a unit.
    UnitChunk,
    /// Chunk shape `(1,1,1,y,x)` matches one source file.
    FileChunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    Zstd,
    Lz4,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LazyZarrConfig {
    #[serde(default)]
    pub chunk_strategy: Field<ChunkStrategy>,
    #[serde(default)]
    pub compression: Field<Compression>,
    #[serde(default)]
    pub compression_level: Field<i32>,
    /// Target chunk size in bytes. Kept as a plain integer rather than a
    /// `byte_unit::Byte` so the lazy record stays schema/serde-plain; the
    /// resolved value is still formatted through `byte_unit` wherever it
    /// reaches a human (errors, logs).
    #[serde(default)]
    pub target_chunk_bytes: Field<u64>,
}

#[derive(Debug, Clone)]
pub struct ZarrConfig {
    pub chunk_strategy: ChunkStrategy,
    pub compression: Compression,
    pub compression_level: i32,
    pub target_chunk_bytes: u64,
}

pub fn resolve(ctx: &ResolutionContext<LazyZarrConfig>) -> Result<ZarrConfig, Error> {
    let target_chunk_bytes = ctx.resolve_field("target_chunk_bytes", &MRO, |c| c.target_chunk_bytes)?;
    if target_chunk_bytes == 0 {
        return Err(Error::InvalidConstraint {
            message: "target_chunk_bytes must be greater than zero".to_string(),
        });
    }
    Ok(ZarrConfig {
        chunk_strategy: ctx.resolve_field("chunk_strategy", &MRO, |c| c.chunk_strategy)?,
        compression: ctx.resolve_field("compression", &MRO, |c| c.compression)?,
        compression_level: ctx.resolve_field("compression_level", &MRO, |c| c.compression_level)?,
        target_chunk_bytes,
    })
}

impl ZarrConfig {
    /// Human-readable chunk target, e.g. `"16.00 MiB"`, for logs and error
    /// messages (spec §4.8 chunk declarations are sized in bytes internally
    /// but operators reason about them in binary size units).
    #[must_use]
    pub fn target_chunk_display(&self) -> String {
        Byte::from_u64(self.target_chunk_bytes).get_appropriate_unit(UnitType::Binary).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unit_chunk_strategy() {
        let mut ctx: ResolutionContext<LazyZarrConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyZarrConfig {
                chunk_strategy: Field::Value(ChunkStrategy::UnitChunk),
                compression: Field::Value(Compression::Zstd),
                compression_level: Field::Value(3),
                target_chunk_bytes: Field::Value(DEFAULT_TARGET_CHUNK_BYTES),
            },
        )
        .unwrap();

        let resolved = resolve(&ctx).unwrap();
        assert_eq!(resolved.chunk_strategy, ChunkStrategy::UnitChunk);
        assert_eq!(resolved.compression, Compression::Zstd);
        assert!(resolved.target_chunk_display().contains("MiB"));
    }

    #[test]
    fn rejects_zero_target_chunk_bytes() {
        let mut ctx: ResolutionContext<LazyZarrConfig> = ResolutionContext::new();
        ctx.push(
            ScopeKind::Global,
            LazyZarrConfig {
                chunk_strategy: Field::Value(ChunkStrategy::UnitChunk),
                compression: Field::Value(Compression::None),
                compression_level: Field::Value(0),
                target_chunk_bytes: Field::Value(0),
            },
        )
        .unwrap();

        assert!(matches!(resolve(&ctx), Err(Error::InvalidConstraint { .. })));
    }
}
