// SPDX-License-Identifier: Apache-2.0

//! Writing a stacked array out through the chunked columnar backend (spec
//! §4.8 "Chunked-store layout"): declares the array's metadata once per
//! output directory, then writes one chunk per the declared strategy.

use crate::error::Error;
use openhcs_compiler::ChunkDeclaration;
use openhcs_config::zarr::ChunkStrategy;
use openhcs_core::memory::Shape3D;
use openhcs_vfs::zarr::{ArrayMetadata, ZarrBackend};
use openhcs_vfs::Backend;

/// Declares array metadata and writes every z-plane of `planes` to
/// `output_dir` through `backend`, which must be a [`ZarrBackend`] (the
/// caller is expected to have already routed this step's write to the
/// chunked columnar backend).
pub fn write_chunked(
    backend: &dyn Backend,
    output_dir: &str,
    planes: &[Vec<u8>],
    shape: Shape3D,
    declaration: &ChunkDeclaration,
) -> Result<(), Error> {
    let zarr = backend
        .as_any()
        .downcast_ref::<ZarrBackend>()
        .ok_or_else(|| Error::ChunkedBackendMismatch { output_dir: output_dir.to_string() })?;

    let chunk_shape = match declaration.chunk_strategy {
        ChunkStrategy::UnitChunk => [shape.z, shape.y, shape.x],
        ChunkStrategy::FileChunk => [1, shape.y, shape.x],
    };
    let meta = ArrayMetadata {
        shape: [shape.z, shape.y, shape.x],
        dtype: "u8".to_string(),
        chunk_shape,
        chunk_strategy: declaration.chunk_strategy,
        compression: declaration.compression,
        compression_level: declaration.compression_level,
    };
    zarr.declare_array(output_dir, &meta)?;

    match declaration.chunk_strategy {
        ChunkStrategy::UnitChunk => {
            let mut flat = Vec::with_capacity(planes.iter().map(Vec::len).sum());
            for plane in planes {
                flat.extend_from_slice(plane);
            }
            zarr.write_chunk(output_dir, (0, 0, 0), &flat)?;
        }
        ChunkStrategy::FileChunk => {
            for (z, plane) in planes.iter().enumerate() {
                zarr.write_chunk(output_dir, (z, 0, 0), plane)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhcs_config::zarr::Compression;
    use tempfile::tempdir;

    fn declaration(strategy: ChunkStrategy) -> ChunkDeclaration {
        ChunkDeclaration {
            chunk_strategy: strategy,
            compression: Compression::None,
            compression_level: 0,
            target_chunk_bytes: openhcs_config::zarr::DEFAULT_TARGET_CHUNK_BYTES,
        }
    }

    #[test]
    fn unit_chunk_strategy_writes_a_single_chunk() {
        let dir = tempdir().unwrap();
        let backend = ZarrBackend::new(dir.path());
        let planes = vec![vec![1u8, 2, 3, 4], vec![5u8, 6, 7, 8]];
        write_chunked(&backend, "/plate/A01", &planes, Shape3D::new(2, 2, 2), &declaration(ChunkStrategy::UnitChunk))
            .unwrap();
        let chunk = backend.read_chunk("/plate/A01", (0, 0, 0)).unwrap();
        assert_eq!(chunk, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn file_chunk_strategy_writes_one_chunk_per_plane() {
        let dir = tempdir().unwrap();
        let backend = ZarrBackend::new(dir.path());
        let planes = vec![vec![1u8, 2, 3, 4], vec![5u8, 6, 7, 8]];
        write_chunked(&backend, "/plate/A01", &planes, Shape3D::new(2, 2, 2), &declaration(ChunkStrategy::FileChunk))
            .unwrap();
        assert_eq!(backend.read_chunk("/plate/A01", (0, 0, 0)).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(backend.read_chunk("/plate/A01", (1, 0, 0)).unwrap(), vec![5, 6, 7, 8]);
    }
}
