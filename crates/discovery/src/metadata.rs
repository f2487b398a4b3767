// SPDX-License-Identifier: Apache-2.0

//! Plate metadata persistence (spec §3, §6 JSON schema): the JSON document
//! describing every subdirectory of a plate, read and written through the
//! VFS so it obeys the same location transparency as image data.

use crate::error::Error;
use openhcs_core::plate::PlateMetadata;
use openhcs_vfs::Backend;

const METADATA_FILENAME: &str = "openhcs_plate_metadata.json";

fn metadata_path(plate_root: &str) -> String {
    format!("{}/{METADATA_FILENAME}", plate_root.trim_end_matches('/'))
}

/// Loads a plate's metadata document, failing if it hasn't been generated
/// yet (spec §7 "metadata file missing").
pub fn load_plate_metadata(backend: &dyn Backend, plate_root: &str) -> Result<PlateMetadata, Error> {
    let path = metadata_path(plate_root);
    if !backend.exists(&path)? {
        return Err(Error::MetadataMissing { path });
    }
    let bytes = backend.load(&path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Persists a plate's metadata document.
pub fn save_plate_metadata(backend: &dyn Backend, plate_root: &str, metadata: &PlateMetadata) -> Result<(), Error> {
    let path = metadata_path(plate_root);
    let json = serde_json::to_vec_pretty(metadata)?;
    backend.save(&path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use openhcs_core::plate::SubdirectoryMetadata;
    use openhcs_vfs::memory::MemoryBackend;

    fn sample() -> PlateMetadata {
        let mut meta = PlateMetadata::default();
        meta.subdirectories.insert(
            ".".to_string(),
            SubdirectoryMetadata {
                microscope_handler_name: "imagexpress".into(),
                source_filename_parser_name: "imagexpress".into(),
                grid_dimensions: Some((8, 12)),
                pixel_size: Some(0.65),
                image_files: None,
                workspace_mapping: None,
                channels: None,
                wells: None,
                sites: None,
                z_indexes: None,
                available_backends: IndexMap::new(),
                main: true,
            },
        );
        meta
    }

    #[test]
    fn missing_metadata_fails_loudly() {
        let backend = MemoryBackend::new();
        let err = load_plate_metadata(&backend, "/plate").unwrap_err();
        assert!(matches!(err, Error::MetadataMissing { .. }));
    }

    #[test]
    fn save_then_load_round_trips() {
        let backend = MemoryBackend::new();
        save_plate_metadata(&backend, "/plate", &sample()).unwrap();
        let loaded = load_plate_metadata(&backend, "/plate").unwrap();
        assert!(loaded.has_single_main());
    }
}
