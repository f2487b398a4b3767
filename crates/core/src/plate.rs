// SPDX-License-Identifier: Apache-2.0

//! Plate metadata: the JSON document persisted per plate (spec §3, §6).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata for one subdirectory of a plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubdirectoryMetadata {
    /// The name of the microscope handler used to discover this subdirectory.
    pub microscope_handler_name: String,
    /// The name of the filename parser used to parse image filenames here.
    pub source_filename_parser_name: String,
    /// Grid dimensions `(rows, cols)` of the acquisition, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_dimensions: Option<(u32, u32)>,
    /// Pixel size in microns, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<f64>,
    /// The plate-relative image files discovered here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_files: Option<Vec<String>>,
    /// Virtual-path to real-path mapping, plate-relative, for layouts that
    /// are not naturally flat (spec §4.3 `build_virtual_mapping`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_mapping: Option<IndexMap<String, String>>,
    /// Channel key → display name (or `None` if unnamed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<IndexMap<String, Option<String>>>,
    /// Well key → display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wells: Option<IndexMap<String, Option<String>>>,
    /// Site key → display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites: Option<IndexMap<String, Option<String>>>,
    /// Z-index key → display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_indexes: Option<IndexMap<String, Option<String>>>,
    /// Which backends are available for this subdirectory.
    #[serde(default)]
    pub available_backends: IndexMap<String, bool>,
    /// Whether this is the plate's single `main` subdirectory.
    #[serde(default)]
    pub main: bool,
}

/// A plate's persisted metadata document: one entry per subdirectory.
///
/// Invariant: exactly one subdirectory has `main == true`. This is validated
/// by the discovery crate when loading or building this document, not by the
/// `serde` representation itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlateMetadata {
    /// Subdirectory name (or `"."` for the plate root) → its metadata.
    pub subdirectories: IndexMap<String, SubdirectoryMetadata>,
}

impl PlateMetadata {
    /// Returns the subdirectory marked `main`, if any.
    #[must_use]
    pub fn main_subdirectory(&self) -> Option<(&str, &SubdirectoryMetadata)> {
        self.subdirectories
            .iter()
            .find(|(_, meta)| meta.main)
            .map(|(name, meta)| (name.as_str(), meta))
    }

    /// Returns `true` if exactly one subdirectory is marked `main`.
    #[must_use]
    pub fn has_single_main(&self) -> bool {
        self.subdirectories.values().filter(|m| m.main).count() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
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
        assert!(meta.has_single_main());
        let json = serde_json::to_string(&meta).expect("serialize");
        let back: PlateMetadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.main_subdirectory().unwrap().0, ".");
    }

    #[test]
    fn no_main_subdirectory_detected() {
        let meta = PlateMetadata::default();
        assert!(!meta.has_single_main());
        assert!(meta.main_subdirectory().is_none());
    }
}
