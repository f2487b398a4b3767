// SPDX-License-Identifier: Apache-2.0

//! ImageXpress handler (spec §4.3): the `{well}_s{site}_w{channel}.tif`
//! filename convention most ImageXpress/MetaXpress acquisitions use.
//! Acquisitions that write into nested `TimePoint_N/ZStep_N/...`
//! subfolders still use this same filename convention underneath;
//! [`ImageXpressHandler::build_virtual_mapping`] flattens those into the
//! plate root without copying or symlinking anything. Already-flat plates
//! return an empty map.

use crate::error::Error;
use crate::handler::{MicroscopeHandler, VendorMetadata};
use crate::parser::{FilenameParser, RegexFilenameParser};
use crate::register_handler;
use indexmap::IndexMap;
use openhcs_core::backend::BackendId;
use openhcs_vfs::Backend;
use std::sync::Arc;

pub struct ImageXpressHandler {
    parser: Arc<dyn FilenameParser>,
}

impl ImageXpressHandler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: Arc::new(RegexFilenameParser::new(
                "imagexpress",
                r"^(?P<well>[A-Z]\d{2})_s(?P<site>\d+)_w(?P<channel>\d+)\.tif$",
                "{well}_s{site}_w{channel}.tif",
                vec!["site".into(), "channel".into()],
            )),
        }
    }
}

impl Default for ImageXpressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MicroscopeHandler for ImageXpressHandler {
    fn name(&self) -> &'static str {
        "imagexpress"
    }

    fn filename_parser(&self) -> Arc<dyn FilenameParser> {
        Arc::clone(&self.parser)
    }

    fn root_dir(&self, plate_root: &str) -> String {
        plate_root.trim_end_matches('/').to_string()
    }

    fn compatible_backends(&self) -> Vec<BackendId> {
        vec![BackendId::Disk, BackendId::Memory]
    }

    fn read_vendor_metadata(&self, backend: &dyn Backend, plate_root: &str) -> Result<VendorMetadata, Error> {
        let htd_path = format!("{}/experiment.htd", plate_root.trim_end_matches('/'));
        if !backend.exists(&htd_path)? {
            return Ok(VendorMetadata::default());
        }
        let bytes = backend.load(&htd_path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(parse_htd(&text))
    }

    fn build_virtual_mapping(
        &self,
        backend: &dyn Backend,
        plate_root: &str,
    ) -> Result<IndexMap<String, String>, Error> {
        let root = plate_root.trim_end_matches('/').to_string();
        let parser = self.filename_parser();
        let mut mapping = IndexMap::new();
        for entry in backend.list(&root, true, None)? {
            let relative = entry.path.strip_prefix(&root).unwrap_or(&entry.path).trim_start_matches('/');
            if !relative.contains('/') {
                // Already directly under the plate root; nothing to flatten.
                continue;
            }
            let filename = relative.rsplit('/').next().unwrap_or(relative);
            if parser.parse(filename).is_none() {
                continue;
            }
            let virtual_path = format!("{root}/{filename}");
            // First nested file claims the flattened name; a later
            // collision stays addressable only at its real nested path
            // rather than silently shadowing a different real file.
            let _ = mapping.entry(virtual_path).or_insert_with(|| entry.path.clone());
        }
        Ok(mapping)
    }
}

/// A minimal HTD-format reader: `key, value` pairs, one per line,
/// extracting the handful of fields this handler exposes as
/// [`VendorMetadata`]. Real HTD files carry far more than this; unknown
/// keys are ignored rather than rejected.
fn parse_htd(text: &str) -> VendorMetadata {
    let mut meta = VendorMetadata::default();
    let mut rows = None;
    let mut cols = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once(',') else { continue };
        let key = key.trim().trim_matches('"');
        let value = value.trim().trim_matches('"');
        match key {
            "GridRows" => rows = value.parse::<u32>().ok(),
            "GridCols" => cols = value.parse::<u32>().ok(),
            "PixelSize" => meta.pixel_size = value.parse::<f64>().ok(),
            _ => {}
        }
    }
    if let (Some(r), Some(c)) = (rows, cols) {
        meta.grid_dimensions = Some((r, c));
    }
    meta
}

register_handler!(IMAGEXPRESS_HANDLER_FACTORY, "imagexpress", || {
    let handler: Arc<dyn MicroscopeHandler> = Arc::new(ImageXpressHandler::new());
    handler
});
