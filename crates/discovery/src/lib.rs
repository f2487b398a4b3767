// SPDX-License-Identifier: Apache-2.0

//! Pattern discovery and filename parsing (spec §4.3): turn a plate's raw
//! file inventory into per-unit groups of patterns the compiler can turn
//! into execution plans.

pub mod discovery;
pub mod error;
pub mod handler;
pub mod imagexpress;
pub mod metadata;
pub mod parser;

pub use discovery::{discover_patterns, validate_group_keys, DiscoveryRequest, UnitPatterns};
pub use error::Error;
pub use handler::{get_handler, MicroscopeHandler, VendorMetadata};
pub use metadata::{load_plate_metadata, save_plate_metadata};
pub use parser::{FilenameParser, RegexFilenameParser};
