// SPDX-License-Identifier: Apache-2.0

//! Pattern discovery (spec §4.3): map a plate's file inventory into
//! per-unit groups of patterns ready for compilation.

use crate::error::Error;
use crate::handler::MicroscopeHandler;
use indexmap::IndexMap;
use openhcs_core::component::{Component, ComponentMap, ComponentValue, Pattern};
use openhcs_vfs::Backend;

/// A unit's discovered patterns: either one flat list, or subgrouped by a
/// `group_by` component's concrete value (spec §4.3 step 5).
#[derive(Debug, Clone)]
pub enum UnitPatterns {
    Flat(Vec<Pattern>),
    GroupedBy {
        component: Component,
        groups: IndexMap<String, Vec<Pattern>>,
    },
}

/// Runs the five-step discovery algorithm for one microscope handler over
/// one plate, returning patterns keyed by parallelization-unit value (e.g.
/// well id).
pub struct DiscoveryRequest<'a> {
    pub handler: &'a dyn MicroscopeHandler,
    pub backend: &'a dyn Backend,
    pub plate_root: &'a str,
    pub extensions: &'a [&'a str],
    pub parallelization_axis: &'a Component,
    pub variable_components: &'a [Component],
    pub group_by: Option<&'a Component>,
    pub unit_filter: Option<&'a [String]>,
}

pub fn discover_patterns(req: &DiscoveryRequest<'_>) -> Result<IndexMap<String, UnitPatterns>, Error> {
    // Step 1 (virtual mapping construction is handled by the caller ahead
    // of this call and folded into `backend`, e.g. via a workspace-mapping
    // backend already populated for this plate).
    let root_dir = req.handler.root_dir(req.plate_root);

    // Step 2: list images, parse each, drop what doesn't parse.
    let entries = req.backend.list(&root_dir, true, Some(req.extensions))?;
    if entries.is_empty() {
        return Err(Error::NoImagesFound {
            root: root_dir,
            extensions: req.extensions.iter().map(|e| e.to_string()).collect(),
        });
    }

    let parser = req.handler.filename_parser();
    let mut parsed: Vec<(String, ComponentMap)> = Vec::new();
    for entry in &entries {
        let filename = entry.path.rsplit('/').next().unwrap_or(&entry.path);
        match parser.parse(filename) {
            Some(map) => parsed.push((entry.path.clone(), req.handler.remap_components(map))),
            None => tracing::debug!(filename, parser = parser.name(), "filename did not parse, dropping"),
        }
    }

    // Step 3: filter by the user's unit filter.
    let filtered: Vec<(String, ComponentMap)> = parsed
        .into_iter()
        .filter(|(_, map)| match req.unit_filter {
            None => true,
            Some(units) => match map.get(req.parallelization_axis) {
                Some(value) => units.iter().any(|u| u == &value.to_string()),
                None => false,
            },
        })
        .collect();

    // Group by unit (parallelization axis value).
    let mut by_unit: IndexMap<String, Vec<(String, ComponentMap)>> = IndexMap::new();
    for (path, map) in filtered {
        let Some(unit_value) = map.get(req.parallelization_axis) else { continue };
        by_unit.entry(unit_value.to_string()).or_default().push((path, map));
    }

    let mut result = IndexMap::new();
    for (unit, files) in by_unit {
        // Step 4: template each filename with variable components
        // replaced by `{iii}`, aggregating matching files per template.
        let mut by_template: IndexMap<String, Vec<String>> = IndexMap::new();
        for (path, map) in &files {
            let template = parser.template(map, req.variable_components);
            by_template.entry(template).or_default().push(path.clone());
        }
        let patterns: Vec<Pattern> = by_template
            .into_iter()
            .map(|(template, mut matched_files)| {
                matched_files.sort();
                let mut pattern = Pattern::new(template);
                pattern.files = matched_files;
                pattern
            })
            .collect();

        // Step 5: subgroup by group_by's concrete value if declared.
        let unit_patterns = match req.group_by {
            None => UnitPatterns::Flat(patterns),
            Some(group_by) => group_patterns_by(group_by, &files, patterns)?,
        };
        let _ = result.insert(unit, unit_patterns);
    }

    Ok(result)
}

fn group_patterns_by(
    group_by: &Component,
    files: &[(String, ComponentMap)],
    patterns: Vec<Pattern>,
) -> Result<UnitPatterns, Error> {
    // Map each file path to its group_by value so patterns can be bucketed.
    let mut path_to_group: IndexMap<&str, String> = IndexMap::new();
    for (path, map) in files {
        let value = map
            .get(group_by)
            .map(ComponentValue::to_string)
            .unwrap_or_default();
        let _ = path_to_group.insert(path.as_str(), value);
    }

    let mut groups: IndexMap<String, Vec<Pattern>> = IndexMap::new();
    for pattern in patterns {
        // A pattern's group is determined by its first matched file; every
        // file in one pattern shares every fixed component by construction
        // (templating only varies on variable_components, never group_by).
        let Some(first_file) = pattern.files.first() else { continue };
        let group = path_to_group.get(first_file.as_str()).cloned().unwrap_or_default();
        groups.entry(group).or_default().push(pattern);
    }

    Ok(UnitPatterns::GroupedBy { component: group_by.clone(), groups })
}

/// Validates that a unit's discovered `group_by` keys exactly match the
/// keys a map function pattern declares arms for (spec §4.3 step 5: "fail
/// loudly on mismatch, especially for map function patterns"). Called by
/// the compiler once it knows the step's function pattern's declared arms.
pub fn validate_group_keys(
    unit: &str,
    component: &Component,
    expected: &[String],
    actual_groups: &IndexMap<String, Vec<Pattern>>,
) -> Result<(), Error> {
    let mut found: Vec<String> = actual_groups.keys().cloned().collect();
    found.sort();
    let mut expected_sorted = expected.to_vec();
    expected_sorted.sort();
    if found != expected_sorted {
        return Err(Error::GroupByMismatch {
            unit: unit.to_string(),
            component: component.clone(),
            expected: expected_sorted,
            found,
        });
    }
    Ok(())
}
