// SPDX-License-Identifier: Apache-2.0

//! Filename parsers: component regex -> component map, with `{iii}`
//! placeholder support for variable components (spec §4.3).

use openhcs_core::component::{Component, ComponentMap, ComponentValue};
use regex::Regex;

/// Parses microscope filenames into component maps, and can re-template a
/// component map back into a filename pattern with variable components
/// replaced by `{iii}` placeholders.
pub trait FilenameParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parses one filename into its component map, or `None` if it doesn't
    /// match this parser's convention (dropped per spec §4.3 step 2).
    fn parse(&self, filename: &str) -> Option<ComponentMap>;

    /// Renders `components` back into a filename, substituting `{iii}` for
    /// every component in `variable_components` (spec §4.3 step 4).
    fn template(&self, components: &ComponentMap, variable_components: &[Component]) -> String;
}

/// A filename parser driven by a named-capture-group regex for parsing,
/// paired with a format string (`{component_name}` placeholders) for
/// templating back to a filename. Most vendor formats (ImageXpress, Opera
/// Phenix, …) reduce to exactly this: a fixed token order with well/site/
/// channel/z/t pieces.
pub struct RegexFilenameParser {
    name: &'static str,
    regex: Regex,
    format: &'static str,
    /// Components whose captured text should be parsed as an integer
    /// index rather than kept as an opaque categorical string.
    numeric_components: Vec<Component>,
}

impl RegexFilenameParser {
    #[must_use]
    pub fn new(
        name: &'static str,
        pattern: &str,
        format: &'static str,
        numeric_components: Vec<Component>,
    ) -> Self {
        let regex = Regex::new(pattern).expect("filename parser pattern must be a valid regex");
        Self { name, regex, format, numeric_components }
    }
}

impl FilenameParser for RegexFilenameParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(&self, filename: &str) -> Option<ComponentMap> {
        let caps = self.regex.captures(filename)?;
        let mut map = ComponentMap::new();
        for name in self.regex.capture_names().flatten() {
            let value = caps.name(name)?.as_str();
            let component_value = if self.numeric_components.iter().any(|c| c == name) {
                value
                    .parse::<i64>()
                    .map(ComponentValue::Index)
                    .unwrap_or_else(|_| ComponentValue::Name(value.to_string()))
            } else {
                ComponentValue::Name(value.to_string())
            };
            let _ = map.insert(name.to_string(), component_value);
        }
        Some(map)
    }

    fn template(&self, components: &ComponentMap, variable_components: &[Component]) -> String {
        let mut result = self.format.to_string();
        for (component, value) in components {
            let placeholder = format!("{{{component}}}");
            let replacement = if variable_components.contains(component) {
                "{iii}".to_string()
            } else {
                value.to_string()
            };
            result = result.replace(&placeholder, &replacement);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imagexpress_parser() -> RegexFilenameParser {
        RegexFilenameParser::new(
            "imagexpress",
            r"^(?P<well>[A-Z]\d{2})_s(?P<site>\d+)_w(?P<channel>\d+)\.tif$",
            "{well}_s{site}_w{channel}.tif",
            vec!["site".into(), "channel".into()],
        )
    }

    #[test]
    fn parses_well_site_channel_from_filename() {
        let parser = imagexpress_parser();
        let map = parser.parse("A01_s3_w2.tif").unwrap();
        assert_eq!(map.get("well"), Some(&ComponentValue::Name("A01".into())));
        assert_eq!(map.get("site"), Some(&ComponentValue::Index(3)));
        assert_eq!(map.get("channel"), Some(&ComponentValue::Index(2)));
    }

    #[test]
    fn unparseable_filename_returns_none() {
        let parser = imagexpress_parser();
        assert!(parser.parse("not_a_match.png").is_none());
    }

    #[test]
    fn templates_variable_components_as_placeholders() {
        let parser = imagexpress_parser();
        let map = parser.parse("A01_s3_w2.tif").unwrap();
        let pattern = parser.template(&map, &["site".into()]);
        assert_eq!(pattern, "A01_s{iii}_w2.tif");
    }
}
