// SPDX-License-Identifier: Apache-2.0

//! Components config (spec §3): fixed at the global scope, never lazy.
//! `all_components`, `parallelization_axis`, the user-variable set and the
//! (optional) `group_by` are declared once and shared by every pipeline.

use crate::error::Error;
use openhcs_core::component::Component;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComponentsConfig {
    pub all_components: Vec<Component>,
    pub parallelization_axis: Component,
    pub variable_components: Vec<Component>,
    #[serde(default)]
    pub group_by: Option<Component>,
}

impl ComponentsConfig {
    /// Validates the invariants spec §3 places on this record: the
    /// parallelization axis and group_by are declared components, and
    /// `group_by` is never in the variable set.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.all_components.contains(&self.parallelization_axis) {
            return Err(Error::InvalidConstraint {
                message: format!(
                    "parallelization_axis `{}` is not in all_components",
                    self.parallelization_axis
                ),
            });
        }
        for v in &self.variable_components {
            if !self.all_components.contains(v) {
                return Err(Error::InvalidConstraint {
                    message: format!("variable component `{v}` is not in all_components"),
                });
            }
        }
        if let Some(g) = &self.group_by {
            if !self.all_components.contains(g) {
                return Err(Error::InvalidConstraint {
                    message: format!("group_by `{g}` is not in all_components"),
                });
            }
            if g == &self.parallelization_axis {
                return Err(Error::InvalidConstraint {
                    message: "group_by must not equal parallelization_axis".into(),
                });
            }
            if self.variable_components.contains(g) {
                return Err(Error::InvalidConstraint {
                    message: format!("group_by `{g}` must not be in variable_components"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ComponentsConfig {
        ComponentsConfig {
            all_components: vec!["well".into(), "site".into(), "channel".into()],
            parallelization_axis: "well".into(),
            variable_components: vec!["site".into()],
            group_by: Some("channel".into()),
        }
    }

    #[test]
    fn accepts_well_formed_config() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_group_by_in_variable_set() {
        let mut cfg = base();
        cfg.group_by = Some("site".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_group_by_equal_to_axis() {
        let mut cfg = base();
        cfg.group_by = Some("well".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_component_reference() {
        let mut cfg = base();
        cfg.variable_components.push("timepoint".into());
        assert!(cfg.validate().is_err());
    }
}
