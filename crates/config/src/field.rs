// SPDX-License-Identifier: Apache-2.0

//! The `INHERIT` sentinel, modeled as a tagged enum variant distinct from the
//! field's own type rather than an in-band special value (spec §9 design
//! note "Sentinel-vs-value semantics").

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A field that is either left to inherit from an outer scope, or pinned to
/// a concrete value at this scope.
///
/// `INHERIT` never escapes the resolver boundary (spec §4.1 invariant):
/// callers only ever observe the concrete `T` returned by
/// [`crate::resolver::ResolutionContext::resolve_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Field<T> {
    /// Defer to the nearest enclosing scope that sets this field.
    Inherit,
    /// A concrete value pinned at this scope.
    Value(T),
}

impl<T> Field<T> {
    /// `true` if this field is the `INHERIT` sentinel.
    #[must_use]
    pub const fn is_inherit(&self) -> bool {
        matches!(self, Field::Inherit)
    }

    /// The concrete value, if set at this scope.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Inherit => None,
            Field::Value(v) => Some(v),
        }
    }

    /// Resets this field back to `INHERIT`. Per spec §4.1, a reset in an
    /// inner scope must re-expose the nearest outer concrete value on the
    /// next resolution; this method only mutates local state, the
    /// re-exposure itself is a property of [`crate::resolver`] re-running.
    pub fn reset(&mut self) {
        *self = Field::Inherit;
    }

    /// Maps the concrete value, leaving `INHERIT` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Inherit => Field::Inherit,
            Field::Value(v) => Field::Value(f(v)),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Inherit
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}
