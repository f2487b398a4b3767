// SPDX-License-Identifier: Apache-2.0

//! The MRO × scope-stack resolution engine (spec §4.1).
//!
//! Each resolvable config group (components, path planning, VFS, ...) has
//! its own "lazy" record type `L` carrying [`crate::field::Field`]s. A
//! [`ResolutionContext`] is generic over one such `L` and holds the stack of
//! scopes currently in effect, innermost last.

use crate::error::Error;
use crate::field::Field;

/// The three levels a resolvable config group can be declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Pipeline,
    Step,
}

/// A stack of scopes, each carrying one lazy record of type `L`, plus the
/// method-resolution order used to walk a field's owning class hierarchy.
///
/// `push`/`pop` mirror entering and leaving a pipeline or step during
/// compilation; `resolve_field` is called once per field, per unit of
/// compilation, against whatever scopes are currently pushed.
#[derive(Debug, Clone)]
pub struct ResolutionContext<L> {
    stack: Vec<(ScopeKind, L)>,
}

impl<L> Default for ResolutionContext<L> {
    fn default() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<L> ResolutionContext<L> {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new innermost scope. Errors if `kind` is already present in
    /// the stack (spec §4.1: a scope kind may not recurse into itself).
    pub fn push(&mut self, kind: ScopeKind, record: L) -> Result<(), Error> {
        if self.stack.iter().any(|(k, _)| *k == kind) {
            return Err(Error::CycleInContext { scope: format!("{kind:?}") });
        }
        self.stack.push((kind, record));
        Ok(())
    }

    /// Pops the innermost scope.
    pub fn pop(&mut self) -> Option<(ScopeKind, L)> {
        self.stack.pop()
    }

    /// Resolves one field by walking `mro` outer-to-inner, and within each
    /// scope kind present in `mro`, walking the live stack innermost-first
    /// looking for a concrete (non-`INHERIT`) value.
    ///
    /// `mro` lists the scope kinds that may define this field, in the order
    /// a subclass's own scope should be preferred over its parents' (spec
    /// §4.1 pseudocode: outer loop over the linearization, inner loop over
    /// the scope stack reversed). The *first* concrete value found, scanning
    /// `mro` in order and the stack innermost-first within each entry, wins.
    pub fn resolve_field<T: Clone>(
        &self,
        field_name: &'static str,
        mro: &[ScopeKind],
        accessor: impl Fn(&L) -> Field<T>,
    ) -> Result<T, Error> {
        for kind in mro {
            for (stack_kind, record) in self.stack.iter().rev() {
                if stack_kind != kind {
                    continue;
                }
                if let Field::Value(v) = accessor(record) {
                    return Ok(v);
                }
            }
        }
        Err(Error::UnresolvedField { field: field_name.to_string() })
    }
}
