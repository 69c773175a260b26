//! The bound set: everything known about a session's inference variables.
//!
//! Type bounds are kept twice. The insertion-ordered log drives
//! incorporation (entries before `incorporated` have already been paired
//! with each other), and per-variable views answer "what are the upper /
//! lower / equal bounds of α" without scanning. A bound between two
//! variables shows up in both variables' views.

use super::bound::{Bound, CaptureBound, Relation, TypeBound};
use crate::db::TypeDatabase;
use crate::instantiate::TypeSubstitution;
use crate::types::TypeId;
use crate::visitor::{is_proper, mentions};
use indexmap::{IndexMap, IndexSet};

/// Bounds of one inference variable, seen from that variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarBounds {
    pub same: IndexSet<TypeId>,
    pub upper: IndexSet<TypeId>,
    pub lower: IndexSet<TypeId>,
    /// The first proper type this variable was equated with.
    pub instantiation: Option<TypeId>,
}

#[derive(Clone, Debug, Default)]
pub struct BoundSet {
    /// Type bounds in insertion order; the value is the soft flag.
    log: IndexMap<TypeBound, bool>,
    vars: IndexMap<TypeId, VarBounds>,
    throws: IndexSet<TypeId>,
    captures: Vec<CaptureBound>,
    incorporated: usize,
    captures_expanded: usize,
}

impl BoundSet {
    pub fn new() -> Self {
        BoundSet::default()
    }

    /// Make `var` known to the set even when nothing bounds it yet.
    pub fn register(&mut self, var: TypeId) {
        self.vars.entry(var).or_default();
    }

    pub fn variables(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.vars.keys().copied()
    }

    pub fn contains_var(&self, var: TypeId) -> bool {
        self.vars.contains_key(&var)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty() && self.throws.is_empty() && self.captures.is_empty()
    }

    /// Add a type bound. Returns whether it was new. Re-adding a soft bound
    /// as a hard one clears its soft flag.
    pub fn add_bound(&mut self, db: &dyn TypeDatabase, bound: TypeBound, soft: bool) -> bool {
        if let Some(existing) = self.log.get_mut(&bound) {
            if !soft {
                *existing = false;
            }
            return false;
        }
        if bound.relation == Relation::Same && bound.var == bound.other {
            return false;
        }
        self.log.insert(bound, soft);
        for (var, relation, other) in bound.views(db) {
            let entry = self.vars.entry(var).or_default();
            match relation {
                Relation::Same => {
                    entry.same.insert(other);
                    if entry.instantiation.is_none() && is_proper(db, other) {
                        entry.instantiation = Some(other);
                    }
                }
                Relation::Subtype => {
                    entry.upper.insert(other);
                }
                Relation::Supertype => {
                    entry.lower.insert(other);
                }
            }
        }
        true
    }

    pub fn add_throws(&mut self, var: TypeId) -> bool {
        self.register(var);
        self.throws.insert(var)
    }

    pub fn add_capture(&mut self, capture: CaptureBound) -> bool {
        if self.captures.contains(&capture) {
            return false;
        }
        for &v in &capture.vars {
            self.register(v);
        }
        self.captures.push(capture);
        true
    }

    pub fn add(&mut self, db: &dyn TypeDatabase, bound: Bound, soft: bool) -> bool {
        match bound {
            Bound::Type(b) => self.add_bound(db, b, soft),
            Bound::Throws(v) => self.add_throws(v),
            Bound::Capture(c) => self.add_capture(c),
        }
    }

    /// Merge every bound of `other` into this set. Returns whether anything
    /// was new.
    pub fn merge(&mut self, db: &dyn TypeDatabase, other: &BoundSet) -> bool {
        let mut changed = false;
        for var in other.variables() {
            if !self.contains_var(var) {
                self.register(var);
                changed = true;
            }
        }
        for (&bound, &soft) in &other.log {
            changed |= self.add_bound(db, bound, soft);
        }
        for &var in &other.throws {
            changed |= self.add_throws(var);
        }
        for capture in &other.captures {
            changed |= self.add_capture(capture.clone());
        }
        changed
    }

    // =========================================================================
    // Incorporation bookkeeping
    // =========================================================================

    pub fn bound_at(&self, index: usize) -> Option<(TypeBound, bool)> {
        self.log.get_index(index).map(|(&b, &soft)| (b, soft))
    }

    pub fn incorporated(&self) -> usize {
        self.incorporated
    }

    pub fn mark_incorporated(&mut self, upto: usize) {
        self.incorporated = upto.min(self.log.len());
    }

    pub fn has_unincorporated(&self) -> bool {
        self.incorporated < self.log.len() || self.captures_expanded < self.captures.len()
    }

    /// Capture bounds not yet expanded into their implied bounds.
    pub fn take_unexpanded_captures(&mut self) -> Vec<CaptureBound> {
        let fresh = self.captures[self.captures_expanded..].to_vec();
        self.captures_expanded = self.captures.len();
        fresh
    }

    pub fn is_soft(&self, bound: &TypeBound) -> bool {
        self.log.get(bound).copied().unwrap_or(false)
    }

    pub fn bounds(&self) -> impl Iterator<Item = (TypeBound, bool)> + '_ {
        self.log.iter().map(|(&b, &soft)| (b, soft))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn bounds_of(&self, var: TypeId) -> Option<&VarBounds> {
        self.vars.get(&var)
    }

    pub fn is_instantiated(&self, var: TypeId) -> bool {
        self.instantiation(var).is_some()
    }

    pub fn instantiation(&self, var: TypeId) -> Option<TypeId> {
        self.vars.get(&var).and_then(|b| b.instantiation)
    }

    /// Substitution replacing every instantiated variable by its value.
    pub fn instantiations(&self) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for (&var, b) in &self.vars {
            if let Some(t) = b.instantiation {
                subst.insert(var, t);
            }
        }
        subst
    }

    pub fn lower_bounds(&self, db: &dyn TypeDatabase, var: TypeId, only_proper: bool) -> Vec<TypeId> {
        self.vars.get(&var).map_or_else(Vec::new, |b| {
            b.lower
                .iter()
                .copied()
                .filter(|&t| !only_proper || is_proper(db, t))
                .collect()
        })
    }

    pub fn upper_bounds(&self, db: &dyn TypeDatabase, var: TypeId, only_proper: bool) -> Vec<TypeId> {
        self.vars.get(&var).map_or_else(Vec::new, |b| {
            b.upper
                .iter()
                .copied()
                .filter(|&t| !only_proper || is_proper(db, t))
                .collect()
        })
    }

    pub fn is_throws(&self, var: TypeId) -> bool {
        self.throws.contains(&var)
    }

    pub fn throws(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.throws.iter().copied()
    }

    pub fn captures(&self) -> &[CaptureBound] {
        &self.captures
    }

    pub fn capture_for(&self, var: TypeId) -> Option<&CaptureBound> {
        self.captures.iter().find(|c| c.vars.contains(&var))
    }

    pub fn is_captured(&self, var: TypeId) -> bool {
        self.capture_for(var).is_some()
    }

    /// Drop capture bounds whose variables are all in `resolved`.
    pub fn remove_captures_of(&mut self, resolved: &IndexSet<TypeId>) {
        let before = self.captures.len();
        self.captures
            .retain(|c| !c.vars.iter().any(|v| resolved.contains(v)));
        if self.captures.len() != before {
            self.captures_expanded = self.captures_expanded.min(self.captures.len());
        }
    }

    /// Whether resolving `a` requires `b` to be resolved as well (directly).
    ///
    /// A variable on the left of a capture bound depends on every variable
    /// mentioned by that bound and nothing else. Any other variable depends
    /// on the variables its own bounds mention, and on every captured
    /// variable whose bounds mention it.
    pub fn depends_on_resolution_of(&self, db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if let Some(capture) = self.capture_for(a) {
            return capture.vars.contains(&b) || mentions(db, capture.captured, b);
        }
        if self.is_captured(b)
            && self
                .vars
                .get(&b)
                .is_some_and(|view| view_mentions(db, view, a))
        {
            return true;
        }
        self.vars
            .get(&a)
            .is_some_and(|view| view_mentions(db, view, b))
    }

    pub fn num_uninstantiated(&self, vars: &[TypeId]) -> usize {
        vars.iter().filter(|&&v| !self.is_instantiated(v)).count()
    }
}

fn view_mentions(db: &dyn TypeDatabase, view: &VarBounds, var: TypeId) -> bool {
    view.same
        .iter()
        .chain(view.upper.iter())
        .chain(view.lower.iter())
        .any(|&t| mentions(db, t, var))
}

#[cfg(test)]
#[path = "../../tests/bound_set_tests.rs"]
mod tests;
