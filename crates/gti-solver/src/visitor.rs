//! Structural type walks.
//!
//! `for_each_child` yields the immediate component types of a type; the
//! collectors below are built on it. Capture bounds are not children:
//! captures are opaque to every walk.

use crate::db::TypeDatabase;
use crate::types::{TypeData, TypeId, Wildcard};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;

/// Call `f` on each immediate component of `ty`.
pub fn for_each_child(db: &dyn TypeDatabase, ty: TypeId, mut f: impl FnMut(TypeId)) {
    match db.lookup(ty) {
        Some(TypeData::Class(r)) => {
            for &arg in db.type_list(r.args).iter() {
                f(arg);
            }
        }
        Some(TypeData::Array(elem)) => f(elem),
        Some(TypeData::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b))) => f(b),
        Some(TypeData::Intersection(list)) => {
            for &m in db.type_list(list).iter() {
                f(m);
            }
        }
        _ => {}
    }
}

/// Whether any type reachable from `ty` satisfies `pred`.
pub fn contains_type_matching(
    db: &dyn TypeDatabase,
    ty: TypeId,
    pred: &mut dyn FnMut(TypeId, &TypeData) -> bool,
) -> bool {
    let mut stack = vec![ty];
    let mut seen = FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(data) = db.lookup(current) else {
            continue;
        };
        if pred(current, &data) {
            return true;
        }
        for_each_child(db, current, |child| stack.push(child));
    }
    false
}

/// Collect inference variables mentioned by `ty`, in first-occurrence order.
pub fn collect_inference_vars(db: &dyn TypeDatabase, ty: TypeId, out: &mut IndexSet<TypeId>) {
    let mut stack = vec![ty];
    let mut seen = FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if db.is_inference_var(current) {
            out.insert(current);
            continue;
        }
        let mut children = Vec::new();
        for_each_child(db, current, |child| children.push(child));
        // Reverse so the leftmost child is visited first.
        stack.extend(children.into_iter().rev());
    }
}

pub fn inference_vars_of(db: &dyn TypeDatabase, ty: TypeId) -> IndexSet<TypeId> {
    let mut out = IndexSet::new();
    collect_inference_vars(db, ty, &mut out);
    out
}

/// A proper type mentions no inference variables.
pub fn is_proper(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    !contains_type_matching(db, ty, &mut |_, data| matches!(data, TypeData::Infer(_)))
}

/// Whether `ty` mentions `var` anywhere.
pub fn mentions(db: &dyn TypeDatabase, ty: TypeId, var: TypeId) -> bool {
    contains_type_matching(db, ty, &mut |t, _| t == var)
}

pub fn contains_type_parameters(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    contains_type_matching(db, ty, &mut |_, data| {
        matches!(data, TypeData::TypeParameter(_))
    })
}

pub fn contains_wildcards(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    contains_type_matching(db, ty, &mut |_, data| matches!(data, TypeData::Wildcard(_)))
}

#[cfg(test)]
#[path = "../tests/visitor_tests.rs"]
mod tests;
