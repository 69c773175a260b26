//! Least upper bound and greatest lower bound.
//!
//! `lub` follows the erased-candidate construction: collect the erased
//! supertypes every input shares, keep the minimal ones, and for each generic
//! candidate compute the least containing parameterization of the relevant
//! supertypes. Recursion through type arguments is cut off at
//! `MAX_LUB_DEPTH` or when a lub of the same input set is already in
//! progress; the cut produces an unbounded wildcard.

use crate::conversion::boxed;
use crate::db::TypeDatabase;
use crate::subtype::SubtypeChecker;
use crate::types::{ClassId, ClassKind, TypeData, TypeId, Wildcard};
use gti_common::limits::MAX_LUB_DEPTH;
use indexmap::IndexSet;
use std::collections::VecDeque;
use tracing::trace;

pub struct LubComputer<'a> {
    db: &'a dyn TypeDatabase,
    checker: SubtypeChecker<'a>,
    in_progress: Vec<Vec<TypeId>>,
}

impl<'a> LubComputer<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        LubComputer {
            db,
            checker: SubtypeChecker::new(db),
            in_progress: Vec::new(),
        }
    }

    pub fn lub(&mut self, types: &[TypeId]) -> TypeId {
        let mut inputs: Vec<TypeId> = Vec::with_capacity(types.len());
        for &t in types {
            if t == TypeId::NULL {
                continue;
            }
            let t = boxed(t).unwrap_or(t);
            if !inputs.contains(&t) {
                inputs.push(t);
            }
        }
        match inputs.len() {
            0 => return TypeId::NULL,
            1 => return inputs[0],
            _ => {}
        }
        for &candidate in &inputs {
            if inputs
                .iter()
                .all(|&other| self.checker.is_subtype(other, candidate))
            {
                return candidate;
            }
        }

        let elements: Vec<TypeId> = inputs
            .iter()
            .filter_map(|&t| self.db.array_element(t))
            .collect();
        if !elements.is_empty() {
            if elements.len() == inputs.len() && elements.iter().all(|e| !e.is_primitive()) {
                let elem = self.lub(&elements);
                return self.db.array(elem);
            }
            return TypeId::OBJECT;
        }

        let mut key = inputs.clone();
        key.sort();
        self.in_progress.push(key);
        let result = self.lub_of_classes(&inputs);
        self.in_progress.pop();
        trace!(inputs = ?inputs, result = result.0, "lub");
        result
    }

    fn lub_of_classes(&mut self, inputs: &[TypeId]) -> TypeId {
        let sets: Vec<IndexSet<ClassId>> = inputs
            .iter()
            .map(|&t| self.erased_supertypes(t))
            .collect();
        let shared: Vec<ClassId> = sets[0]
            .iter()
            .copied()
            .filter(|c| sets[1..].iter().all(|s| s.contains(c)))
            .collect();
        let minimal: Vec<ClassId> = shared
            .iter()
            .copied()
            .filter(|&v| {
                !shared
                    .iter()
                    .any(|&w| w != v && self.erased_class_supertypes(w).contains(&v))
            })
            .collect();

        let mut candidates = Vec::with_capacity(minimal.len());
        for decl in minimal {
            let generic = self
                .db
                .class_decl(decl)
                .map(|d| d.is_generic())
                .unwrap_or(false);
            if !generic {
                candidates.push(self.db.class_type(decl, Vec::new()));
                continue;
            }
            candidates.push(self.least_containing_parameterization(decl, inputs));
        }
        glb(self.db, &candidates).unwrap_or(TypeId::OBJECT)
    }

    fn least_containing_parameterization(&mut self, decl: ClassId, inputs: &[TypeId]) -> TypeId {
        let mut relevant = Vec::with_capacity(inputs.len());
        for &t in inputs {
            match self.checker.as_super(t, decl) {
                Some(sup) if matches!(self.db.lookup(sup), Some(TypeData::Class(_))) => {
                    if !relevant.contains(&sup) {
                        relevant.push(sup);
                    }
                }
                _ => return self.db.raw(decl),
            }
        }
        let mut acc = relevant[0];
        for &next in &relevant[1..] {
            acc = self.lcp(decl, acc, next);
        }
        acc
    }

    fn lcp(&mut self, decl: ClassId, left: TypeId, right: TypeId) -> TypeId {
        let (Some((_, left_args)), Some((_, right_args))) =
            (self.db.class_parts(left), self.db.class_parts(right))
        else {
            return self.db.raw(decl);
        };
        if left_args.len() != right_args.len() {
            return self.db.raw(decl);
        }
        let args = left_args
            .iter()
            .zip(right_args.iter())
            .map(|(&l, &r)| self.lcta(l, r))
            .collect();
        self.db.class_type(decl, args)
    }

    /// Least containing type argument.
    fn lcta(&mut self, left: TypeId, right: TypeId) -> TypeId {
        let db = self.db;
        if left == right {
            return left;
        }
        let unbounded = db.wildcard(Wildcard::Unbounded);
        match (db.as_wildcard(left), db.as_wildcard(right)) {
            (None, None) => self.extends_lub(&[left, right]),
            (None, Some(Wildcard::Extends(b))) | (Some(Wildcard::Extends(b)), None) => {
                let other = if db.as_wildcard(left).is_some() {
                    right
                } else {
                    left
                };
                self.extends_lub(&[other, b])
            }
            (Some(Wildcard::Extends(a)), Some(Wildcard::Extends(b))) => self.extends_lub(&[a, b]),
            (None, Some(Wildcard::Super(b))) | (Some(Wildcard::Super(b)), None) => {
                let other = if db.as_wildcard(left).is_some() {
                    right
                } else {
                    left
                };
                match glb(db, &[other, b]) {
                    Some(g) => db.wildcard(Wildcard::Super(g)),
                    None => unbounded,
                }
            }
            (Some(Wildcard::Super(a)), Some(Wildcard::Super(b))) => match glb(db, &[a, b]) {
                Some(g) => db.wildcard(Wildcard::Super(g)),
                None => unbounded,
            },
            (Some(Wildcard::Extends(a)), Some(Wildcard::Super(b)))
            | (Some(Wildcard::Super(b)), Some(Wildcard::Extends(a))) => {
                if a == b {
                    a
                } else {
                    unbounded
                }
            }
            _ => unbounded,
        }
    }

    fn extends_lub(&mut self, types: &[TypeId]) -> TypeId {
        let unbounded = self.db.wildcard(Wildcard::Unbounded);
        let mut key = types.to_vec();
        key.sort();
        key.dedup();
        if self.in_progress.len() as u32 >= MAX_LUB_DEPTH || self.in_progress.contains(&key) {
            return unbounded;
        }
        let inner = self.lub(types);
        if inner == TypeId::OBJECT {
            unbounded
        } else {
            self.db.wildcard(Wildcard::Extends(inner))
        }
    }

    /// Erased supertypes of `ty` in breadth-first order, `Object` last.
    fn erased_supertypes(&mut self, ty: TypeId) -> IndexSet<ClassId> {
        let mut out = IndexSet::new();
        let mut queue = VecDeque::from([ty]);
        let mut seen = IndexSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some((decl, _)) = self.db.class_parts(current) {
                out.insert(decl);
            }
            queue.extend(self.checker.direct_supertypes(current));
        }
        out.shift_remove(&ClassId::OBJECT);
        out.insert(ClassId::OBJECT);
        out
    }

    fn erased_class_supertypes(&mut self, decl: ClassId) -> IndexSet<ClassId> {
        let ty = self.db.class_type(decl, Vec::new());
        self.erased_supertypes(ty)
    }
}

pub fn lub(db: &dyn TypeDatabase, types: &[TypeId]) -> TypeId {
    LubComputer::new(db).lub(types)
}

/// Greatest lower bound as a normalized intersection.
///
/// Members that are supertypes of other members are dropped. Returns `None`
/// when two unrelated classes (or a class and an array) would have to meet.
pub fn glb(db: &dyn TypeDatabase, types: &[TypeId]) -> Option<TypeId> {
    let mut flat: Vec<TypeId> = Vec::with_capacity(types.len());
    for &t in types {
        match db.intersection_members(t) {
            Some(members) => {
                for &m in members.iter() {
                    if !flat.contains(&m) {
                        flat.push(m);
                    }
                }
            }
            None => {
                if !flat.contains(&t) {
                    flat.push(t);
                }
            }
        }
    }
    let mut checker = SubtypeChecker::new(db);
    let kept: Vec<TypeId> = flat
        .iter()
        .enumerate()
        .filter(|&(i, &t)| {
            !flat.iter().enumerate().any(|(j, &other)| {
                j != i && checker.is_subtype(other, t) && (j < i || !checker.is_subtype(t, other))
            })
        })
        .map(|(_, &t)| t)
        .collect();
    if kept.is_empty() {
        return Some(TypeId::OBJECT);
    }

    let is_class_like = |t: TypeId| match db.lookup(t) {
        Some(TypeData::Array(_)) => true,
        Some(TypeData::Class(r)) => db
            .class_decl(r.decl)
            .is_some_and(|d| d.kind == ClassKind::Class),
        Some(TypeData::Raw(decl)) => db
            .class_decl(decl)
            .is_some_and(|d| d.kind == ClassKind::Class),
        _ => false,
    };
    let (mut classes, others): (Vec<TypeId>, Vec<TypeId>) =
        kept.into_iter().partition(|&t| is_class_like(t));
    if classes.len() > 1 {
        return None;
    }
    classes.extend(others);
    Some(db.intersection(classes))
}

#[cfg(test)]
#[path = "../tests/lub_tests.rs"]
mod tests;
