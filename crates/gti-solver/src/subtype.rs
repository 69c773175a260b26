//! Subtype and compatibility relations over proper types.
//!
//! The checker answers questions about types that contain no inference
//! variables (an inference variable is only a subtype of itself and
//! `Object`). Constraint reduction decomposes formulas that do mention
//! inference variables and calls back into this module for the proper leaves.
//!
//! Relations implemented:
//! - subtyping: identity, `Object` top, `null` bottom, primitive widening,
//!   class hierarchy with type-argument containment, raw types, arrays,
//!   intersections, type-variable and capture bounds
//! - supertype projection (`as_super`)
//! - loose invocation compatibility with boxing, unboxing and unchecked
//!   conversion
//! - erasure

use crate::conversion::{boxed, is_primitive_widening, unboxed};
use crate::db::TypeDatabase;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{ClassId, TypeData, TypeId, Wildcard};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Outcome of a loose-invocation compatibility test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Compatible only through unchecked conversion of a raw type.
    Unchecked,
    Incompatible,
}

pub struct SubtypeChecker<'a> {
    db: &'a dyn TypeDatabase,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        SubtypeChecker {
            db,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    /// Whether the limits were hit during any query on this checker.
    pub fn depth_exceeded(&self) -> bool {
        self.guard.is_exceeded()
    }

    pub fn is_subtype(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        if source.is_error() || target.is_error() {
            return true;
        }
        if self.db.is_missing(source) || self.db.is_missing(target) {
            return true;
        }
        if source.is_primitive() || target.is_primitive() {
            return source.is_primitive()
                && target.is_primitive()
                && is_primitive_widening(source, target);
        }
        if source == TypeId::VOID || target == TypeId::VOID {
            return false;
        }
        if target == TypeId::OBJECT || source == TypeId::NULL {
            return self.db.is_reference(source) && self.db.is_reference(target);
        }

        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {}
            // An assumption on a bound chain that leads back to itself proves
            // nothing; answer conservatively.
            RecursionResult::Cycle
            | RecursionResult::DepthExceeded
            | RecursionResult::IterationExceeded => return false,
        }
        let result = self.is_subtype_structural(source, target);
        self.guard.leave((source, target));
        result
    }

    fn is_subtype_structural(&mut self, source: TypeId, target: TypeId) -> bool {
        let db = self.db;
        if let Some(members) = db.intersection_members(target) {
            return members.iter().all(|&m| self.is_subtype(source, m));
        }
        if let Some(TypeData::Capture(c)) = db.lookup(target)
            && let Some(lower) = db.capture_info(c).and_then(|i| i.lower)
            && self.is_subtype(source, lower)
        {
            return true;
        }

        match db.lookup(source) {
            Some(TypeData::Intersection(list)) => db
                .type_list(list)
                .iter()
                .any(|&m| self.is_subtype(m, target)),
            Some(TypeData::TypeParameter(p)) => db
                .type_param_bounds(p)
                .into_iter()
                .any(|b| self.is_subtype(b, target)),
            Some(TypeData::Capture(c)) => match db.capture_info(c) {
                Some(info) => self.is_subtype(info.upper, target),
                None => false,
            },
            Some(TypeData::Array(source_elem)) => match db.lookup(target) {
                Some(TypeData::Array(target_elem)) => {
                    if source_elem.is_primitive() || target_elem.is_primitive() {
                        source_elem == target_elem
                    } else {
                        self.is_subtype(source_elem, target_elem)
                    }
                }
                _ => false,
            },
            Some(TypeData::Class(_) | TypeData::Raw(_)) => match db.lookup(target) {
                Some(TypeData::Class(target_ref)) => {
                    let Some(sup) = self.as_super(source, target_ref.decl) else {
                        return false;
                    };
                    let target_args = db.type_list(target_ref.args);
                    if target_args.is_empty() {
                        return true;
                    }
                    match db.lookup(sup) {
                        Some(TypeData::Class(sup_ref)) => {
                            let sup_args = db.type_list(sup_ref.args);
                            sup_args.len() == target_args.len()
                                && sup_args
                                    .iter()
                                    .zip(target_args.iter())
                                    .all(|(&s, &t)| self.contains(s, t))
                        }
                        // Raw to parameterized is unchecked conversion, not subtyping.
                        _ => false,
                    }
                }
                Some(TypeData::Raw(decl)) => self.as_super(source, decl).is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Type-argument containment: `argument <= container`.
    pub fn contains(&mut self, argument: TypeId, container: TypeId) -> bool {
        let db = self.db;
        match db.as_wildcard(container) {
            None => argument == container,
            Some(Wildcard::Unbounded) => true,
            Some(Wildcard::Extends(upper)) => match db.as_wildcard(argument) {
                None => self.is_subtype(argument, upper),
                Some(Wildcard::Unbounded) => upper == TypeId::OBJECT,
                Some(Wildcard::Extends(inner)) => self.is_subtype(inner, upper),
                Some(Wildcard::Super(_)) => upper == TypeId::OBJECT,
            },
            Some(Wildcard::Super(lower)) => match db.as_wildcard(argument) {
                None => self.is_subtype(lower, argument),
                Some(Wildcard::Super(inner)) => self.is_subtype(lower, inner),
                _ => false,
            },
        }
    }

    /// The supertype of `ty` whose declaration is `decl`, found breadth-first.
    ///
    /// Returns a `Class` parameterization, or `Raw(decl)` when the path to
    /// `decl` goes through a raw type.
    pub fn as_super(&mut self, ty: TypeId, decl: ClassId) -> Option<TypeId> {
        let db = self.db;
        if decl == ClassId::OBJECT {
            return (db.is_reference(ty) && !db.is_inference_var(ty)).then_some(TypeId::OBJECT);
        }
        let mut queue = VecDeque::from([ty]);
        let mut seen = FxHashSet::default();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            match db.lookup(current) {
                Some(TypeData::Class(r)) if r.decl == decl => return Some(current),
                Some(TypeData::Raw(d)) if d == decl => return Some(current),
                _ => queue.extend(self.direct_supertypes(current)),
            }
        }
        None
    }

    /// Direct supertypes with the class's type arguments substituted in.
    pub fn direct_supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        let db = self.db;
        match db.lookup(ty) {
            Some(TypeData::Class(r)) => {
                let Some(class) = db.class_decl(r.decl) else {
                    return Vec::new();
                };
                if r.decl == ClassId::OBJECT {
                    return Vec::new();
                }
                if class.supertypes.is_empty() {
                    return vec![TypeId::OBJECT];
                }
                let args = db.type_list(r.args);
                if args.is_empty() || args.len() != class.type_params.len() {
                    return class.supertypes.clone();
                }
                let subst = TypeSubstitution::from_params(db, &class.type_params, &args);
                class
                    .supertypes
                    .iter()
                    .map(|&s| instantiate_type(db, s, &subst))
                    .collect()
            }
            Some(TypeData::Raw(decl)) => match db.class_decl(decl) {
                Some(class) if !class.supertypes.is_empty() => {
                    class.supertypes.iter().map(|&s| self.erasure(s)).collect()
                }
                _ => vec![TypeId::OBJECT],
            },
            Some(TypeData::TypeParameter(p)) => db.type_param_bounds(p),
            Some(TypeData::Capture(c)) => {
                let upper = db.capture_info(c).map_or(TypeId::OBJECT, |i| i.upper);
                match db.intersection_members(upper) {
                    Some(members) => members.to_vec(),
                    None => vec![upper],
                }
            }
            Some(TypeData::Intersection(list)) => db.type_list(list).to_vec(),
            Some(TypeData::Array(_)) => vec![TypeId::OBJECT],
            _ => Vec::new(),
        }
    }

    /// Loose invocation compatibility of a value of type `source` with `target`.
    pub fn compatibility(
        &mut self,
        source: TypeId,
        target: TypeId,
        allow_unchecked: bool,
    ) -> Compatibility {
        if self.is_subtype(source, target) {
            return Compatibility::Compatible;
        }
        if source.is_primitive() && !target.is_primitive() {
            return match boxed(source) {
                Some(b) if self.is_subtype(b, target) => Compatibility::Compatible,
                _ => Compatibility::Incompatible,
            };
        }
        if target.is_primitive() {
            return match self.unboxed_of(source) {
                Some(p) if is_primitive_widening(p, target) => Compatibility::Compatible,
                _ => Compatibility::Incompatible,
            };
        }
        if self.is_unchecked_conversion(source, target) {
            return if allow_unchecked {
                Compatibility::Unchecked
            } else {
                Compatibility::Incompatible
            };
        }
        Compatibility::Incompatible
    }

    /// `source` reaches the raw form of `target`'s generic class, while
    /// `target` is a parameterization of it.
    pub fn is_unchecked_conversion(&mut self, source: TypeId, target: TypeId) -> bool {
        let db = self.db;
        match (db.lookup(source), db.lookup(target)) {
            (Some(TypeData::Array(s)), Some(TypeData::Array(t))) => {
                self.is_unchecked_conversion(s, t)
            }
            (_, Some(TypeData::Class(target_ref))) => {
                if db.type_list(target_ref.args).is_empty() {
                    return false;
                }
                matches!(
                    self.as_super(source, target_ref.decl).and_then(|s| db.lookup(s)),
                    Some(TypeData::Raw(_))
                )
            }
            _ => false,
        }
    }

    fn unboxed_of(&mut self, source: TypeId) -> Option<TypeId> {
        if let Some(p) = unboxed(source) {
            return Some(p);
        }
        // Type variables bounded by a box type unbox through the bound.
        match self.db.lookup(source) {
            Some(TypeData::TypeParameter(_) | TypeData::Capture(_)) => self
                .direct_supertypes(source)
                .into_iter()
                .find_map(|b| self.unboxed_of(b)),
            _ => None,
        }
    }

    pub fn erasure(&self, ty: TypeId) -> TypeId {
        erasure_at(self.db, ty, 0)
    }
}

fn erasure_at(db: &dyn TypeDatabase, ty: TypeId, depth: u32) -> TypeId {
    if depth > gti_common::limits::MAX_INSTANTIATION_DEPTH {
        return TypeId::OBJECT;
    }
    match db.lookup(ty) {
        Some(TypeData::Class(r)) => {
            if db.type_list(r.args).is_empty() {
                ty
            } else {
                db.raw(r.decl)
            }
        }
        Some(TypeData::TypeParameter(p)) => {
            let first = db.type_param_bounds(p)[0];
            erasure_at(db, first, depth + 1)
        }
        Some(TypeData::Capture(c)) => {
            let upper = db.capture_info(c).map_or(TypeId::OBJECT, |i| i.upper);
            erasure_at(db, upper, depth + 1)
        }
        Some(TypeData::Intersection(list)) => match db.type_list(list).first() {
            Some(&first) => erasure_at(db, first, depth + 1),
            None => TypeId::OBJECT,
        },
        Some(TypeData::Array(elem)) => db.array(erasure_at(db, elem, depth + 1)),
        Some(TypeData::Wildcard(Wildcard::Extends(upper))) => erasure_at(db, upper, depth + 1),
        Some(TypeData::Wildcard(_)) => TypeId::OBJECT,
        _ => ty,
    }
}

/// One-shot subtype query.
pub fn is_subtype_of(db: &dyn TypeDatabase, source: TypeId, target: TypeId) -> bool {
    SubtypeChecker::new(db).is_subtype(source, target)
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
