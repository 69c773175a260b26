//! Generic type instantiation and substitution.
//!
//! A substitution maps type parameters or inference variables (both as
//! `TypeId`s) to replacement types. Instantiation walks a type structurally
//! (class arguments, array components, wildcard bounds, intersection members)
//! and rebuilds only the parts that change.
//!
//! Capture variables are nominal and never looked through.

use crate::db::TypeDatabase;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::types::{ClassRef, TypeData, TypeId, TypeParamId, Wildcard};
use rustc_hash::FxHashMap;

/// A mapping from type parameters / inference variables to types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        TypeSubstitution {
            map: FxHashMap::default(),
        }
    }

    /// Map each declared parameter to the argument at the same position.
    /// Extra parameters or arguments are ignored.
    pub fn from_params(db: &dyn TypeDatabase, params: &[TypeParamId], args: &[TypeId]) -> Self {
        let mut subst = TypeSubstitution::new();
        for (&param, &arg) in params.iter().zip(args.iter()) {
            subst.insert(db.type_param(param), arg);
        }
        subst
    }

    pub fn insert(&mut self, key: TypeId, replacement: TypeId) {
        self.map.insert(key, replacement);
    }

    pub fn get(&self, key: TypeId) -> Option<TypeId> {
        self.map.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, TypeId)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

/// Instantiator with a per-walk memo table.
pub struct TypeInstantiator<'a> {
    db: &'a dyn TypeDatabase,
    subst: &'a TypeSubstitution,
    cache: FxHashMap<TypeId, TypeId>,
    guard: RecursionGuard<TypeId>,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(db: &'a dyn TypeDatabase, subst: &'a TypeSubstitution) -> Self {
        TypeInstantiator {
            db,
            subst,
            cache: FxHashMap::default(),
            guard: RecursionGuard::with_profile(RecursionProfile::Instantiation),
        }
    }

    pub fn instantiate(&mut self, ty: TypeId) -> TypeId {
        if self.subst.is_empty() {
            return ty;
        }
        if let Some(replacement) = self.subst.get(ty) {
            return replacement;
        }
        if let Some(&cached) = self.cache.get(&ty) {
            return cached;
        }
        if !self.guard.enter(ty).is_entered() {
            return ty;
        }
        let result = self.instantiate_structure(ty);
        self.guard.leave(ty);
        self.cache.insert(ty, result);
        result
    }

    fn instantiate_structure(&mut self, ty: TypeId) -> TypeId {
        let db = self.db;
        match db.lookup(ty) {
            Some(TypeData::Class(r)) => {
                let args = db.type_list(r.args);
                if args.is_empty() {
                    return ty;
                }
                let new_args: Vec<TypeId> = args.iter().map(|&a| self.instantiate(a)).collect();
                if new_args[..] == args[..] {
                    return ty;
                }
                let args = db.intern_type_list(new_args);
                db.intern(TypeData::Class(ClassRef { decl: r.decl, args }))
            }
            Some(TypeData::Array(elem)) => {
                let new_elem = self.instantiate(elem);
                if new_elem == elem {
                    ty
                } else {
                    db.array(new_elem)
                }
            }
            Some(TypeData::Wildcard(w)) => match w {
                Wildcard::Unbounded => ty,
                Wildcard::Extends(b) => {
                    let nb = self.instantiate(b);
                    if nb == b {
                        ty
                    } else {
                        db.wildcard(Wildcard::Extends(nb))
                    }
                }
                Wildcard::Super(b) => {
                    let nb = self.instantiate(b);
                    if nb == b {
                        ty
                    } else {
                        db.wildcard(Wildcard::Super(nb))
                    }
                }
            },
            Some(TypeData::Intersection(list)) => {
                let members = db.type_list(list);
                let new_members: Vec<TypeId> =
                    members.iter().map(|&m| self.instantiate(m)).collect();
                if new_members[..] == members[..] {
                    ty
                } else {
                    db.intersection(new_members)
                }
            }
            _ => ty,
        }
    }
}

/// Apply `subst` to `ty`.
pub fn instantiate_type(db: &dyn TypeDatabase, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    TypeInstantiator::new(db, subst).instantiate(ty)
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
