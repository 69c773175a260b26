//! Functional interface queries.
//!
//! A functional interface is a class declaration with a `FunctionalMethod`.
//! Its function type for a given parameterization is the single abstract
//! method with the class type parameters replaced by the arguments. When the
//! parameterization has wildcards, the non-wildcard parameterization is used
//! instead.

use crate::db::TypeDatabase;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::lub::glb;
use crate::subtype::SubtypeChecker;
use crate::types::{ClassId, TypeData, TypeId, Wildcard};
use crate::visitor::contains_type_parameters;

/// The function type of a functional interface parameterization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub thrown: Vec<TypeId>,
}

impl FunctionType {
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.return_type == TypeId::VOID
    }
}

/// The functional interface declaration `ty` refers to, if any.
pub fn functional_class(db: &dyn TypeDatabase, ty: TypeId) -> Option<ClassId> {
    match db.lookup(ty)? {
        TypeData::Class(r) => db
            .class_decl(r.decl)
            .and_then(|d| d.functional.as_ref().map(|_| r.decl)),
        TypeData::Raw(decl) => db
            .class_decl(decl)
            .and_then(|d| d.functional.as_ref().map(|_| decl)),
        TypeData::Intersection(list) => db
            .type_list(list)
            .iter()
            .find_map(|&m| functional_class(db, m)),
        _ => None,
    }
}

pub fn is_functional_interface(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    functional_class(db, ty).is_some()
}

/// Function type of `ty`, or `None` when `ty` is not a functional interface.
pub fn functional_signature(db: &dyn TypeDatabase, ty: TypeId) -> Option<FunctionType> {
    if let Some(members) = db.intersection_members(ty) {
        return members
            .iter()
            .find_map(|&m| functional_signature(db, m));
    }
    let decl_id = functional_class(db, ty)?;
    let decl = db.class_decl(decl_id)?;
    let method = decl.functional.as_ref()?;

    match db.lookup(ty)? {
        TypeData::Raw(_) => {
            let checker = SubtypeChecker::new(db);
            Some(FunctionType {
                params: method.params.iter().map(|&p| checker.erasure(p)).collect(),
                return_type: checker.erasure(method.return_type),
                thrown: method.thrown.iter().map(|&t| checker.erasure(t)).collect(),
            })
        }
        TypeData::Class(_) => {
            let ground = non_wildcard_parameterization(db, ty).unwrap_or(ty);
            let (_, args) = db.class_parts(ground)?;
            let subst = TypeSubstitution::from_params(db, &decl.type_params, &args);
            Some(FunctionType {
                params: method
                    .params
                    .iter()
                    .map(|&p| instantiate_type(db, p, &subst))
                    .collect(),
                return_type: instantiate_type(db, method.return_type, &subst),
                thrown: method
                    .thrown
                    .iter()
                    .map(|&t| instantiate_type(db, t, &subst))
                    .collect(),
            })
        }
        _ => None,
    }
}

/// Replace each wildcard argument with a concrete type: `?` takes the
/// parameter's bound, `? extends U` takes `glb(U, bound)`, `? super L` takes
/// `L`. Bounds that mention type parameters are replaced by the wildcard's
/// own bound (or `Object`).
///
/// Returns `None` when `ty` has no wildcards or a glb does not exist.
pub fn non_wildcard_parameterization(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    let (decl_id, args) = db.class_parts(ty)?;
    if !args.iter().any(|&a| db.as_wildcard(a).is_some()) {
        return None;
    }
    let decl = db.class_decl(decl_id)?;
    let mut ground = Vec::with_capacity(args.len());
    for (i, &arg) in args.iter().enumerate() {
        let declared = decl
            .type_params
            .get(i)
            .map(|&p| db.intersection(db.type_param_bounds(p)))
            .unwrap_or(TypeId::OBJECT);
        let usable_bound = !contains_type_parameters(db, declared);
        let replacement = match db.as_wildcard(arg) {
            None => arg,
            Some(Wildcard::Unbounded) => {
                if usable_bound {
                    declared
                } else {
                    TypeId::OBJECT
                }
            }
            Some(Wildcard::Extends(upper)) => {
                if !usable_bound || declared == TypeId::OBJECT {
                    upper
                } else {
                    glb(db, &[upper, declared])?
                }
            }
            Some(Wildcard::Super(lower)) => lower,
        };
        ground.push(replacement);
    }
    Some(db.class_type(decl_id, ground))
}

#[cfg(test)]
#[path = "../tests/functional_tests.rs"]
mod tests;
