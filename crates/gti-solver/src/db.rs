//! Type database abstraction for the solver.
//!
//! The engine only talks to types through this trait, so hosts can plug in
//! their own storage. `TypeInterner` is the in-process implementation.

use crate::types::{
    CaptureId, CaptureInfo, ClassDecl, ClassId, ClassRef, InferenceVarId, MethodId, MethodSig,
    TypeData, TypeId, TypeListId, TypeParamDecl, TypeParamId, Wildcard,
};
use gti_common::{Atom, NameTable};
use std::sync::Arc;

/// Query interface for the solver.
pub trait TypeDatabase {
    fn intern(&self, data: TypeData) -> TypeId;
    fn lookup(&self, id: TypeId) -> Option<TypeData>;
    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId;
    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]>;
    fn names(&self) -> &NameTable;

    fn class_decl(&self, id: ClassId) -> Option<Arc<ClassDecl>>;
    fn type_param_decl(&self, id: TypeParamId) -> Option<Arc<TypeParamDecl>>;
    fn method_sig(&self, id: MethodId) -> Option<Arc<MethodSig>>;

    fn capture_info(&self, id: CaptureId) -> Option<CaptureInfo>;
    /// Allocate a capture variable with `Object` as its upper bound.
    fn fresh_capture(&self, origin: TypeId) -> TypeId;
    fn set_capture_bounds(&self, id: CaptureId, upper: TypeId, lower: Option<TypeId>);

    fn fresh_inference_var(&self, param: Option<TypeParamId>) -> TypeId;
    fn inference_var_param(&self, id: InferenceVarId) -> Option<TypeParamId>;

    // =========================================================================
    // Provided constructors
    // =========================================================================

    fn class_type(&self, decl: ClassId, args: Vec<TypeId>) -> TypeId {
        let generic = self
            .class_decl(decl)
            .map(|d| d.is_generic())
            .unwrap_or(false);
        if args.is_empty() && generic {
            return self.intern(TypeData::Raw(decl));
        }
        let args = self.intern_type_list(args);
        self.intern(TypeData::Class(ClassRef { decl, args }))
    }

    fn raw(&self, decl: ClassId) -> TypeId {
        self.intern(TypeData::Raw(decl))
    }

    fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    fn wildcard(&self, wildcard: Wildcard) -> TypeId {
        self.intern(TypeData::Wildcard(wildcard))
    }

    fn type_param(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParameter(param))
    }

    fn missing(&self, name: &str) -> TypeId {
        let atom = self.names().intern(name);
        self.intern(TypeData::Missing(atom))
    }

    /// Build a normalized intersection: nested intersections are flattened,
    /// duplicates dropped, and `Object` removed when other members remain.
    /// A single member collapses to itself.
    fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::with_capacity(members.len());
        for member in members {
            match self.lookup(member) {
                Some(TypeData::Intersection(list)) => {
                    for &inner in self.type_list(list).iter() {
                        if !flat.contains(&inner) {
                            flat.push(inner);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        if flat.len() > 1 {
            flat.retain(|&t| t != TypeId::OBJECT);
        }
        match flat.len() {
            0 => TypeId::OBJECT,
            1 => flat[0],
            _ => {
                let list = self.intern_type_list(flat);
                self.intern(TypeData::Intersection(list))
            }
        }
    }

    // =========================================================================
    // Provided queries
    // =========================================================================

    fn class_name(&self, decl: ClassId) -> Atom {
        self.class_decl(decl).map(|d| d.name).unwrap_or(Atom::NONE)
    }

    /// Declaration and arguments of a class type. Raw types report no args.
    fn class_parts(&self, ty: TypeId) -> Option<(ClassId, Arc<[TypeId]>)> {
        match self.lookup(ty)? {
            TypeData::Class(r) => Some((r.decl, self.type_list(r.args))),
            TypeData::Raw(decl) => Some((decl, self.type_list(TypeListId::EMPTY))),
            _ => None,
        }
    }

    fn infer_var(&self, ty: TypeId) -> Option<InferenceVarId> {
        match self.lookup(ty)? {
            TypeData::Infer(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    fn is_inference_var(&self, ty: TypeId) -> bool {
        self.infer_var(ty).is_some()
    }

    fn as_wildcard(&self, ty: TypeId) -> Option<Wildcard> {
        match self.lookup(ty)? {
            TypeData::Wildcard(w) => Some(w),
            _ => None,
        }
    }

    fn array_element(&self, ty: TypeId) -> Option<TypeId> {
        match self.lookup(ty)? {
            TypeData::Array(elem) => Some(elem),
            _ => None,
        }
    }

    fn intersection_members(&self, ty: TypeId) -> Option<Arc<[TypeId]>> {
        match self.lookup(ty)? {
            TypeData::Intersection(list) => Some(self.type_list(list)),
            _ => None,
        }
    }

    fn is_missing(&self, ty: TypeId) -> bool {
        matches!(self.lookup(ty), Some(TypeData::Missing(_)))
    }

    /// Reference types: everything that can hold `null`.
    fn is_reference(&self, ty: TypeId) -> bool {
        !ty.is_primitive() && ty != TypeId::VOID && !ty.is_error()
    }

    /// A class type with at least one wildcard argument.
    fn is_wildcard_parameterized(&self, ty: TypeId) -> bool {
        match self.lookup(ty) {
            Some(TypeData::Class(r)) => self
                .type_list(r.args)
                .iter()
                .any(|&a| self.as_wildcard(a).is_some()),
            _ => false,
        }
    }

    /// Upper bounds of a declared type parameter; `Object` when undeclared.
    fn type_param_bounds(&self, param: TypeParamId) -> Vec<TypeId> {
        match self.type_param_decl(param) {
            Some(decl) if !decl.bounds.is_empty() => decl.bounds.clone(),
            _ => vec![TypeId::OBJECT],
        }
    }
}

#[cfg(test)]
#[path = "../tests/db_tests.rs"]
mod tests;
