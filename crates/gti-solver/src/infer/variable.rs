//! Inference variables and the parameter-to-variable substitution θ.

use crate::db::TypeDatabase;
use crate::expr::ExprId;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::types::{InferenceVarId, TypeId, TypeParamId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// A placeholder for one type argument of one invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InferenceVariable {
    pub ty: TypeId,
    pub id: InferenceVarId,
    /// The type parameter this variable stands for, if any.
    pub param: Option<TypeParamId>,
    /// The invocation (or method reference) that introduced it.
    pub site: ExprId,
    /// Creation order; resolution sorts by it.
    pub ordinal: u32,
}

/// Allocate a fresh variable for `param` at `site`.
pub fn new_variable(
    db: &dyn TypeDatabase,
    param: Option<TypeParamId>,
    site: ExprId,
) -> InferenceVariable {
    let ty = db.fresh_inference_var(param);
    let id = db.infer_var(ty).unwrap_or(InferenceVarId(u32::MAX));
    InferenceVariable {
        ty,
        id,
        param,
        site,
        ordinal: id.0,
    }
}

/// θ: replaces a method's type parameters with its inference variables.
///
/// Inference variables are left alone, and results are memoized.
#[derive(Debug, Default)]
pub struct VariableMap {
    subst: TypeSubstitution,
    cache: RefCell<FxHashMap<TypeId, TypeId>>,
}

impl Clone for VariableMap {
    fn clone(&self) -> Self {
        VariableMap {
            subst: self.subst.clone(),
            cache: RefCell::new(self.cache.borrow().clone()),
        }
    }
}

impl VariableMap {
    pub fn new(db: &dyn TypeDatabase, params: &[TypeParamId], vars: &[InferenceVariable]) -> Self {
        let mut subst = TypeSubstitution::new();
        for (&param, var) in params.iter().zip(vars.iter()) {
            subst.insert(db.type_param(param), var.ty);
        }
        VariableMap {
            subst,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Identity map, for methods that are not generic.
    pub fn identity() -> Self {
        VariableMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.subst.is_empty()
    }

    pub fn substitution(&self) -> &TypeSubstitution {
        &self.subst
    }

    pub fn substitute(&self, db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
        if self.subst.is_empty() || db.is_inference_var(ty) {
            return ty;
        }
        if let Some(&cached) = self.cache.borrow().get(&ty) {
            return cached;
        }
        let result = instantiate_type(db, ty, &self.subst);
        self.cache.borrow_mut().insert(ty, result);
        result
    }
}
