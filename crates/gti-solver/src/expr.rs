//! Argument-expression model.
//!
//! The engine never sees source text. Hosts describe call-site arguments as
//! a small tree of `ExprKind` nodes in an `ExprArena`; every node records its
//! parent so structural containment can be answered without a walk from the
//! root.

use crate::db::TypeDatabase;
use crate::types::{MethodId, TypeData, TypeId};
use crate::visitor::contains_type_parameters;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Overload candidates, in declaration order.
    pub candidates: Vec<MethodId>,
    pub args: Vec<ExprId>,
    /// Explicit type arguments; empty when elided.
    pub explicit_type_args: Vec<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LambdaParams {
    /// `(a, b) -> ...` with `n` untyped parameters.
    Implicit(usize),
    Explicit(Vec<TypeId>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LambdaBody {
    Expression(ExprId),
    Block {
        /// Expressions of the body's `return e;` statements.
        results: Vec<ExprId>,
        can_complete_normally: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lambda {
    pub params: LambdaParams,
    pub body: LambdaBody,
    /// Checked exceptions the body can throw.
    pub thrown: Vec<TypeId>,
}

impl Lambda {
    pub fn arity(&self) -> usize {
        match &self.params {
            LambdaParams::Implicit(n) => *n,
            LambdaParams::Explicit(types) => types.len(),
        }
    }

    pub fn is_explicitly_typed(&self) -> bool {
        matches!(self.params, LambdaParams::Explicit(_))
    }

    pub fn result_exprs(&self) -> Vec<ExprId> {
        match &self.body {
            LambdaBody::Expression(e) => vec![*e],
            LambdaBody::Block { results, .. } => results.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodRef {
    pub candidates: Vec<MethodId>,
    /// `Type::method` form whose first function-type parameter is the
    /// receiver. `None` for bound receivers and static references.
    pub unbound_receiver: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    /// A standalone expression whose type is already known.
    Typed(TypeId),
    Null,
    Paren(ExprId),
    Conditional {
        then_branch: ExprId,
        else_branch: ExprId,
    },
    Switch {
        arms: Vec<ExprId>,
    },
    Invocation(Invocation),
    Lambda(Lambda),
    MethodRef(MethodRef),
    /// A use of parameter `index` of `lambda` inside that lambda's body.
    ParamRef {
        lambda: ExprId,
        index: usize,
    },
}

#[derive(Clone, Debug)]
struct ExprNode {
    kind: ExprKind,
    parent: Option<ExprId>,
}

#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        let children = children_of(&kind);
        self.nodes.push(ExprNode { kind, parent: None });
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = Some(id);
            }
        }
        id
    }

    pub fn typed(&mut self, ty: TypeId) -> ExprId {
        self.push(ExprKind::Typed(ty))
    }

    pub fn null(&mut self) -> ExprId {
        self.push(ExprKind::Null)
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.push(ExprKind::Paren(inner))
    }

    pub fn conditional(&mut self, then_branch: ExprId, else_branch: ExprId) -> ExprId {
        self.push(ExprKind::Conditional {
            then_branch,
            else_branch,
        })
    }

    pub fn switch(&mut self, arms: Vec<ExprId>) -> ExprId {
        self.push(ExprKind::Switch { arms })
    }

    pub fn invocation(
        &mut self,
        candidates: Vec<MethodId>,
        args: Vec<ExprId>,
        explicit_type_args: Vec<TypeId>,
    ) -> ExprId {
        self.push(ExprKind::Invocation(Invocation {
            candidates,
            args,
            explicit_type_args,
        }))
    }

    /// Reserve a lambda node so its body can refer to its parameters.
    /// Complete it with [`finish_lambda`](Self::finish_lambda).
    pub fn begin_lambda(&mut self) -> ExprId {
        self.push(ExprKind::Lambda(Lambda {
            params: LambdaParams::Implicit(0),
            body: LambdaBody::Block {
                results: Vec::new(),
                can_complete_normally: true,
            },
            thrown: Vec::new(),
        }))
    }

    pub fn finish_lambda(&mut self, id: ExprId, lambda: Lambda) {
        let kind = ExprKind::Lambda(lambda);
        for child in children_of(&kind) {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = Some(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.kind = kind;
        }
    }

    pub fn lambda(&mut self, lambda: Lambda) -> ExprId {
        let id = self.begin_lambda();
        self.finish_lambda(id, lambda);
        id
    }

    pub fn method_ref(
        &mut self,
        candidates: Vec<MethodId>,
        unbound_receiver: Option<TypeId>,
    ) -> ExprId {
        self.push(ExprKind::MethodRef(MethodRef {
            candidates,
            unbound_receiver,
        }))
    }

    pub fn param_ref(&mut self, lambda: ExprId, index: usize) -> ExprId {
        self.push(ExprKind::ParamRef { lambda, index })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn kind(&self, id: ExprId) -> Option<&ExprKind> {
        self.nodes.get(id.0 as usize).map(|n| &n.kind)
    }

    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.nodes.get(id.0 as usize).and_then(|n| n.parent)
    }

    pub fn invocation_of(&self, id: ExprId) -> Option<&Invocation> {
        match self.kind(id)? {
            ExprKind::Invocation(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn lambda_of(&self, id: ExprId) -> Option<&Lambda> {
        match self.kind(id)? {
            ExprKind::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        self.kind(id).map(children_of).unwrap_or_default()
    }

    /// Whether `outer` is `inner` or one of its ancestors.
    pub fn contains(&self, outer: ExprId, inner: ExprId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Number of nodes in the subtree rooted at `id`, including `id`.
    pub fn subtree_size(&self, id: ExprId) -> usize {
        let mut stack = vec![id];
        let mut count = 0;
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(self.children(current));
        }
        count
    }

    /// A generic method invocation whose type depends on its target: type
    /// arguments are elided and some candidate's return type mentions its
    /// own type parameters.
    pub fn is_poly_invocation(&self, db: &dyn TypeDatabase, id: ExprId) -> bool {
        let Some(inv) = self.invocation_of(id) else {
            return false;
        };
        if !inv.explicit_type_args.is_empty() {
            return false;
        }
        inv.candidates.iter().any(|&m| {
            db.method_sig(m).is_some_and(|sig| {
                sig.is_generic() && contains_type_parameters(db, sig.return_type)
            })
        })
    }

    /// An exact method reference names exactly one method, which is neither
    /// generic nor variable-arity.
    pub fn is_exact_method_ref(&self, db: &dyn TypeDatabase, id: ExprId) -> bool {
        match self.kind(id) {
            Some(ExprKind::MethodRef(mref)) => {
                mref.candidates.len() == 1
                    && db
                        .method_sig(mref.candidates[0])
                        .is_some_and(|sig| !sig.is_generic() && !sig.varargs)
                    && !mref
                        .unbound_receiver
                        .is_some_and(|r| matches!(db.lookup(r), Some(TypeData::Raw(_))))
            }
            _ => false,
        }
    }

    /// Pertinence to applicability for argument `id` against formal `param`
    /// of a method whose own type parameters are `method_params`.
    ///
    /// Not pertinent: implicitly typed lambdas, inexact method references,
    /// explicitly typed lambdas and exact method references whose target is
    /// one of the method's type parameters, explicitly typed lambdas with a
    /// non-pertinent result expression. Parentheses, conditionals and
    /// switches are pertinent when all their branches are.
    pub fn is_pertinent_to_applicability(
        &self,
        db: &dyn TypeDatabase,
        id: ExprId,
        param: TypeId,
        method_params: &[TypeId],
    ) -> bool {
        let target_is_method_param = method_params.contains(&param);
        match self.kind(id) {
            Some(ExprKind::Lambda(lambda)) => {
                if !lambda.is_explicitly_typed() || target_is_method_param {
                    return false;
                }
                let ret = crate::functional::functional_signature(db, param)
                    .map(|f| f.return_type)
                    .unwrap_or(TypeId::OBJECT);
                lambda
                    .result_exprs()
                    .into_iter()
                    .all(|e| self.is_pertinent_to_applicability(db, e, ret, method_params))
            }
            Some(ExprKind::MethodRef(_)) => {
                self.is_exact_method_ref(db, id) && !target_is_method_param
            }
            Some(ExprKind::Paren(inner)) => {
                self.is_pertinent_to_applicability(db, *inner, param, method_params)
            }
            Some(ExprKind::Conditional {
                then_branch,
                else_branch,
            }) => {
                self.is_pertinent_to_applicability(db, *then_branch, param, method_params)
                    && self.is_pertinent_to_applicability(db, *else_branch, param, method_params)
            }
            Some(ExprKind::Switch { arms }) => arms
                .iter()
                .all(|&a| self.is_pertinent_to_applicability(db, a, param, method_params)),
            _ => true,
        }
    }
}

fn children_of(kind: &ExprKind) -> Vec<ExprId> {
    match kind {
        ExprKind::Typed(_) | ExprKind::Null | ExprKind::MethodRef(_) => Vec::new(),
        ExprKind::ParamRef { .. } => Vec::new(),
        ExprKind::Paren(inner) => vec![*inner],
        ExprKind::Conditional {
            then_branch,
            else_branch,
        } => vec![*then_branch, *else_branch],
        ExprKind::Switch { arms } => arms.clone(),
        ExprKind::Invocation(inv) => inv.args.clone(),
        ExprKind::Lambda(lambda) => lambda.result_exprs(),
    }
}

#[cfg(test)]
#[path = "../tests/expr_tests.rs"]
mod tests;
