//! Reduction of expression compatibility and exception constraints.
//!
//! `‹e → T›` is decomposed by the shape of `e`: standalone expressions turn
//! into type formulas, conditionals and switches into one formula per
//! branch, lambdas and method references into formulas over the function
//! type of `T`, and poly invocations into a nested session whose bounds end
//! up in the enclosing one.

use super::bound::{Relation, TypeBound};
use super::constraint::{Constraint, ConstraintRelation};
use super::engine::InferenceEngine;
use super::session::SessionId;
use super::variable::{VariableMap, new_variable};
use crate::error::InferenceError;
use crate::expr::{ExprId, ExprKind, Lambda, LambdaBody, LambdaParams, MethodRef};
use crate::functional::{FunctionType, functional_signature};
use crate::subtype::{Compatibility, SubtypeChecker};
use crate::types::{MethodId, MethodSig, TypeData, TypeId};
use crate::visitor::is_proper;
use std::sync::Arc;
use tracing::trace;

impl<'a> InferenceEngine<'a> {
    pub(crate) fn reduce_expression(
        &mut self,
        id: SessionId,
        expr: ExprId,
        target: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        let exprs = self.exprs;
        if target.is_error() || db.is_missing(target) {
            return Ok(());
        }
        let Some(kind) = exprs.kind(expr) else {
            return Err(InferenceError::IncompleteInformation {
                missing: format!("expression {}", expr.0),
            });
        };
        trace!(session = %id, expr = expr.0, target = target.0, "reduce expression");
        match kind {
            ExprKind::Typed(ty) => self.push_compatible(id, *ty, target, soft),
            ExprKind::Null => {
                if target.is_primitive() {
                    Err(InferenceError::NoSolution {
                        left: TypeId::NULL,
                        relation: ConstraintRelation::Compatible,
                        right: target,
                    })
                } else {
                    Ok(())
                }
            }
            ExprKind::Paren(inner) => self.push_constraint(
                id,
                Constraint::Expression {
                    expr: *inner,
                    target,
                    soft,
                },
            ),
            ExprKind::Conditional {
                then_branch,
                else_branch,
            } => {
                for branch in [*then_branch, *else_branch] {
                    self.push_constraint(
                        id,
                        Constraint::Expression {
                            expr: branch,
                            target,
                            soft,
                        },
                    )?;
                }
                Ok(())
            }
            ExprKind::Switch { arms } => {
                for &arm in arms {
                    self.push_constraint(
                        id,
                        Constraint::Expression {
                            expr: arm,
                            target,
                            soft,
                        },
                    )?;
                }
                Ok(())
            }
            ExprKind::ParamRef { lambda, index } => {
                let ty = self.lambda_param_type(id, *lambda, *index)?;
                self.push_compatible(id, ty, target, soft)
            }
            ExprKind::Invocation(_) => {
                if exprs.is_poly_invocation(db, expr) {
                    self.reduce_poly_invocation(id, expr, target, soft)
                } else {
                    let result = self.resolve_nested_invocation(expr, Some(id))?;
                    self.push_compatible(id, result.return_type, target, soft)
                }
            }
            ExprKind::Lambda(lambda) => self.reduce_lambda(id, expr, lambda, target, soft),
            ExprKind::MethodRef(mref) => {
                if exprs.is_exact_method_ref(db, expr) {
                    self.reduce_exact_method_ref(id, mref, target, soft)
                } else {
                    self.reduce_inexact_method_ref(id, expr, mref, target, soft)
                }
            }
        }
    }

    fn push_compatible(
        &mut self,
        id: SessionId,
        left: TypeId,
        right: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        self.push_constraint(
            id,
            Constraint::Type {
                left,
                relation: ConstraintRelation::Compatible,
                right,
                soft,
            },
        )
    }

    fn function_type(&self, target: TypeId) -> Result<FunctionType, InferenceError> {
        functional_signature(self.db, target).ok_or(InferenceError::NotFunctionalInterface { ty: target })
    }

    fn reduce_lambda(
        &mut self,
        id: SessionId,
        expr: ExprId,
        lambda: &Lambda,
        target: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let f = self.function_type(target)?;
        if f.arity() != lambda.arity() {
            return Err(InferenceError::ArityMismatch {
                expected: f.arity(),
                actual: lambda.arity(),
            });
        }
        check_body_shape(self.exprs, lambda, &f)?;

        let params = match &lambda.params {
            LambdaParams::Explicit(declared) => {
                for (&p, &fp) in declared.iter().zip(f.params.iter()) {
                    self.push_constraint(
                        id,
                        Constraint::Type {
                            left: p,
                            relation: ConstraintRelation::Same,
                            right: fp,
                            soft,
                        },
                    )?;
                }
                declared.clone()
            }
            LambdaParams::Implicit(_) => f.params.clone(),
        };
        self.session_mut(id)?.lambda_params.insert(expr, params);

        if f.is_void() {
            return Ok(());
        }
        for result in lambda.result_exprs() {
            self.push_constraint(
                id,
                Constraint::Expression {
                    expr: result,
                    target: f.return_type,
                    soft,
                },
            )?;
        }
        Ok(())
    }

    fn reduce_exact_method_ref(
        &mut self,
        id: SessionId,
        mref: &MethodRef,
        target: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let f = self.function_type(target)?;
        let method = mref
            .candidates
            .first()
            .copied()
            .ok_or(InferenceError::NotFunctionalInterface { ty: target })?;
        let sig = self.method_sig(method)?;
        self.push_method_ref_formulas(id, mref, &f, &sig, &VariableMap::identity(), soft)
    }

    fn reduce_inexact_method_ref(
        &mut self,
        id: SessionId,
        expr: ExprId,
        mref: &MethodRef,
        target: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        let f = self.function_type(target)?;
        let Some((method, sig)) = self.select_method_ref_target(mref, &f) else {
            return Err(InferenceError::NoApplicableCandidate { site: expr });
        };
        trace!(session = %id, expr = expr.0, method = method.0, "method reference target");

        // A generic target gets fresh variables, owned by this session.
        let theta = if sig.is_generic() {
            let fresh: Vec<_> = sig
                .type_params
                .iter()
                .map(|&p| new_variable(db, Some(p), expr))
                .collect();
            let theta = VariableMap::new(db, &sig.type_params, &fresh);
            let session = self.session_mut(id)?;
            for (var, &param) in fresh.iter().zip(sig.type_params.iter()) {
                session.bounds.register(var.ty);
                for declared in db.type_param_bounds(param) {
                    if let Some(b) = TypeBound::new(db, var.ty, Relation::Subtype, theta.substitute(db, declared)) {
                        session.bounds.add_bound(db, b, false);
                    }
                }
            }
            session.variables.extend(fresh);
            theta
        } else {
            VariableMap::identity()
        };
        self.push_method_ref_formulas(id, mref, &f, &sig, &theta, soft)
    }

    /// Parameter and return formulas between function type `f` and the
    /// referenced method `sig` under `theta`.
    fn push_method_ref_formulas(
        &mut self,
        id: SessionId,
        mref: &MethodRef,
        f: &FunctionType,
        sig: &MethodSig,
        theta: &VariableMap,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        let k = sig.params.len();
        let shift = match mref.unbound_receiver {
            Some(receiver) if f.arity() == k + 1 => {
                self.push_constraint(
                    id,
                    Constraint::Type {
                        left: f.params[0],
                        relation: ConstraintRelation::Subtype,
                        right: receiver,
                        soft,
                    },
                )?;
                1
            }
            _ => 0,
        };
        let n = f.arity() - shift;
        let variable_arity = n != k;
        if variable_arity && !(sig.varargs && k > 0 && n + 1 >= k) {
            return Err(InferenceError::ArityMismatch {
                expected: f.arity(),
                actual: k,
            });
        }
        for i in 0..n {
            let Some(formal) = sig.param_for_arg(db, i, variable_arity) else {
                return Err(InferenceError::ArityMismatch {
                    expected: f.arity(),
                    actual: k,
                });
            };
            self.push_compatible(id, f.params[i + shift], theta.substitute(db, formal), soft)?;
        }
        if f.is_void() {
            return Ok(());
        }
        if sig.return_type == TypeId::VOID {
            return Err(InferenceError::NoSolution {
                left: TypeId::VOID,
                relation: ConstraintRelation::Compatible,
                right: f.return_type,
            });
        }
        self.push_compatible(id, theta.substitute(db, sig.return_type), f.return_type, soft)
    }

    /// The candidate an inexact method reference resolves to for function
    /// type `f`: the first whose arity fits and whose parameters accept the
    /// proper function-type parameters.
    fn select_method_ref_target(&self, mref: &MethodRef, f: &FunctionType) -> Option<(MethodId, Arc<MethodSig>)> {
        let db = self.db;
        let mut checker = SubtypeChecker::new(db);
        let allow_unchecked = self.options.allow_unchecked_conversion;
        mref.candidates.iter().find_map(|&m| {
            let sig = db.method_sig(m)?;
            let k = sig.params.len();
            let shift = if f.arity() == k {
                0
            } else if mref.unbound_receiver.is_some() && f.arity() == k + 1 {
                1
            } else if sig.varargs && k > 0 && f.arity() + 1 >= k {
                0
            } else {
                return None;
            };
            let fits = f.params[shift..].iter().enumerate().all(|(i, &actual)| {
                let Some(formal) = sig.param_for_arg(db, i, f.arity() - shift != k) else {
                    return false;
                };
                if !is_proper(db, actual) {
                    return true;
                }
                // Formals over the method's own type parameters are compared
                // by erasure.
                let formal = checker.erasure(formal);
                checker.compatibility(actual, formal, allow_unchecked) != Compatibility::Incompatible
            });
            fits.then_some((m, sig))
        })
    }

    fn method_sig(&self, method: MethodId) -> Result<Arc<MethodSig>, InferenceError> {
        self.db
            .method_sig(method)
            .ok_or_else(|| InferenceError::IncompleteInformation {
                missing: format!("method {}", method.0),
            })
    }

    /// Type of parameter `index` of `lambda`: its declared type, or the
    /// function-type parameter recorded when the lambda was reduced in this
    /// session, an enclosing one, or any live session.
    pub(crate) fn lambda_param_type(
        &self,
        id: SessionId,
        lambda: ExprId,
        index: usize,
    ) -> Result<TypeId, InferenceError> {
        if let Some(Lambda {
            params: LambdaParams::Explicit(declared),
            ..
        }) = self.exprs.lambda_of(lambda)
            && let Some(&ty) = declared.get(index)
        {
            return Ok(ty);
        }
        let mut current = Some(id);
        while let Some(sid) = current {
            let session = self.session(sid)?;
            if let Some(params) = session.lambda_params.get(&lambda) {
                return params
                    .get(index)
                    .copied()
                    .ok_or(InferenceError::ArityMismatch {
                        expected: params.len(),
                        actual: index + 1,
                    });
            }
            current = session.outer;
        }
        self.sessions
            .iter()
            .flatten()
            .find_map(|s| s.lambda_params.get(&lambda).and_then(|p| p.get(index).copied()))
            .ok_or_else(|| InferenceError::IncompleteInformation {
                missing: format!("parameter {index} of lambda {}", lambda.0),
            })
    }

    /// `‹e →throws T›`: checked exceptions a lambda body or referenced method
    /// can throw, against the throws clause of `T`'s function type.
    pub(crate) fn reduce_exception(&mut self, id: SessionId, expr: ExprId, target: TypeId) -> Result<(), InferenceError> {
        let db = self.db;
        let exprs = self.exprs;
        let Some(kind) = exprs.kind(expr) else {
            return Ok(());
        };
        let thrown: Vec<TypeId> = match kind {
            ExprKind::Paren(inner) => {
                return self.push_constraint(
                    id,
                    Constraint::Exception {
                        expr: *inner,
                        target,
                        soft: false,
                    },
                );
            }
            ExprKind::Conditional {
                then_branch,
                else_branch,
            } => {
                for branch in [*then_branch, *else_branch] {
                    self.push_constraint(
                        id,
                        Constraint::Exception {
                            expr: branch,
                            target,
                            soft: false,
                        },
                    )?;
                }
                return Ok(());
            }
            ExprKind::Switch { arms } => {
                for &arm in arms {
                    self.push_constraint(
                        id,
                        Constraint::Exception {
                            expr: arm,
                            target,
                            soft: false,
                        },
                    )?;
                }
                return Ok(());
            }
            ExprKind::Lambda(lambda) => {
                let Some(f) = functional_signature(db, target) else {
                    return Ok(());
                };
                if !lambda.is_explicitly_typed() && f.params.iter().any(|&p| !is_proper(db, p)) {
                    return Ok(());
                }
                lambda.thrown.clone()
            }
            ExprKind::MethodRef(mref) if exprs.is_exact_method_ref(db, expr) => {
                let Some(sig) = mref.candidates.first().and_then(|&m| db.method_sig(m)) else {
                    return Ok(());
                };
                let mut checker = SubtypeChecker::new(db);
                sig.thrown
                    .iter()
                    .copied()
                    .filter(|&t| {
                        !checker.is_subtype(t, TypeId::RUNTIME_EXCEPTION)
                            && !checker.is_subtype(t, TypeId::ERROR_CLASS)
                    })
                    .collect()
            }
            _ => return Ok(()),
        };
        let Some(f) = functional_signature(db, target) else {
            return Ok(());
        };

        let (proper, open): (Vec<TypeId>, Vec<TypeId>) = f.thrown.iter().partition(|&&t| is_proper(db, t));
        let mut checker = SubtypeChecker::new(db);
        let uncovered: Vec<TypeId> = thrown
            .into_iter()
            .filter(|&x| !proper.iter().any(|&e| checker.is_subtype(x, e)))
            .collect();
        if open.is_empty() {
            if let Some(&x) = uncovered.first() {
                return Err(InferenceError::NoSolution {
                    left: x,
                    relation: ConstraintRelation::Subtype,
                    right: proper.first().copied().unwrap_or(TypeId::RUNTIME_EXCEPTION),
                });
            }
            return Ok(());
        }
        for &x in &uncovered {
            for &e in &open {
                self.push_constraint(
                    id,
                    Constraint::Type {
                        left: x,
                        relation: ConstraintRelation::Subtype,
                        right: e,
                        soft: false,
                    },
                )?;
            }
        }
        let session = self.session_mut(id)?;
        for &e in &open {
            if db.is_inference_var(e) {
                session.bounds.add_throws(e);
            }
        }
        Ok(())
    }
}

/// Void / value compatibility of a lambda body with function type `f`.
fn check_body_shape(exprs: &crate::expr::ExprArena, lambda: &Lambda, f: &FunctionType) -> Result<(), InferenceError> {
    let fits = match (&lambda.body, f.is_void()) {
        (LambdaBody::Expression(body), true) => matches!(
            exprs.kind(*body),
            Some(ExprKind::Typed(_) | ExprKind::Invocation(_))
        ),
        (LambdaBody::Expression(_), false) => true,
        (LambdaBody::Block { results, .. }, true) => results.is_empty(),
        (
            LambdaBody::Block {
                results,
                can_complete_normally,
            },
            false,
        ) => !results.is_empty() && !*can_complete_normally,
    };
    if fits {
        return Ok(());
    }
    let (left, right) = if f.is_void() {
        (TypeId::OBJECT, TypeId::VOID)
    } else {
        (TypeId::VOID, f.return_type)
    };
    Err(InferenceError::NoSolution {
        left,
        relation: ConstraintRelation::Compatible,
        right,
    })
}

/// Whether `ty` is a class type over a functional interface.
pub(crate) fn is_functional_class_type(db: &dyn crate::db::TypeDatabase, ty: TypeId) -> bool {
    matches!(db.lookup(ty), Some(TypeData::Class(_) | TypeData::Raw(_)))
        && crate::functional::is_functional_interface(db, ty)
}

#[cfg(test)]
#[path = "../../tests/expression_tests.rs"]
mod tests;
